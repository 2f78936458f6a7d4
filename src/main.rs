//! Workout logger: a form for recording sets to a local CSV log, optionally
//! forwarding each one to a webhook.

use eframe::NativeOptions;

mod app;
mod config;
mod fields;
mod form;
mod history;
mod logging;
mod notify;
mod record;
mod session;
mod store;

use app::WorkoutApp;
use config::Config;

fn main() -> eframe::Result<()> {
    let config_path = config::resolve_config_path();
    let (config, issues) = Config::load_from(&config_path);
    logging::init(&config);
    for e in issues {
        log::warn!("{}: {e}", config_path.display());
    }
    log::info!("Starting Workout Logger application");
    log::debug!("Training log at {}", config.local_file.display());

    let app = WorkoutApp::new(&config);
    let options = NativeOptions::default();
    eframe::run_native(
        "Workout Logger",
        options,
        Box::new(|_cc| Box::new(app)),
    )
}
