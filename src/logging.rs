use crate::config::Config;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};

/// Log file kept next to the training log.
pub const LOG_FILE: &str = "workout_logger.log";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"%\((\w+)\)s").unwrap());

/// Fields substituted into the `log_format` template.
pub struct LineParts<'a> {
    pub asctime: &'a str,
    pub level: log::Level,
    pub target: &'a str,
    pub module: Option<&'a str>,
    pub line: Option<u32>,
    pub message: &'a str,
}

fn level_name(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARNING",
        log::Level::Info => "INFO",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}

/// Render one log line from a `%(name)s` style template.
///
/// Unknown placeholders are left as written.
pub fn render_line(template: &str, parts: &LineParts<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "asctime" => parts.asctime.to_string(),
            "levelname" => level_name(parts.level).to_string(),
            "message" => parts.message.to_string(),
            "name" => parts.target.to_string(),
            "module" => parts.module.unwrap_or("").to_string(),
            "lineno" => parts.line.map(|l| l.to_string()).unwrap_or_default(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

/// Writes everything to stderr and, when available, to the log file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(f) = self.file.as_mut() {
            // a full disk should not silence stderr
            let _ = f.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(f) = self.file.as_mut() {
            let _ = f.flush();
        }
        Ok(())
    }
}

/// Install the global logger using the configured level and line format.
///
/// `RUST_LOG` still overrides the configured level.
pub fn init(config: &Config) {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .map_err(|e| eprintln!("Could not open {LOG_FILE}: {e}"))
        .ok();
    let template = config.log_format.clone();

    let result = env_logger::Builder::new()
        .filter_level(config.log_level.filter())
        .parse_default_env()
        .format(move |buf, record| {
            let asctime = Local::now().format("%Y-%m-%d %H:%M:%S,%3f").to_string();
            let message = record.args().to_string();
            let parts = LineParts {
                asctime: &asctime,
                level: record.level(),
                target: record.target(),
                module: record.module_path(),
                line: record.line(),
                message: &message,
            };
            writeln!(buf, "{}", render_line(&template, &parts))
        })
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .try_init();
    if let Err(e) = result {
        eprintln!("Logger already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(message: &'a str) -> LineParts<'a> {
        LineParts {
            asctime: "2024-01-01 10:00:00,000",
            level: log::Level::Warn,
            target: "workout_logger::store",
            module: Some("workout_logger::store"),
            line: Some(42),
            message,
        }
    }

    #[test]
    fn renders_default_template() {
        let line = render_line(
            "%(asctime)s - %(levelname)s - %(message)s",
            &parts("disk full"),
        );
        assert_eq!(line, "2024-01-01 10:00:00,000 - WARNING - disk full");
    }

    #[test]
    fn renders_location_placeholders() {
        let line = render_line("[%(name)s:%(lineno)s] %(message)s", &parts("hi"));
        assert_eq!(line, "[workout_logger::store:42] hi");
    }

    #[test]
    fn leaves_unknown_placeholders() {
        let line = render_line("%(process)d %(thread)s %(message)s", &parts("x"));
        assert_eq!(line, "%(process)d %(thread)s x");
    }

    #[test]
    fn message_is_not_re_expanded() {
        let line = render_line("%(message)s", &parts("%(levelname)s"));
        assert_eq!(line, "%(levelname)s");
    }
}
