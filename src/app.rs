use crate::config::Config;
use crate::fields::{FieldKind, FormDraft, FormField, FormSchema};
use crate::form::{FormSession, FormState, FormView, Forwarding, Mode, suggest_existing};
use crate::history::format_set;
use crate::notify::WebhookSink;
use crate::session::SessionPhase;
use crate::store::LogStore;
use chrono::Local;
use eframe::{App, Frame, egui};
use std::time::{Duration, Instant};

const TOAST_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastKind {
    Success,
    Warning,
    Error,
}

struct Toast {
    kind: ToastKind,
    text: String,
    start: Instant,
}

/// Whether a name picker is showing the free-text "new" entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pickers {
    new_workout: bool,
    new_exercise: bool,
}

impl Default for Pickers {
    fn default() -> Self {
        Self {
            new_workout: true,
            new_exercise: true,
        }
    }
}

pub struct WorkoutApp {
    form: FormSession<WebhookSink>,
    state: FormState,
    pickers: Pickers,
    toast: Option<Toast>,
}

impl WorkoutApp {
    pub fn new(config: &Config) -> Self {
        let schema = FormSchema::from_names(&config.required_fields, &config.optional_fields);
        let form = FormSession::new(
            LogStore::new(&config.local_file),
            schema,
            WebhookSink::new(&config.webhook_url),
        );
        Self {
            form,
            state: FormState::default(),
            pickers: Pickers::default(),
            toast: None,
        }
    }

    fn show_toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        self.toast = Some(Toast {
            kind,
            text: text.into(),
            start: Instant::now(),
        });
    }

    fn start_workout(&mut self) {
        match self.form.start_workout(&self.state) {
            Ok(state) => {
                self.state = state;
                self.pickers = Pickers::default();
            }
            Err(e) => self.show_toast(ToastKind::Error, e.to_string()),
        }
    }

    fn save_set(&mut self) {
        match self.form.save(&self.state, Local::now().naive_local()) {
            Ok((state, outcome)) => {
                self.state = state;
                let kind = match outcome.forwarding {
                    Forwarding::Failed(_) => ToastKind::Warning,
                    _ => ToastKind::Success,
                };
                self.show_toast(kind, outcome.message());
            }
            Err(e) => {
                log::warn!("Set not saved: {e}");
                self.show_toast(ToastKind::Error, e.to_string());
            }
        }
    }

    fn new_exercise(&mut self) {
        match self.form.new_exercise(&self.state) {
            Ok(state) => {
                self.state = state;
                self.pickers.new_exercise = true;
            }
            Err(e) => self.show_toast(ToastKind::Error, e.to_string()),
        }
    }

    fn end_workout(&mut self) {
        match self.form.end_workout(&self.state) {
            Ok(state) => {
                self.state = state;
                self.pickers = Pickers::default();
            }
            Err(e) => self.show_toast(ToastKind::Error, e.to_string()),
        }
    }

    fn mode_buttons(&mut self, ui: &mut egui::Ui) {
        ui.columns(2, |cols| {
            if cols[0].button("Web Mode").clicked() {
                self.state = self.form.select_mode(&self.state, Mode::Remote);
            }
            if cols[1].button("Local Mode").clicked() {
                self.state = self.form.select_mode(&self.state, Mode::Local);
            }
        });
    }

    fn workout_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Log Exercise");
        let (state, view) = self.form.render(&self.state);
        self.state = state;

        for field in &view.fields {
            draw_field(ui, field, &view, &mut self.state.draft, &mut self.pickers);
        }

        ui.separator();
        if let Some(workout) = self.state.context.active_workout() {
            ui.label(format!("Current Workout: {workout}"));
            if let Some(exercise) = self.state.context.active_exercise() {
                ui.label(format!(
                    "Current Exercise: {exercise} - Set {}",
                    view.set_number
                ));
            }
        }

        if ui.button("Save Set").clicked() {
            self.save_set();
        }
        ui.columns(2, |cols| {
            if cols[0].button("New Exercise").clicked() {
                self.new_exercise();
            }
            if cols[1].button("End Workout").clicked() {
                self.end_workout();
            }
        });
    }

    fn draw_toast(&mut self, ctx: &egui::Context) {
        let Some(toast) = &self.toast else {
            return;
        };
        if toast.start.elapsed() >= Duration::from_secs(TOAST_SECS) {
            self.toast = None;
            return;
        }
        let color = match toast.kind {
            ToastKind::Success => egui::Color32::from_rgb(60, 160, 80),
            ToastKind::Warning => egui::Color32::from_rgb(220, 160, 40),
            ToastKind::Error => egui::Color32::from_rgb(200, 60, 60),
        };
        egui::Area::new(egui::Id::new("save_toast"))
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .show(ctx, |ui| {
                ui.colored_label(color, toast.text.as_str());
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }

    /// Draw one frame.
    fn ui(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("💪 Workout Logger");
            let Some(mode) = self.state.mode else {
                self.mode_buttons(ui);
                return;
            };

            ui.horizontal(|ui| {
                ui.label(format!("Current Mode: {}", mode.title()));
                let other = match mode {
                    Mode::Local => Mode::Remote,
                    Mode::Remote => Mode::Local,
                };
                if ui.small_button(format!("Switch to {}", other.title())).clicked() {
                    self.state = self.form.select_mode(&self.state, other);
                }
            });

            ui.weak(format!("Logging to {}", self.form.store().path().display()));

            if self.state.context.phase() == SessionPhase::NoWorkout {
                if ui.button("Start New Workout").clicked() {
                    self.start_workout();
                }
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| self.workout_form(ui));
        });
        self.draw_toast(ctx);
    }
}

fn draw_field(
    ui: &mut egui::Ui,
    field: &FormField,
    view: &FormView,
    draft: &mut FormDraft,
    pickers: &mut Pickers,
) {
    match field.name {
        "workout_name" => {
            name_picker(
                ui,
                "Select Workout",
                "New Workout",
                &view.workouts,
                draft.entry(field.name),
                &mut pickers.new_workout,
            );
            return;
        }
        "exercise_name" => {
            name_picker(
                ui,
                "Select Exercise",
                "New Exercise",
                &view.exercises,
                draft.entry(field.name),
                &mut pickers.new_exercise,
            );
            if !view.history.is_empty() {
                egui::CollapsingHeader::new("📊 Exercise History").show(ui, |ui| {
                    for session in &view.history {
                        ui.strong(format!("Date: {}", session.date.format("%Y-%m-%d")));
                        for set in &session.sets {
                            ui.label(format_set(set));
                        }
                        ui.separator();
                    }
                });
            }
            return;
        }
        _ => {}
    }

    let label = if field.required {
        field.spec.label.to_string()
    } else {
        format!("{} (optional)", field.spec.label)
    };
    ui.horizontal(|ui| {
        ui.label(label);
        match field.spec.kind {
            FieldKind::ReadOnly => {
                let mut n = view.set_number;
                ui.add_enabled(false, egui::DragValue::new(&mut n));
            }
            FieldKind::Integer { min, max } => {
                let hint = match max {
                    Some(max) => format!("{min}-{max}"),
                    None => format!("≥ {min}"),
                };
                ui.add(egui::TextEdit::singleline(draft.entry(field.name)).hint_text(hint));
            }
            FieldKind::Decimal { min, step, .. } => {
                ui.add(
                    egui::TextEdit::singleline(draft.entry(field.name))
                        .hint_text(format!("≥ {min}")),
                );
                let current = draft.get(field.name).trim().parse::<f64>().unwrap_or(min);
                if ui.small_button("−").clicked() {
                    draft.set(field.name, (current - step).max(min).to_string());
                }
                if ui.small_button("+").clicked() {
                    draft.set(field.name, (current + step).to_string());
                }
            }
            FieldKind::Text => {
                ui.text_edit_multiline(draft.entry(field.name));
            }
        }
    });
}

/// Combo box of known names with a free-text entry for a new one.
fn name_picker(
    ui: &mut egui::Ui,
    label: &str,
    new_label: &str,
    options: &[String],
    value: &mut String,
    typing_new: &mut bool,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        let selected = if *typing_new {
            new_label.to_string()
        } else {
            value.clone()
        };
        egui::ComboBox::from_id_source(label)
            .selected_text(selected)
            .show_ui(ui, |ui| {
                if ui.selectable_label(*typing_new, new_label).clicked() && !*typing_new {
                    *typing_new = true;
                    value.clear();
                }
                for opt in options {
                    let is_sel = !*typing_new && value.as_str() == opt.as_str();
                    if ui.selectable_label(is_sel, opt.as_str()).clicked() {
                        *typing_new = false;
                        *value = opt.clone();
                    }
                }
            });
    });
    if *typing_new {
        ui.add(
            egui::TextEdit::singleline(value).hint_text(format!("Enter {new_label} Name")),
        );
        if let Some(existing) = suggest_existing(value, options) {
            if ui.small_button(format!("Did you mean {existing}?")).clicked() {
                *value = existing.to_string();
                *typing_new = false;
            }
        }
    }
}

impl App for WorkoutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.ui(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_in(dir: &tempfile::TempDir) -> WorkoutApp {
        let config = Config {
            local_file: dir.path().join("log.csv"),
            ..Config::default()
        };
        WorkoutApp::new(&config)
    }

    fn frame(app: &mut WorkoutApp) {
        let ctx = egui::Context::default();
        let _ = ctx.run(Default::default(), |ctx| app.ui(ctx));
    }

    #[test]
    fn frames_do_not_advance_the_set_counter() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.state = app.form.select_mode(&app.state, Mode::Local);
        app.start_workout();
        app.state.draft.set("workout_name", "Push Day");
        app.state.draft.set("exercise_name", "Bench");
        app.state.draft.set("weight_kg", "60");
        app.state.draft.set("reps", "8");

        frame(&mut app);
        app.save_set();
        assert_eq!(app.toast.as_ref().map(|t| t.kind), Some(ToastKind::Success));

        app.state.draft.set("weight_kg", "62.5");
        app.state.draft.set("reps", "6");
        for _ in 0..3 {
            frame(&mut app);
        }
        assert_eq!(app.state.context.set_number(), 2);
        assert_eq!(app.state.context.active_exercise(), Some("Bench"));
    }

    #[test]
    fn failed_save_shows_error_toast() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.state = app.form.select_mode(&app.state, Mode::Local);
        app.start_workout();
        app.save_set();
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.text, "Workout is required");
    }

    #[test]
    fn end_workout_resets_pickers() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.state = app.form.select_mode(&app.state, Mode::Local);
        app.start_workout();
        app.pickers.new_workout = false;
        app.end_workout();
        assert_eq!(app.pickers, Pickers::default());
        assert_eq!(app.state.context.phase(), SessionPhase::NoWorkout);
        frame(&mut app);
    }
}
