//! The workout form: what to show before a set and what happens after one
//! is saved.
//!
//! [`FormSession`] owns the collaborators (log store, schema, sink). The
//! changing state lives in [`FormState`], which every action takes by
//! reference and returns updated, so a failed action leaves the caller's
//! state untouched.

use crate::fields::{FormDraft, FormField, FormSchema, ValidationError};
use crate::history::{DEFAULT_SESSION_LIMIT, SessionSummary, last_sessions};
use crate::notify::NotificationSink;
use crate::record::{SetRecord, TIMESTAMP_FORMAT};
use crate::session::{SessionContext, SessionError};
use crate::store::{LogStore, StoreError};
use chrono::NaiveDateTime;

/// Where saved sets go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Training log only.
    Local,
    /// Training log plus the webhook.
    Remote,
}

impl Mode {
    pub fn title(self) -> &'static str {
        match self {
            Mode::Local => "Local",
            Mode::Remote => "Web",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub mode: Option<Mode>,
    pub context: SessionContext,
    pub draft: FormDraft,
}

/// Result of forwarding a saved set.
#[derive(Debug, Clone, PartialEq)]
pub enum Forwarding {
    Skipped,
    Delivered,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub record: SetRecord,
    pub forwarding: Forwarding,
}

impl SaveOutcome {
    pub fn message(&self) -> String {
        match &self.forwarding {
            Forwarding::Skipped => "Set saved locally!".into(),
            Forwarding::Delivered => "Set saved and sent to webhook!".into(),
            Forwarding::Failed(reason) => {
                format!("Set saved locally, but sending to the webhook failed: {reason}")
            }
        }
    }
}

#[derive(Debug)]
pub enum SaveError {
    Session(SessionError),
    Validation(ValidationError),
    Write(StoreError),
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Session(e) => write!(f, "{e}"),
            SaveError::Validation(e) => write!(f, "{e}"),
            SaveError::Write(e) => write!(f, "Set not saved ({e}). Nothing changed, try again."),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Session(e) => Some(e),
            SaveError::Validation(e) => Some(e),
            SaveError::Write(e) => Some(e),
        }
    }
}

impl From<SessionError> for SaveError {
    fn from(e: SessionError) -> Self {
        SaveError::Session(e)
    }
}

impl From<ValidationError> for SaveError {
    fn from(e: ValidationError) -> Self {
        SaveError::Validation(e)
    }
}

impl From<StoreError> for SaveError {
    fn from(e: StoreError) -> Self {
        SaveError::Write(e)
    }
}

/// Everything the form needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub workouts: Vec<String>,
    pub exercises: Vec<String>,
    pub fields: Vec<FormField>,
    pub set_number: u32,
    /// Recent sessions of the selected exercise, newest first.
    pub history: Vec<SessionSummary>,
}

pub struct FormSession<S: NotificationSink> {
    store: LogStore,
    schema: FormSchema,
    sink: S,
}

impl<S: NotificationSink> FormSession<S> {
    pub fn new(store: LogStore, schema: FormSchema, sink: S) -> Self {
        Self {
            store,
            schema,
            sink,
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn select_mode(&self, state: &FormState, mode: Mode) -> FormState {
        log::info!("User selected {} Mode", mode.title());
        FormState {
            mode: Some(mode),
            ..state.clone()
        }
    }

    /// Sync the session with the names on the form and build the view.
    ///
    /// Calling this any number of times with the same draft yields the same
    /// state.
    pub fn render(&self, state: &FormState) -> (FormState, FormView) {
        let context = synced_context(state);
        let loaded = self.store.load();
        let history = match context.active_exercise() {
            Some(ex) if loaded.exercises.iter().any(|e| e == ex) => {
                last_sessions(&loaded.rows, ex, DEFAULT_SESSION_LIMIT)
            }
            _ => Vec::new(),
        };
        let view = FormView {
            workouts: loaded.workouts,
            exercises: loaded.exercises,
            fields: self.schema.fields().to_vec(),
            set_number: context.set_number(),
            history,
        };
        let next = FormState {
            context,
            ..state.clone()
        };
        (next, view)
    }

    pub fn start_workout(&self, state: &FormState) -> Result<FormState, SessionError> {
        let context = state.context.start_workout()?;
        log::info!("Workout started");
        Ok(FormState {
            mode: state.mode,
            context,
            draft: FormDraft::default(),
        })
    }

    pub fn new_exercise(&self, state: &FormState) -> Result<FormState, SessionError> {
        let context = state.context.new_exercise()?;
        let mut draft = state.draft.clone();
        draft.retain_only(&["workout_name"]);
        log::info!("New exercise in workout {:?}", context.active_workout());
        Ok(FormState {
            mode: state.mode,
            context,
            draft,
        })
    }

    pub fn end_workout(&self, state: &FormState) -> Result<FormState, SessionError> {
        let context = state.context.end_workout()?;
        log::info!("Workout ended");
        Ok(FormState {
            mode: state.mode,
            context,
            draft: FormDraft::default(),
        })
    }

    /// Validate, append to the log and, in remote mode, forward the set.
    ///
    /// A forwarding failure is reported in the outcome; the set is already
    /// in the log at that point and the session still advances.
    pub fn save(
        &self,
        state: &FormState,
        now: NaiveDateTime,
    ) -> Result<(FormState, SaveOutcome), SaveError> {
        let context = synced_context(state);
        if !context.is_active() {
            return Err(SessionError::NoActiveWorkout.into());
        }
        let set = self.schema.validate(&state.draft)?;
        let record = SetRecord {
            workout_name: set.workout_name,
            exercise_name: set.exercise_name,
            set_number: context.set_number(),
            weight_kg: set.weight_kg,
            reps: set.reps,
            rpe: set.rpe,
            rest_sec: set.rest_sec,
            notes: set.notes,
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        };

        if let Err(e) = self.store.append(&record) {
            log::error!("Failed to save set: {e}");
            return Err(e.into());
        }

        let forwarding = match state.mode {
            Some(Mode::Remote) => match self.sink.notify(&record) {
                Ok(()) => Forwarding::Delivered,
                Err(e) => Forwarding::Failed(e.to_string()),
            },
            _ => Forwarding::Skipped,
        };

        let context = context.after_save()?;
        let mut draft = state.draft.clone();
        draft.retain_only(&["workout_name", "exercise_name"]);
        let next = FormState {
            mode: state.mode,
            context,
            draft,
        };
        Ok((next, SaveOutcome { record, forwarding }))
    }
}

/// The session context after following the names typed on the form.
fn synced_context(state: &FormState) -> SessionContext {
    state
        .context
        .select_workout(state.draft.get("workout_name"))
        .select_exercise(state.draft.get("exercise_name"))
}

/// Closest existing name to a freshly typed one, if it looks like a typo or
/// a case variant.
pub fn suggest_existing<'a>(typed: &str, options: &'a [String]) -> Option<&'a str> {
    let typed = typed.trim();
    if typed.is_empty() {
        return None;
    }
    let lowered = typed.to_lowercase();
    options
        .iter()
        .filter(|o| o.as_str() != typed)
        .map(|o| (o, strsim::jaro_winkler(&lowered, &o.to_lowercase())))
        .filter(|(_, score)| *score >= 0.88)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(o, _)| o.as_str())
}
