//! Workout session state.
//!
//! [`SessionContext`] is a plain value. Every transition takes the current
//! context and returns the next one, so the caller decides when a change is
//! committed and repeated renders of the same selection are harmless.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoWorkout,
    WorkoutActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NoActiveWorkout,
    WorkoutAlreadyActive,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NoActiveWorkout => write!(f, "Start a workout before logging sets"),
            SessionError::WorkoutAlreadyActive => write!(f, "A workout is already in progress"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    active_workout: Option<String>,
    active_exercise: Option<String>,
    set_number: u32,
    workout_in_progress: bool,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            active_workout: None,
            active_exercise: None,
            set_number: 1,
            workout_in_progress: false,
        }
    }
}

fn normalize(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

impl SessionContext {
    pub fn phase(&self) -> SessionPhase {
        if self.workout_in_progress {
            SessionPhase::WorkoutActive
        } else {
            SessionPhase::NoWorkout
        }
    }

    pub fn is_active(&self) -> bool {
        self.workout_in_progress
    }

    pub fn active_workout(&self) -> Option<&str> {
        self.active_workout.as_deref()
    }

    pub fn active_exercise(&self) -> Option<&str> {
        self.active_exercise.as_deref()
    }

    /// Number of the next set to be logged, never below 1.
    pub fn set_number(&self) -> u32 {
        self.set_number.max(1)
    }

    pub fn start_workout(&self) -> Result<Self, SessionError> {
        if self.workout_in_progress {
            return Err(SessionError::WorkoutAlreadyActive);
        }
        Ok(Self {
            workout_in_progress: true,
            ..Self::default()
        })
    }

    /// Remember the workout/exercise currently chosen on the form.
    ///
    /// The set counter restarts at 1 when either name differs from the
    /// remembered pair and is left alone otherwise.
    pub fn select(&self, workout: Option<&str>, exercise: Option<&str>) -> Self {
        let workout = normalize(workout);
        let exercise = normalize(exercise);
        if workout == self.active_workout && exercise == self.active_exercise {
            return self.clone();
        }
        log::debug!(
            "Selection changed to {:?} / {:?}; set counter reset",
            workout,
            exercise
        );
        Self {
            active_workout: workout,
            active_exercise: exercise,
            set_number: 1,
            workout_in_progress: self.workout_in_progress,
        }
    }

    pub fn select_workout(&self, name: &str) -> Self {
        self.select(Some(name), self.active_exercise.as_deref())
    }

    pub fn select_exercise(&self, name: &str) -> Self {
        self.select(self.active_workout.as_deref(), Some(name))
    }

    /// Advance past a set that was just written to the log.
    pub fn after_save(&self) -> Result<Self, SessionError> {
        if !self.workout_in_progress {
            return Err(SessionError::NoActiveWorkout);
        }
        Ok(Self {
            set_number: self.set_number() + 1,
            ..self.clone()
        })
    }

    pub fn new_exercise(&self) -> Result<Self, SessionError> {
        if !self.workout_in_progress {
            return Err(SessionError::NoActiveWorkout);
        }
        Ok(Self {
            active_workout: self.active_workout.clone(),
            active_exercise: None,
            set_number: 1,
            workout_in_progress: true,
        })
    }

    pub fn end_workout(&self) -> Result<Self, SessionError> {
        if !self.workout_in_progress {
            return Err(SessionError::NoActiveWorkout);
        }
        Ok(Self::default())
    }
}
