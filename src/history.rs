// Summaries of previous sessions for an exercise
use crate::record::SetRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Number of past sessions shown next to the form.
pub const DEFAULT_SESSION_LIMIT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct SetSummary {
    pub set_number: u32,
    pub weight_kg: f32,
    pub reps: u32,
}

/// All sets of one exercise performed on a single calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub date: NaiveDate,
    pub sets: Vec<SetSummary>,
}

/// Return the `limit` most recent dates on which `exercise` was logged.
///
/// Sessions are ordered newest first and sets within a session by set
/// number. Rows sharing a set number on the same date are all kept, in log
/// order. Rows whose timestamp has no recognisable date are ignored.
pub fn last_sessions(rows: &[SetRecord], exercise: &str, limit: usize) -> Vec<SessionSummary> {
    let mut by_date: BTreeMap<NaiveDate, Vec<SetSummary>> = BTreeMap::new();
    for r in rows.iter().filter(|r| r.exercise_name == exercise) {
        let Some(date) = r.date() else {
            log::debug!("Ignoring {exercise} row with timestamp {:?}", r.timestamp);
            continue;
        };
        by_date.entry(date).or_default().push(SetSummary {
            set_number: r.set_number,
            weight_kg: r.weight_kg,
            reps: r.reps,
        });
    }

    by_date
        .into_iter()
        .rev()
        .take(limit)
        .map(|(date, mut sets)| {
            sets.sort_by_key(|s| s.set_number);
            SessionSummary { date, sets }
        })
        .collect()
}

/// Format a set the way the history panel lists it.
pub fn format_set(set: &SetSummary) -> String {
    format!("Set {}: {}kg × {} reps", set.set_number, set.weight_kg, set.reps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(exercise: &str, set: u32, weight: f32, ts: &str) -> SetRecord {
        SetRecord {
            workout_name: "Push Day".into(),
            exercise_name: exercise.into(),
            set_number: set,
            weight_kg: weight,
            reps: 8,
            rpe: None,
            rest_sec: None,
            notes: None,
            timestamp: ts.into(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn single_session_sets_in_order() {
        let rows = vec![
            row("Bench", 1, 60.0, "2024-01-01T10:00:00"),
            row("Bench", 2, 62.5, "2024-01-01T10:05:00"),
        ];
        let sessions = last_sessions(&rows, "Bench", DEFAULT_SESSION_LIMIT);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].date, date("2024-01-01"));
        let weights: Vec<f32> = sessions[0].sets.iter().map(|s| s.weight_kg).collect();
        assert_eq!(weights, vec![60.0, 62.5]);
    }

    #[test]
    fn keeps_two_most_recent_dates() {
        let rows = vec![
            row("Bench", 1, 50.0, "2024-01-01T10:00:00"),
            row("Bench", 2, 95.0, "2024-01-08T10:05:00"),
            row("Bench", 1, 90.0, "2024-01-08T10:00:00"),
            row("Squat", 1, 120.0, "2024-01-10T10:00:00"),
            row("Bench", 1, 55.0, "2024-01-04T10:00:00"),
        ];
        let sessions = last_sessions(&rows, "Bench", 2);
        let dates: Vec<NaiveDate> = sessions.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date("2024-01-08"), date("2024-01-04")]);
        let order: Vec<u32> = sessions[0].sets.iter().map(|s| s.set_number).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(sessions[0].sets[0].weight_kg, 90.0);
    }

    #[test]
    fn no_matching_exercise_is_empty() {
        let rows = vec![row("Bench", 1, 60.0, "2024-01-01T10:00:00")];
        assert!(last_sessions(&rows, "Deadlift", 2).is_empty());
        assert!(last_sessions(&[], "Bench", 2).is_empty());
    }

    #[test]
    fn duplicate_set_numbers_are_kept() {
        let rows = vec![
            row("Bench", 1, 60.0, "2024-01-01T09:00:00"),
            row("Bench", 2, 65.0, "2024-01-01T09:05:00"),
            row("Bench", 1, 40.0, "2024-01-01T18:00:00"),
        ];
        let sessions = last_sessions(&rows, "Bench", 2);
        assert_eq!(sessions.len(), 1);
        let sets: Vec<(u32, f32)> = sessions[0]
            .sets
            .iter()
            .map(|s| (s.set_number, s.weight_kg))
            .collect();
        assert_eq!(sets, vec![(1, 60.0), (1, 40.0), (2, 65.0)]);
    }

    #[test]
    fn rows_without_dates_are_ignored() {
        let rows = vec![
            row("Bench", 1, 60.0, ""),
            row("Bench", 1, 70.0, "2024-02-02T08:00:00"),
        ];
        let sessions = last_sessions(&rows, "Bench", 2);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].sets[0].weight_kg, 70.0);
    }

    #[test]
    fn formats_history_line() {
        let s = SetSummary {
            set_number: 2,
            weight_kg: 62.5,
            reps: 6,
        };
        assert_eq!(format_set(&s), "Set 2: 62.5kg × 6 reps");
    }
}
