use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format used when stamping a freshly saved set.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A single logged set, one row of the training log.
///
/// Field order matches the CSV header order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub workout_name: String,
    pub exercise_name: String,
    pub set_number: u32,
    pub weight_kg: f32,
    pub reps: u32,
    #[serde(default)]
    pub rpe: Option<u8>,
    #[serde(default)]
    pub rest_sec: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl SetRecord {
    /// Calendar date of the set, ignoring any time zone information.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_timestamp_date(&self.timestamp)
    }
}

/// Extract the calendar date from a timestamp string.
///
/// ISO-8601 with `T` or space separators, RFC 3339 with an offset and bare
/// dates are accepted. Offsets are not applied; the literal date is kept.
pub fn parse_timestamp_date(ts: &str) -> Option<NaiveDate> {
    let ts = ts.trim();
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.naive_local().date());
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d").ok()
}
