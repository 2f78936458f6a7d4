//! Declarative description of the form fields.
//!
//! The same table drives both the rendered widgets and validation of the
//! values typed into them.

use phf::phf_map;
use std::collections::BTreeMap;
use std::fmt;

/// How a field is entered and coerced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    /// Managed by the session, shown but never edited.
    ReadOnly,
    Integer { min: i64, max: Option<i64> },
    Decimal { min: f64, max: Option<f64>, step: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub label: &'static str,
    pub kind: FieldKind,
}

pub static FIELDS: phf::Map<&'static str, FieldSpec> = phf_map! {
    "workout_name" => FieldSpec { label: "Workout", kind: FieldKind::Text },
    "exercise_name" => FieldSpec { label: "Exercise", kind: FieldKind::Text },
    "set_number" => FieldSpec { label: "Set Number", kind: FieldKind::ReadOnly },
    "weight_kg" => FieldSpec {
        label: "Weight (kg)",
        kind: FieldKind::Decimal { min: 0.0, max: None, step: 0.5 },
    },
    "reps" => FieldSpec {
        label: "Reps",
        kind: FieldKind::Integer { min: 1, max: None },
    },
    "rpe" => FieldSpec {
        label: "RPE (Rate of Perceived Exertion)",
        kind: FieldKind::Integer { min: 1, max: Some(10) },
    },
    "rest_sec" => FieldSpec {
        label: "Rest Time (seconds)",
        kind: FieldKind::Integer { min: 0, max: None },
    },
    "notes" => FieldSpec { label: "Notes", kind: FieldKind::Text },
};

/// Largest value an integer column can hold in the log.
const INTEGER_CEILING: i64 = u32::MAX as i64;

/// Fields every saved set must carry regardless of configuration.
pub const CORE_FIELDS: [&str; 5] = ["workout_name", "exercise_name", "set_number", "weight_kg", "reps"];

/// A field as it appears on the form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormField {
    pub name: &'static str,
    pub spec: FieldSpec,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Missing { field: &'static str },
    NotANumber { field: &'static str, value: String },
    OutOfRange { field: &'static str, value: String, bounds: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Missing { field } => write!(f, "{} is required", label_of(field)),
            ValidationError::NotANumber { field, value } => {
                write!(f, "{} must be a number, got \"{value}\"", label_of(field))
            }
            ValidationError::OutOfRange { field, value, bounds } => {
                write!(f, "{} must be {bounds}, got {value}", label_of(field))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn label_of(field: &str) -> &str {
    FIELDS.get(field).map(|s| s.label).unwrap_or(field)
}

/// Raw text typed into the form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDraft {
    values: BTreeMap<String, String>,
}

impl FormDraft {
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn entry(&mut self, field: &str) -> &mut String {
        self.values.entry(field.to_string()).or_default()
    }

    /// Drop every value except the listed fields.
    pub fn retain_only(&mut self, keep: &[&str]) {
        self.values.retain(|k, _| keep.contains(&k.as_str()));
    }
}

/// Values that passed validation, coerced to their record types.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSet {
    pub workout_name: String,
    pub exercise_name: String,
    pub weight_kg: f32,
    pub reps: u32,
    pub rpe: Option<u8>,
    pub rest_sec: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Text(String),
    Int(i64),
    Decimal(f64),
}

/// Ordered set of fields shown on the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSchema {
    fields: Vec<FormField>,
}

impl FormSchema {
    /// Build the schema from configured field name lists.
    ///
    /// Unknown names are skipped. Core record fields are always required and
    /// are appended if the configuration forgot them.
    pub fn from_names(required: &[String], optional: &[String]) -> Self {
        let mut fields: Vec<FormField> = Vec::new();
        let listed = required
            .iter()
            .map(|n| (n, true))
            .chain(optional.iter().map(|n| (n, false)));
        for (name, required) in listed {
            let Some((&key, spec)) = FIELDS.get_entry(name.as_str()) else {
                log::warn!("Ignoring unknown form field '{name}'");
                continue;
            };
            if fields.iter().any(|f| f.name == key) {
                continue;
            }
            let core = CORE_FIELDS.contains(&key);
            if core && !required {
                log::warn!("Field '{key}' is always required; treating it as required");
            }
            fields.push(FormField {
                name: key,
                spec: *spec,
                required: required || core,
            });
        }
        for name in CORE_FIELDS {
            if !fields.iter().any(|f| f.name == name) {
                log::warn!("Required field '{name}' missing from configuration; adding it");
                if let Some((&key, spec)) = FIELDS.get_entry(name) {
                    fields.push(FormField {
                        name: key,
                        spec: *spec,
                        required: true,
                    });
                }
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Check presence, numeric coercion and bounds of every editable field.
    pub fn validate(&self, draft: &FormDraft) -> Result<ValidatedSet, ValidationError> {
        let mut values: BTreeMap<&'static str, Value> = BTreeMap::new();
        for field in &self.fields {
            if let Some(v) = coerce(field, draft.get(field.name))? {
                values.insert(field.name, v);
            }
        }

        let text = |name: &'static str| match values.get(name) {
            Some(Value::Text(s)) => Some(s.clone()),
            _ => None,
        };
        let int = |name: &'static str| match values.get(name) {
            Some(Value::Int(i)) => Some(*i),
            _ => None,
        };

        Ok(ValidatedSet {
            workout_name: text("workout_name").ok_or(ValidationError::Missing {
                field: "workout_name",
            })?,
            exercise_name: text("exercise_name").ok_or(ValidationError::Missing {
                field: "exercise_name",
            })?,
            weight_kg: match values.get("weight_kg") {
                Some(Value::Decimal(w)) => *w as f32,
                _ => return Err(ValidationError::Missing { field: "weight_kg" }),
            },
            reps: narrow("reps", int("reps"))?
                .ok_or(ValidationError::Missing { field: "reps" })?,
            rpe: narrow("rpe", int("rpe"))?,
            rest_sec: narrow("rest_sec", int("rest_sec"))?,
            notes: text("notes"),
        })
    }
}

fn coerce(field: &FormField, raw: &str) -> Result<Option<Value>, ValidationError> {
    let raw = raw.trim();
    if matches!(field.spec.kind, FieldKind::ReadOnly) {
        return Ok(None);
    }
    if raw.is_empty() {
        return if field.required {
            Err(ValidationError::Missing { field: field.name })
        } else {
            Ok(None)
        };
    }
    match field.spec.kind {
        FieldKind::ReadOnly => Ok(None),
        FieldKind::Text => Ok(Some(Value::Text(raw.to_string()))),
        FieldKind::Integer { min, max } => {
            // "8.0" coerces to 8, "8.5" does not
            let n = raw
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    raw.parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| f as i64)
                })
                .ok_or_else(|| ValidationError::NotANumber {
                    field: field.name,
                    value: raw.to_string(),
                })?;
            let ceiling = max.unwrap_or(INTEGER_CEILING).min(INTEGER_CEILING);
            if n < min || n > ceiling {
                let shown_max = if n > ceiling { Some(ceiling) } else { max };
                return Err(ValidationError::OutOfRange {
                    field: field.name,
                    value: n.to_string(),
                    bounds: describe_bounds(min as f64, shown_max.map(|m| m as f64)),
                });
            }
            Ok(Some(Value::Int(n)))
        }
        FieldKind::Decimal { min, max, .. } => {
            let n = raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| ValidationError::NotANumber {
                    field: field.name,
                    value: raw.to_string(),
                })?;
            // stored as f32, so anything past f32::MAX would become infinite
            let ceiling = max.unwrap_or(f64::from(f32::MAX)).min(f64::from(f32::MAX));
            if n < min || n > ceiling {
                let shown_max = if n > ceiling { Some(ceiling) } else { max };
                return Err(ValidationError::OutOfRange {
                    field: field.name,
                    value: n.to_string(),
                    bounds: describe_bounds(min, shown_max),
                });
            }
            Ok(Some(Value::Decimal(n)))
        }
    }
}

/// Convert a bounds-checked integer to its record type.
fn narrow<T: TryFrom<i64>>(
    field: &'static str,
    value: Option<i64>,
) -> Result<Option<T>, ValidationError> {
    value
        .map(|n| {
            T::try_from(n).map_err(|_| ValidationError::OutOfRange {
                field,
                value: n.to_string(),
                bounds: describe_bounds(0.0, Some(INTEGER_CEILING as f64)),
            })
        })
        .transpose()
}

fn describe_bounds(min: f64, max: Option<f64>) -> String {
    match max {
        Some(max) => format!("between {min} and {max}"),
        None => format!("at least {min}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn default_schema() -> FormSchema {
        FormSchema::from_names(
            &names(&["workout_name", "exercise_name", "set_number", "weight_kg", "reps"]),
            &names(&["rpe", "rest_sec", "notes"]),
        )
    }

    fn filled() -> FormDraft {
        let mut d = FormDraft::default();
        d.set("workout_name", "Push Day");
        d.set("exercise_name", "Bench");
        d.set("weight_kg", "60");
        d.set("reps", "8");
        d
    }

    #[test]
    fn schema_keeps_configured_order() {
        let schema = default_schema();
        let order: Vec<&str> = schema.fields().iter().map(|f| f.name).collect();
        assert_eq!(
            order,
            vec![
                "workout_name",
                "exercise_name",
                "set_number",
                "weight_kg",
                "reps",
                "rpe",
                "rest_sec",
                "notes"
            ]
        );
        assert_eq!(schema.fields().iter().filter(|f| f.required).count(), 5);
    }

    #[test]
    fn core_fields_cannot_be_dropped_or_demoted() {
        let schema = FormSchema::from_names(
            &names(&["workout_name", "mood"]),
            &names(&["reps", "notes"]),
        );
        let reps = schema.fields().iter().find(|f| f.name == "reps").unwrap();
        assert!(reps.required);
        for core in CORE_FIELDS {
            assert!(schema.fields().iter().any(|f| f.name == core && f.required));
        }
        assert!(!schema.fields().iter().any(|f| f.name == "mood"));
    }

    #[test]
    fn optional_field_can_be_promoted() {
        let schema = FormSchema::from_names(
            &names(&["workout_name", "exercise_name", "set_number", "weight_kg", "reps", "rpe"]),
            &names(&["notes"]),
        );
        let err = schema.validate(&filled()).unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: "rpe" });
    }

    #[test]
    fn accepts_blank_optional_fields() {
        let set = default_schema().validate(&filled()).unwrap();
        assert_eq!(set.workout_name, "Push Day");
        assert_eq!(set.exercise_name, "Bench");
        assert_eq!(set.weight_kg, 60.0);
        assert_eq!(set.reps, 8);
        assert_eq!(set.rpe, None);
        assert_eq!(set.rest_sec, None);
        assert_eq!(set.notes, None);
    }

    #[test]
    fn coerces_optional_numbers_and_text() {
        let mut d = filled();
        d.set("rpe", " 8 ");
        d.set("rest_sec", "90");
        d.set("notes", "felt strong");
        d.set("weight_kg", "62.5");
        let set = default_schema().validate(&d).unwrap();
        assert_eq!(set.rpe, Some(8));
        assert_eq!(set.rest_sec, Some(90));
        assert_eq!(set.notes.as_deref(), Some("felt strong"));
        assert_eq!(set.weight_kg, 62.5);
    }

    #[test]
    fn rejects_missing_required() {
        let mut d = filled();
        d.set("exercise_name", "   ");
        let err = default_schema().validate(&d).unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: "exercise_name" });
        assert_eq!(err.to_string(), "Exercise is required");
    }

    #[test]
    fn rejects_out_of_bounds_numbers() {
        let schema = default_schema();

        let mut d = filled();
        d.set("weight_kg", "-2.5");
        assert!(matches!(
            schema.validate(&d),
            Err(ValidationError::OutOfRange { field: "weight_kg", .. })
        ));

        let mut d = filled();
        d.set("reps", "0");
        assert!(matches!(
            schema.validate(&d),
            Err(ValidationError::OutOfRange { field: "reps", .. })
        ));

        let mut d = filled();
        d.set("rpe", "11");
        let err = schema.validate(&d).unwrap_err();
        assert_eq!(
            err.to_string(),
            "RPE (Rate of Perceived Exertion) must be between 1 and 10, got 11"
        );
    }

    #[test]
    fn rejects_non_numeric_text() {
        let mut d = filled();
        d.set("reps", "eight");
        assert_eq!(
            default_schema().validate(&d),
            Err(ValidationError::NotANumber {
                field: "reps",
                value: "eight".into()
            })
        );

        let mut d = filled();
        d.set("reps", "8.5");
        assert!(matches!(
            default_schema().validate(&d),
            Err(ValidationError::NotANumber { field: "reps", .. })
        ));
    }

    #[test]
    fn rejects_numbers_too_large_for_the_log() {
        let schema = default_schema();

        let mut d = filled();
        d.set("rest_sec", "5000000000");
        assert!(matches!(
            schema.validate(&d),
            Err(ValidationError::OutOfRange { field: "rest_sec", .. })
        ));

        let mut d = filled();
        d.set("reps", "5000000000");
        let err = schema.validate(&d).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "reps", .. }));
        assert_eq!(
            err.to_string(),
            "Reps must be between 1 and 4294967295, got 5000000000"
        );

        let mut d = filled();
        d.set("weight_kg", "1e39");
        assert!(matches!(
            schema.validate(&d),
            Err(ValidationError::OutOfRange { field: "weight_kg", .. })
        ));
    }

    #[test]
    fn largest_storable_values_are_kept() {
        let mut d = filled();
        d.set("reps", "4294967295");
        d.set("rest_sec", "4294967295");
        d.set("weight_kg", "1e38");
        let set = default_schema().validate(&d).unwrap();
        assert_eq!(set.reps, u32::MAX);
        assert_eq!(set.rest_sec, Some(u32::MAX));
        assert!(set.weight_kg.is_finite());
    }

    #[test]
    fn draft_retain_only() {
        let mut d = filled();
        d.retain_only(&["workout_name", "exercise_name"]);
        assert_eq!(d.get("workout_name"), "Push Day");
        assert_eq!(d.get("exercise_name"), "Bench");
        assert_eq!(d.get("weight_kg"), "");
    }
}
