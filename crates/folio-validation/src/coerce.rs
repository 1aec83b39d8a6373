//! Type coercion
//!
//! Converts raw field values into their declared types. Coercion of one field
//! never aborts coercion of siblings: the document pass attempts every field
//! and collects every failure.

use crate::errors::{FieldError, ValidationErrors};
use crate::fields::{FieldDefinition, FieldType};
use crate::types::{timestamp_from_millis, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Coerced field values of a document
pub type FieldMap = BTreeMap<String, Value>;

// ============================================================================
// Per-Field Coercion
// ============================================================================

/// Coerce a single raw value to the field's declared type.
///
/// An absent or null raw value takes the default/required path: the default
/// producer output is accepted verbatim (no further coercion); a required
/// field without a default fails; an optional field without a default yields
/// `Ok(None)` and simply stays unset.
pub fn coerce_field(
    def: &FieldDefinition,
    raw: Option<&Value>,
) -> Result<Option<Value>, FieldError> {
    let raw = match raw {
        None | Some(Value::Null) => {
            if let Some(value) = def.produce_default() {
                return Ok(Some(value));
            }
            if def.is_required() {
                return Err(FieldError::required(def.name()));
            }
            return Ok(None);
        }
        Some(value) => value,
    };

    coerce_value(def, raw).map(Some)
}

fn coerce_value(def: &FieldDefinition, raw: &Value) -> Result<Value, FieldError> {
    let cast_error = || FieldError::cast(def.name(), def.field_type().cast_target(), raw);

    match def.field_type() {
        // String conversion never fails
        FieldType::String => Ok(Value::String(raw.to_string())),

        FieldType::Number => match raw {
            Value::Int(_) | Value::Float(_) => Ok(raw.clone()),
            Value::String(s) => parse_number(s).ok_or_else(cast_error),
            _ => Err(cast_error()),
        },

        FieldType::Boolean => match raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            Value::String(s) => match s.as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(cast_error()),
            },
            _ => Err(cast_error()),
        },

        FieldType::Timestamp => match raw {
            Value::Timestamp(t) => Ok(Value::Timestamp(*t)),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .map_err(|_| cast_error()),
            // Integers are epoch milliseconds
            Value::Int(ms) => timestamp_from_millis(*ms).ok_or_else(cast_error),
            _ => Err(cast_error()),
        },
    }
}

/// Parse a numeric string, preferring integers. Non-finite parses ("NaN",
/// "inf") are rejected.
fn parse_number(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Int(i));
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(Value::Float(f)),
        _ => None,
    }
}

// ============================================================================
// Document Coercion Pass
// ============================================================================

/// Coerce every field of a schema against a raw value map.
///
/// Returns the coerced values of the fields that converted cleanly together
/// with the collected failures. Raw keys outside the schema are ignored.
pub fn coerce_document(
    fields: &[FieldDefinition],
    raw: &FieldMap,
) -> (FieldMap, ValidationErrors) {
    let mut coerced = FieldMap::new();
    let mut errors = ValidationErrors::new();

    for def in fields {
        match coerce_field(def, raw.get(def.name())) {
            Ok(Some(value)) => {
                coerced.insert(def.name().to_string(), value);
            }
            Ok(None) => {}
            Err(error) => errors.insert(error),
        }
    }

    (coerced, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn field(field_type: FieldType) -> FieldDefinition {
        FieldDefinition::new("f", field_type)
    }

    #[test]
    fn test_string_accepts_anything() {
        let def = field(FieldType::String);
        assert_eq!(
            coerce_field(&def, Some(&Value::Int(42))).unwrap(),
            Some(Value::String("42".to_string()))
        );
        assert_eq!(
            coerce_field(&def, Some(&Value::Bool(true))).unwrap(),
            Some(Value::String("true".to_string()))
        );
    }

    #[test]
    fn test_number_accepts_numeric_strings() {
        let def = field(FieldType::Number);
        assert_eq!(
            coerce_field(&def, Some(&Value::String("42".to_string()))).unwrap(),
            Some(Value::Int(42))
        );
        assert_eq!(
            coerce_field(&def, Some(&Value::String("3.5".to_string()))).unwrap(),
            Some(Value::Float(3.5))
        );
    }

    #[test]
    fn test_number_cast_error_message() {
        let def = FieldDefinition::new("age", FieldType::Number);
        let err = coerce_field(&def, Some(&Value::String("abc".to_string()))).unwrap_err();
        assert_eq!(
            err.message,
            "Cast to Number failed for value \"abc\" at path \"age\""
        );
    }

    #[test]
    fn test_number_rejects_bool_and_nan() {
        let def = field(FieldType::Number);
        assert!(coerce_field(&def, Some(&Value::Bool(true))).is_err());
        assert!(coerce_field(&def, Some(&Value::String("NaN".to_string()))).is_err());
    }

    #[test]
    fn test_boolean_spellings() {
        let def = field(FieldType::Boolean);
        for (raw, expected) in [
            (Value::Bool(true), true),
            (Value::Int(1), true),
            (Value::Int(0), false),
            (Value::String("true".to_string()), true),
            (Value::String("false".to_string()), false),
            (Value::String("1".to_string()), true),
            (Value::String("0".to_string()), false),
        ] {
            assert_eq!(
                coerce_field(&def, Some(&raw)).unwrap(),
                Some(Value::Bool(expected)),
                "raw: {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_boolean_rejects_other_input() {
        let def = FieldDefinition::new("active", FieldType::Boolean);
        let err = coerce_field(&def, Some(&Value::Int(2))).unwrap_err();
        assert_eq!(
            err.message,
            "Cast to Boolean failed for value \"2\" at path \"active\""
        );
        assert!(coerce_field(&def, Some(&Value::String("yes".to_string()))).is_err());
    }

    #[test]
    fn test_timestamp_accepts_rfc3339_and_millis() {
        let def = field(FieldType::Timestamp);
        let expected = Utc.with_ymd_and_hms(2024, 1, 19, 12, 0, 0).unwrap();

        let from_string =
            coerce_field(&def, Some(&Value::String("2024-01-19T12:00:00Z".to_string())))
                .unwrap()
                .unwrap();
        assert_eq!(from_string.as_timestamp().unwrap(), expected);

        let from_millis = coerce_field(&def, Some(&Value::Int(expected.timestamp_millis())))
            .unwrap()
            .unwrap();
        assert_eq!(from_millis.as_timestamp().unwrap(), expected);
    }

    #[test]
    fn test_timestamp_rejects_invalid_input() {
        let def = field(FieldType::Timestamp);
        assert!(coerce_field(&def, Some(&Value::String("not-a-date".to_string()))).is_err());
        assert!(coerce_field(&def, Some(&Value::Bool(true))).is_err());
    }

    #[test]
    fn test_absent_required_without_default_fails() {
        let def = FieldDefinition::new("title", FieldType::String).required();
        let err = coerce_field(&def, None).unwrap_err();
        assert_eq!(err.message, "Path `title` is required.");
    }

    #[test]
    fn test_absent_with_default_produces_value() {
        let def = FieldDefinition::new("status", FieldType::String)
            .required()
            .default_value("draft");
        assert_eq!(
            coerce_field(&def, None).unwrap(),
            Some(Value::String("draft".to_string()))
        );
    }

    #[test]
    fn test_null_takes_default_path() {
        let def = FieldDefinition::new("status", FieldType::String).default_value("draft");
        assert_eq!(
            coerce_field(&def, Some(&Value::Null)).unwrap(),
            Some(Value::String("draft".to_string()))
        );
    }

    #[test]
    fn test_absent_optional_stays_unset() {
        let def = field(FieldType::Number);
        assert_eq!(coerce_field(&def, None).unwrap(), None);
    }

    #[test]
    fn test_document_pass_collects_all_failures() {
        let fields = vec![
            FieldDefinition::new("title", FieldType::String).required(),
            FieldDefinition::new("age", FieldType::Number),
            FieldDefinition::new("active", FieldType::Boolean),
        ];
        let mut raw = FieldMap::new();
        raw.insert("age".to_string(), Value::String("abc".to_string()));
        raw.insert("active".to_string(), Value::String("yes".to_string()));

        let (coerced, errors) = coerce_document(&fields, &raw);
        assert!(coerced.is_empty());
        assert_eq!(errors.len(), 3);
        assert!(errors.contains("title"));
        assert!(errors.contains("age"));
        assert!(errors.contains("active"));
    }

    #[test]
    fn test_document_pass_ignores_unknown_keys() {
        let fields = vec![FieldDefinition::new("title", FieldType::String)];
        let mut raw = FieldMap::new();
        raw.insert("title".to_string(), Value::from("ok"));
        raw.insert("stray".to_string(), Value::Int(1));

        let (coerced, errors) = coerce_document(&fields, &raw);
        assert!(errors.is_empty());
        assert_eq!(coerced.len(), 1);
        assert!(coerced.contains_key("title"));
    }
}
