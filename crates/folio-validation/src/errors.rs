//! Validation error types
//!
//! A failed save aggregates one error per field. The message formats for cast
//! and required failures are part of the compatibility contract and must not
//! change.

use crate::types::Value;
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

// ============================================================================
// Validation Result
// ============================================================================

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationErrors>;

// ============================================================================
// Single Field Error
// ============================================================================

/// Classification of field-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// Raw value could not be converted to the declared type
    Cast,
    /// Required field absent with no default
    Required,
    /// A declared rule (built-in constraint or custom) rejected the value
    Validator,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cast => write!(f, "cast_error"),
            Self::Required => write!(f, "required"),
            Self::Validator => write!(f, "validator_failed"),
        }
    }
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Field name the error is attached to
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Error classification
    pub kind: FieldErrorKind,
}

impl FieldError {
    /// Create a cast error.
    ///
    /// Message format is fixed:
    /// `Cast to <Type> failed for value "<raw>" at path "<field>"`
    pub fn cast(field: impl Into<String>, target: &str, raw: &Value) -> Self {
        let field = field.into();
        let message = format!(
            "Cast to {} failed for value \"{}\" at path \"{}\"",
            target, raw, field
        );
        Self {
            field,
            message,
            kind: FieldErrorKind::Cast,
        }
    }

    /// Create a required-field error.
    ///
    /// Message format is fixed: ``Path `<field>` is required.``
    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("Path `{}` is required.", field);
        Self {
            field,
            message,
            kind: FieldErrorKind::Required,
        }
    }

    /// Create a validator failure with an already-rendered message
    pub fn validator(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: FieldErrorKind::Validator,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FieldError {}

// ============================================================================
// Per-Field Error Collection
// ============================================================================

/// Collection of validation errors, at most one per field.
///
/// The first error recorded for a field wins; later errors for the same field
/// are dropped. Iteration order is deterministic (lexicographic by field),
/// not declaration order - callers must only rely on key sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, FieldError>,
}

impl ValidationErrors {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of failed fields
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Record an error unless the field already has one
    pub fn insert(&mut self, error: FieldError) {
        self.errors.entry(error.field.clone()).or_insert(error);
    }

    /// Check whether a field has an error
    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get the error for a field
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.errors.get(field)
    }

    /// Get the error message for a field
    pub fn message(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(|e| e.message.as_str())
    }

    /// Names of all failed fields
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(|k| k.as_str())
    }

    /// Iterate over (field, error) pairs
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldError> {
        self.errors.iter()
    }

    /// Merge another collection into this one (existing entries win)
    pub fn merge(&mut self, other: ValidationErrors) {
        for (_, error) in other.errors {
            self.insert(error);
        }
    }

    /// Convert to Result - Ok if no errors, Err if there are errors
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = (&'a String, &'a FieldError);
    type IntoIter = btree_map::Iter<'a, String, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_message_format() {
        let err = FieldError::cast("age", "Number", &Value::String("abc".to_string()));
        assert_eq!(
            err.message,
            "Cast to Number failed for value \"abc\" at path \"age\""
        );
        assert_eq!(err.kind, FieldErrorKind::Cast);
    }

    #[test]
    fn test_required_message_format() {
        let err = FieldError::required("title");
        assert_eq!(err.message, "Path `title` is required.");
        assert_eq!(err.kind, FieldErrorKind::Required);
    }

    #[test]
    fn test_errors_empty() {
        let errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert_eq!(errors.len(), 0);
    }

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.insert(FieldError::required("title"));
        errors.insert(FieldError::validator("title", "too short"));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.message("title"), Some("Path `title` is required."));
    }

    #[test]
    fn test_merge_keeps_existing() {
        let mut left = ValidationErrors::new();
        left.insert(FieldError::required("a"));

        let mut right = ValidationErrors::new();
        right.insert(FieldError::validator("a", "other"));
        right.insert(FieldError::required("b"));

        left.merge(right);
        assert_eq!(left.len(), 2);
        assert_eq!(left.get("a").unwrap().kind, FieldErrorKind::Required);
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.insert(FieldError::required("x"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_display_counts_fields() {
        let mut errors = ValidationErrors::new();
        errors.insert(FieldError::required("a"));
        errors.insert(FieldError::required("b"));
        assert_eq!(errors.to_string(), "2 validation error(s)");
    }

    #[test]
    fn test_fields_are_sorted() {
        let mut errors = ValidationErrors::new();
        errors.insert(FieldError::required("zeta"));
        errors.insert(FieldError::required("alpha"));
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["alpha", "zeta"]);
    }
}
