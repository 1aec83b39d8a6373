//! Rule execution
//!
//! Runs built-in constraints and custom rules against coerced values. A field
//! that failed coercion is never rule-checked: the cast error is the sole
//! error reported for it.

use crate::coerce::{coerce_document, FieldMap};
use crate::errors::{FieldError, ValidationResult};
use crate::fields::{Constraints, FieldDefinition};
use crate::types::Value;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Document Context
// ============================================================================

/// Read-only view of a candidate document's coerced values, passed to custom
/// rules so they can reference sibling fields.
///
/// A sibling that failed coercion is absent from the context; cross-field
/// predicates must tolerate `None`.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    fields: &'a FieldMap,
}

impl<'a> DocumentContext<'a> {
    /// Create a context over a coerced value map
    pub fn new(fields: &'a FieldMap) -> Self {
        Self { fields }
    }

    /// Get a sibling field's coerced value
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name)
    }

    /// Check whether a sibling field has a value
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All coerced values
    pub fn fields(&self) -> &'a FieldMap {
        self.fields
    }
}

// ============================================================================
// Custom Rules
// ============================================================================

/// Predicate over (candidate value, document context)
pub type RulePredicate = Arc<dyn Fn(&Value, &DocumentContext<'_>) -> bool + Send + Sync>;

/// A declared rule: pure predicate plus message template.
///
/// The template may contain a `{VALUE}` placeholder, replaced with the
/// literal value when the rule fails.
#[derive(Clone)]
pub struct FieldRule {
    predicate: RulePredicate,
    message: String,
}

impl FieldRule {
    /// Create a rule from a predicate and a message template
    pub fn new<F>(predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value, &DocumentContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            message: message.into(),
        }
    }

    /// Run the predicate
    pub fn check(&self, value: &Value, document: &DocumentContext<'_>) -> bool {
        (self.predicate)(value, document)
    }

    /// Render the failure message for a value
    pub fn message_for(&self, value: &Value) -> String {
        render_template(&self.message, value)
    }

    /// The raw message template
    pub fn template(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("message", &self.message)
            .finish()
    }
}

/// Substitute `{VALUE}` in a message template with the literal value
fn render_template(template: &str, value: &Value) -> String {
    if template.contains("{VALUE}") {
        template.replace("{VALUE}", &value.to_string())
    } else {
        template.to_string()
    }
}

// ============================================================================
// Built-in Constraint Checks
// ============================================================================

fn check_constraints(def: &FieldDefinition, value: &Value) -> Option<FieldError> {
    let constraints: &Constraints = def.constraints();
    let path = def.name();

    if let (Some(min), Some(n)) = (constraints.min, value.as_f64()) {
        if n < min {
            return Some(FieldError::validator(
                path,
                format!(
                    "Path `{}` ({}) is less than minimum allowed value ({}).",
                    path, value, min
                ),
            ));
        }
    }

    if let (Some(max), Some(n)) = (constraints.max, value.as_f64()) {
        if n > max {
            return Some(FieldError::validator(
                path,
                format!(
                    "Path `{}` ({}) is more than maximum allowed value ({}).",
                    path, value, max
                ),
            ));
        }
    }

    if let (Some(min_len), Some(s)) = (constraints.min_length, value.as_str()) {
        if s.chars().count() < min_len {
            return Some(FieldError::validator(
                path,
                format!(
                    "Path `{}` (`{}`) is shorter than the minimum allowed length ({}).",
                    path, s, min_len
                ),
            ));
        }
    }

    if let (Some(max_len), Some(s)) = (constraints.max_length, value.as_str()) {
        if s.chars().count() > max_len {
            return Some(FieldError::validator(
                path,
                format!(
                    "Path `{}` (`{}`) is longer than the maximum allowed length ({}).",
                    path, s, max_len
                ),
            ));
        }
    }

    if let (Some(pattern), Some(s)) = (constraints.pattern.as_deref(), value.as_str()) {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(s) {
                    return Some(FieldError::validator(
                        path,
                        format!("Path `{}` is invalid ({}).", path, s),
                    ));
                }
            }
            Err(_) => {
                return Some(FieldError::validator(
                    path,
                    format!("Invalid regex pattern: {}", pattern),
                ));
            }
        }
    }

    if let Some(allowed) = constraints.one_of.as_deref() {
        if !allowed.contains(value) {
            return Some(FieldError::validator(
                path,
                format!("`{}` is not a valid enum value for path `{}`.", value, path),
            ));
        }
    }

    None
}

// ============================================================================
// Rule Execution
// ============================================================================

/// Run built-in constraints, then custom rules in declaration order.
/// The first failure wins.
pub fn run_rules(
    def: &FieldDefinition,
    value: &Value,
    document: &DocumentContext<'_>,
) -> Option<FieldError> {
    if let Some(error) = check_constraints(def, value) {
        return Some(error);
    }

    for rule in def.rules() {
        if !rule.check(value, document) {
            return Some(FieldError::validator(def.name(), rule.message_for(value)));
        }
    }

    None
}

// ============================================================================
// Full Document Validation
// ============================================================================

/// Coerce and validate a candidate document against a schema.
///
/// Every field is coerced first (collecting all cast/required failures), then
/// every cleanly coerced field is rule-checked with the full coerced document
/// as cross-field context. Returns the coerced value map on success, or the
/// per-field error aggregate.
pub fn validate_document(
    fields: &[FieldDefinition],
    raw: &FieldMap,
) -> ValidationResult<FieldMap> {
    let (coerced, mut errors) = coerce_document(fields, raw);

    let context = DocumentContext::new(&coerced);
    for def in fields {
        // Coercion error takes precedence and is the sole error for a field
        if errors.contains(def.name()) {
            continue;
        }
        let Some(value) = coerced.get(def.name()) else {
            continue;
        };
        if let Some(error) = run_rules(def, value, &context) {
            errors.insert(error);
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}
