//! Field definitions
//!
//! A schema is an ordered list of [`FieldDefinition`]s. Definitions are built
//! once, registered, and read-only afterwards.

use crate::rules::{DocumentContext, FieldRule};
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Field Type Tag
// ============================================================================

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string; every value converts to it
    String,
    /// Integer or float
    Number,
    /// Boolean
    Boolean,
    /// UTC timestamp
    Timestamp,
}

impl FieldType {
    /// Display name used in cast error messages
    pub fn cast_target(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Timestamp => "Timestamp",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

// ============================================================================
// Built-in Constraints
// ============================================================================

/// Built-in constraints, checked after coercion and before custom rules.
///
/// Numeric bounds apply to number fields; length, pattern, and enumeration
/// apply to string fields. The regex pattern is kept as source text and
/// compiled at check time.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Minimum numeric value (inclusive)
    pub min: Option<f64>,
    /// Maximum numeric value (inclusive)
    pub max: Option<f64>,
    /// Minimum string length (in characters, not bytes)
    pub min_length: Option<usize>,
    /// Maximum string length (in characters, not bytes)
    pub max_length: Option<usize>,
    /// Regex the string must match
    pub pattern: Option<String>,
    /// Enumerated set of allowed values
    pub one_of: Option<Vec<Value>>,
}

impl Constraints {
    /// Check if no constraint is set
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.one_of.is_none()
    }
}

// ============================================================================
// Field Definition
// ============================================================================

/// Default-value producer invoked when a field is absent
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Definition of a single field: declared type, requiredness, default
/// producer, built-in constraints, and custom rules in declaration order.
#[derive(Clone)]
pub struct FieldDefinition {
    name: String,
    field_type: FieldType,
    required: bool,
    default: Option<DefaultFn>,
    constraints: Constraints,
    rules: Vec<FieldRule>,
}

impl FieldDefinition {
    /// Create a new optional field with no default and no rules
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            constraints: Constraints::default(),
            rules: Vec::new(),
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a constant default value
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default = Some(Arc::new(move || value.clone()));
        self
    }

    /// Set a default-value producer (invoked on every save that needs it)
    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(producer));
        self
    }

    /// Set the inclusive numeric minimum
    pub fn min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    /// Set the inclusive numeric maximum
    pub fn max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    /// Set the minimum string length
    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    /// Set the maximum string length
    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    /// Require the string to match a regex
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// Restrict the value to an enumerated set
    pub fn one_of(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.constraints.one_of = Some(values.into_iter().collect());
        self
    }

    /// Add a custom rule: a predicate over (value, document) plus a message
    /// template. `{VALUE}` in the template is replaced with the literal
    /// value. Rules run in declaration order; the first failure wins.
    pub fn validate<F>(mut self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value, &DocumentContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.rules.push(FieldRule::new(predicate, message));
        self
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Whether the field is required
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the field has a default producer
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Run the default producer, if any
    pub fn produce_default(&self) -> Option<Value> {
        self.default.as_ref().map(|f| f())
    }

    /// Built-in constraints
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Custom rules in declaration order
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("has_default", &self.default.is_some())
            .field("rules", &self.rules.len())
            .finish()
    }
}
