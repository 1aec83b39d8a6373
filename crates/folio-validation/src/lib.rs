//! Folio Validation
//!
//! Standalone validation engine for the Folio document client: runtime
//! values, field definitions, type coercion, and declarative rule execution.
//!
//! The engine is deliberately schema-driven rather than derive-driven: a
//! field is described by data (type tag, default producer, constraints,
//! ordered custom rules), and validation walks that data. This keeps the
//! document layer free to build schemas at runtime.
//!
//! # Example
//!
//! ```rust
//! use folio_validation::{validate_document, FieldDefinition, FieldType, Value};
//! use std::collections::BTreeMap;
//!
//! let fields = vec![
//!     FieldDefinition::new("title", FieldType::String).required(),
//!     FieldDefinition::new("attendees", FieldType::Number).min(1.0),
//! ];
//!
//! let mut raw = BTreeMap::new();
//! raw.insert("title".to_string(), Value::from("kickoff"));
//! raw.insert("attendees".to_string(), Value::from("12"));
//!
//! let coerced = validate_document(&fields, &raw).unwrap();
//! assert_eq!(coerced.get("attendees"), Some(&Value::Int(12)));
//! ```

pub mod coerce;
pub mod errors;
pub mod fields;
pub mod rules;
pub mod types;

// Re-export commonly used types
pub use coerce::{coerce_document, coerce_field, FieldMap};
pub use errors::{FieldError, FieldErrorKind, ValidationErrors, ValidationResult};
pub use fields::{Constraints, DefaultFn, FieldDefinition, FieldType};
pub use rules::{run_rules, validate_document, DocumentContext, FieldRule, RulePredicate};
pub use types::{timestamp_from_millis, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
