//! Schema registry
//!
//! Maps document-kind names to their field definitions. Registration is
//! ordered and last-write-wins per kind; a registered schema is read-only.

use folio_common::{FolioError, Result};
use folio_validation::FieldDefinition;
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// Schema
// ============================================================================

/// An ordered, immutable set of field definitions for one document kind
#[derive(Debug)]
pub struct Schema {
    kind: String,
    fields: Vec<FieldDefinition>,
}

impl Schema {
    fn new(kind: String, fields: Vec<FieldDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &fields {
            if !seen.insert(def.name()) {
                return Err(FolioError::DuplicateField {
                    kind,
                    field: def.name().to_string(),
                });
            }
        }
        Ok(Self { kind, fields })
    }

    /// The document kind this schema describes
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Field definitions in declaration order
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Look up a field definition by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|def| def.name() == name)
    }
}

// ============================================================================
// Schema Registry
// ============================================================================

/// Registration-ordered mapping from kind name to schema
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: Vec<(String, Arc<Schema>)>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under a kind.
    ///
    /// Fails with `DuplicateField` when two fields share a name.
    /// Re-registering an existing kind replaces the prior definition
    /// (last-write-wins); definitions never stack.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Result<()> {
        let kind = kind.into();
        let schema = Arc::new(Schema::new(kind.clone(), fields)?);

        match self.entries.iter_mut().find(|(name, _)| *name == kind) {
            Some(entry) => entry.1 = schema,
            None => self.entries.push((kind, schema)),
        }
        Ok(())
    }

    /// Look up a registered schema
    pub fn lookup(&self, kind: &str) -> Result<Arc<Schema>> {
        self.entries
            .iter()
            .find(|(name, _)| name == kind)
            .map(|(_, schema)| Arc::clone(schema))
            .ok_or_else(|| FolioError::UnknownKind(kind.to_string()))
    }

    /// Whether a kind is registered
    pub fn contains(&self, kind: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == kind)
    }

    /// Registered kind names, in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_validation::FieldType;

    fn title_field() -> FieldDefinition {
        FieldDefinition::new("title", FieldType::String)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SchemaRegistry::new();
        registry.register("article", vec![title_field()]).unwrap();

        let schema = registry.lookup("article").unwrap();
        assert_eq!(schema.kind(), "article");
        assert_eq!(schema.fields().len(), 1);
        assert!(schema.field("title").is_some());
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_lookup_unknown_kind_fails() {
        let registry = SchemaRegistry::new();
        let err = registry.lookup("ghost").unwrap_err();
        assert!(matches!(err, FolioError::UnknownKind(kind) if kind == "ghost"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .register("article", vec![title_field(), title_field()])
            .unwrap_err();

        assert!(matches!(
            err,
            FolioError::DuplicateField { kind, field }
                if kind == "article" && field == "title"
        ));
        assert!(!registry.contains("article"));
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = SchemaRegistry::new();
        registry.register("article", vec![title_field()]).unwrap();
        registry
            .register(
                "article",
                vec![
                    FieldDefinition::new("headline", FieldType::String),
                    FieldDefinition::new("views", FieldType::Number),
                ],
            )
            .unwrap();

        let schema = registry.lookup("article").unwrap();
        assert_eq!(schema.fields().len(), 2);
        assert!(schema.field("title").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_kinds_in_registration_order() {
        let mut registry = SchemaRegistry::new();
        registry.register("zebra", vec![title_field()]).unwrap();
        registry.register("apple", vec![title_field()]).unwrap();

        let kinds: Vec<&str> = registry.kinds().collect();
        assert_eq!(kinds, vec!["zebra", "apple"]);
    }

    #[test]
    fn test_field_order_is_declaration_order() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                "event",
                vec![
                    FieldDefinition::new("end", FieldType::Timestamp),
                    FieldDefinition::new("start", FieldType::Timestamp),
                ],
            )
            .unwrap();

        let schema = registry.lookup("event").unwrap();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["end", "start"]);
    }
}
