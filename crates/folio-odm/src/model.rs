//! Model handle
//!
//! Binds a registered schema to a live connection and acts as the factory
//! for document instances. Persistence behavior stays out of the document
//! data type itself; the handle owns the schema/connection pair and the
//! instance borrows it.

use crate::connection::ConnectionManager;
use crate::document::DocumentInstance;
use crate::schema::{Schema, SchemaRegistry};
use crate::storage::DocumentId;
use folio_common::{FolioError, Result};
use folio_validation::FieldMap;
use std::sync::Arc;

/// A schema bound to a connection
#[derive(Debug)]
pub struct ModelHandle {
    schema: Arc<Schema>,
    connection: Arc<ConnectionManager>,
}

impl ModelHandle {
    /// Bind a registered kind to a connection.
    ///
    /// Fails with `UnknownKind` when the schema was never registered and
    /// with `NotConnected` unless the connection is currently established.
    pub fn bind(
        registry: &SchemaRegistry,
        kind: &str,
        connection: Arc<ConnectionManager>,
    ) -> Result<Self> {
        let schema = registry.lookup(kind)?;
        if !connection.is_connected() {
            return Err(FolioError::NotConnected);
        }
        Ok(Self { schema, connection })
    }

    /// The bound document kind
    pub fn kind(&self) -> &str {
        self.schema.kind()
    }

    /// The bound schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Create a fresh document instance.
    ///
    /// Fields with defaults are seeded into the raw value map; nothing is
    /// coerced until `save`.
    pub fn create(&self) -> DocumentInstance<'_> {
        let mut raw = FieldMap::new();
        for def in self.schema.fields() {
            if let Some(value) = def.produce_default() {
                raw.insert(def.name().to_string(), value);
            }
        }
        DocumentInstance::new(self, raw)
    }

    /// Materialize a persisted document by identity
    pub async fn find(&self, id: &DocumentId) -> Result<Option<DocumentInstance<'_>>> {
        let fields = self
            .connection
            .run_guarded(self.connection.hook().lookup(self.kind(), id))
            .await?;
        Ok(fields.map(|fields| DocumentInstance::persisted(self, id.clone(), fields)))
    }
}
