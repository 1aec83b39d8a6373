//! Document instances
//!
//! A document instance is the mutable in-memory form of one record. Field
//! writes are stored raw and validated lazily at save time, so callers can
//! build instances incrementally without triggering premature errors.

use crate::model::ModelHandle;
use crate::storage::DocumentId;
use folio_common::{FolioError, Result};
use folio_validation::{validate_document, FieldMap, Value, ValidationErrors};
use tracing::debug;

/// One record bound to a model handle.
///
/// Holds the raw (as-set) values, the coerced values of the last successful
/// save, the per-field error map of the last failed save, and the persisted
/// identity when there is one. Dropping an instance has no persistence
/// side effect.
#[derive(Debug)]
pub struct DocumentInstance<'m> {
    model: &'m ModelHandle,
    raw: FieldMap,
    coerced: FieldMap,
    errors: ValidationErrors,
    id: Option<DocumentId>,
}

impl<'m> DocumentInstance<'m> {
    pub(crate) fn new(model: &'m ModelHandle, raw: FieldMap) -> Self {
        Self {
            model,
            raw,
            coerced: FieldMap::new(),
            errors: ValidationErrors::new(),
            id: None,
        }
    }

    pub(crate) fn persisted(model: &'m ModelHandle, id: DocumentId, fields: FieldMap) -> Self {
        Self {
            model,
            raw: fields.clone(),
            coerced: fields,
            errors: ValidationErrors::new(),
            id: Some(id),
        }
    }

    /// Set a field's raw value. No coercion happens until `save`.
    ///
    /// Names outside the schema are tolerated here and ignored at save
    /// time, since saving walks the schema's declaration order.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.raw.insert(name.into(), value.into());
    }

    /// Remove a field's raw value, restoring absent-field semantics
    pub fn unset(&mut self, name: &str) {
        self.raw.remove(name);
    }

    /// The raw value currently set for a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

    /// The coerced value stored by the last successful save
    pub fn coerced(&self, name: &str) -> Option<&Value> {
        self.coerced.get(name)
    }

    /// Per-field errors from the last failed save (empty after a success)
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// The persisted identity, if this instance has been saved
    pub fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    /// Whether the instance has been persisted
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Coerce, validate, and persist this document.
    ///
    /// Walks the schema in declaration order: every field is coerced, every
    /// cleanly coerced field is rule-checked with the full candidate
    /// document as cross-field context, and all failures are aggregated.
    /// On failure the instance's error map is replaced with the aggregate
    /// and nothing is persisted. On success the coerced values go through
    /// the storage hook, the identity is recorded, and the error map is
    /// cleared. Re-saving a persisted instance overwrites the same identity.
    pub async fn save(&mut self) -> Result<&DocumentId> {
        match validate_document(self.model.schema().fields(), &self.raw) {
            Ok(coerced) => {
                let connection = self.model.connection();
                let id = connection
                    .run_guarded(connection.hook().persist(
                        self.model.kind(),
                        self.id.as_ref(),
                        &coerced,
                    ))
                    .await?;
                debug!(kind = self.model.kind(), id = %id, "document persisted");

                self.coerced = coerced;
                self.errors = ValidationErrors::new();
                Ok(&*self.id.insert(id))
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(FolioError::Validation(errors))
            }
        }
    }

    /// Delete this document from the store.
    ///
    /// A no-op `Ok` for instances that were never persisted. On success the
    /// identity is cleared; a later `save` persists under a fresh one.
    pub async fn remove(&mut self) -> Result<()> {
        let Some(id) = self.id.clone() else {
            return Ok(());
        };

        let connection = self.model.connection();
        connection
            .run_guarded(connection.hook().delete(self.model.kind(), &id))
            .await?;
        debug!(kind = self.model.kind(), id = %id, "document removed");

        self.id = None;
        Ok(())
    }

    /// Refresh raw and coerced values from the store.
    ///
    /// A no-op for never-persisted instances. Fails with a storage error
    /// when the identity no longer exists.
    pub async fn reload(&mut self) -> Result<()> {
        let Some(id) = self.id.clone() else {
            return Ok(());
        };

        let connection = self.model.connection();
        let fields = connection
            .run_guarded(connection.hook().lookup(self.model.kind(), &id))
            .await?;

        match fields {
            Some(fields) => {
                self.raw = fields.clone();
                self.coerced = fields;
                self.errors = ValidationErrors::new();
                Ok(())
            }
            None => Err(FolioError::Storage(format!(
                "document {} not found for kind '{}'",
                id,
                self.model.kind()
            ))),
        }
    }
}
