//! Storage hook: the persistence seam
//!
//! The client performs no wire I/O of its own. Every store operation is
//! delegated to an injected [`StorageHook`], and the client depends only on
//! this narrow contract.

use crate::connection::ConnectOptions;
use async_trait::async_trait;
use folio_common::Result;
use folio_validation::FieldMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// Document Identity
// ============================================================================

/// Opaque identity assigned by the storage hook on first persist
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an identity from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Storage Hook Trait
// ============================================================================

/// External collaborator interface for actual persistence.
///
/// `connect`/`disconnect` are establishment hooks driven only by the
/// connection manager; backends with no handshake keep the no-op defaults.
/// `persist` with an existing identity overwrites that document
/// (last-write-wins); with `None` it allocates a fresh identity.
#[async_trait]
pub trait StorageHook: Send + Sync {
    /// Establishment handshake, driven by `ConnectionManager::open`
    async fn connect(&self, _address: &str, _options: &ConnectOptions) -> Result<()> {
        Ok(())
    }

    /// Teardown handshake, driven by `ConnectionManager::close`
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    /// Write a coerced document, returning its identity
    async fn persist(
        &self,
        kind: &str,
        id: Option<&DocumentId>,
        fields: &FieldMap,
    ) -> Result<DocumentId>;

    /// Delete a document by identity (idempotent)
    async fn delete(&self, kind: &str, id: &DocumentId) -> Result<()>;

    /// Fetch a document's coerced fields by identity
    async fn lookup(&self, kind: &str, id: &DocumentId) -> Result<Option<FieldMap>>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory storage hook, used by tests and examples.
///
/// Tracks connect attempts and supports an artificial connect delay so
/// connection races can be exercised deterministically.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<(String, DocumentId), FieldMap>>,
    next_id: AtomicU64,
    connect_calls: AtomicU64,
    connect_delay: Option<Duration>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose `connect` sleeps before succeeding
    pub fn with_connect_delay(delay: Duration) -> Self {
        Self {
            connect_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Number of `connect` attempts observed
    pub fn connect_calls(&self) -> u64 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Number of documents currently stored under a kind
    pub async fn count(&self, kind: &str) -> usize {
        self.documents
            .lock()
            .await
            .keys()
            .filter(|(k, _)| k == kind)
            .count()
    }
}

#[async_trait]
impl StorageHook for MemoryStore {
    async fn connect(&self, _address: &str, _options: &ConnectOptions) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn persist(
        &self,
        kind: &str,
        id: Option<&DocumentId>,
        fields: &FieldMap,
    ) -> Result<DocumentId> {
        let id = match id {
            Some(id) => id.clone(),
            None => DocumentId::new(format!(
                "doc-{}",
                self.next_id.fetch_add(1, Ordering::SeqCst) + 1
            )),
        };
        self.documents
            .lock()
            .await
            .insert((kind.to_string(), id.clone()), fields.clone());
        Ok(id)
    }

    async fn delete(&self, kind: &str, id: &DocumentId) -> Result<()> {
        self.documents
            .lock()
            .await
            .remove(&(kind.to_string(), id.clone()));
        Ok(())
    }

    async fn lookup(&self, kind: &str, id: &DocumentId) -> Result<Option<FieldMap>> {
        Ok(self
            .documents
            .lock()
            .await
            .get(&(kind.to_string(), id.clone()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_validation::Value;

    fn fields(entries: &[(&str, Value)]) -> FieldMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_persist_allocates_distinct_ids() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let doc = fields(&[("a", Value::Int(1))]);

            let first = store.persist("things", None, &doc).await.unwrap();
            let second = store.persist("things", None, &doc).await.unwrap();

            assert_ne!(first, second);
            assert_eq!(store.count("things").await, 2);
        });
    }

    #[test]
    fn test_persist_with_id_overwrites() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let id = store
                .persist("things", None, &fields(&[("a", Value::Int(1))]))
                .await
                .unwrap();

            let returned = store
                .persist("things", Some(&id), &fields(&[("a", Value::Int(2))]))
                .await
                .unwrap();

            assert_eq!(returned, id);
            assert_eq!(store.count("things").await, 1);
            let stored = store.lookup("things", &id).await.unwrap().unwrap();
            assert_eq!(stored.get("a"), Some(&Value::Int(2)));
        });
    }

    #[test]
    fn test_delete_is_idempotent() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let id = store
                .persist("things", None, &fields(&[("a", Value::Int(1))]))
                .await
                .unwrap();

            store.delete("things", &id).await.unwrap();
            store.delete("things", &id).await.unwrap();
            assert!(store.lookup("things", &id).await.unwrap().is_none());
        });
    }

    #[test]
    fn test_kinds_are_isolated() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let id = store
                .persist("left", None, &fields(&[("a", Value::Int(1))]))
                .await
                .unwrap();

            assert!(store.lookup("right", &id).await.unwrap().is_none());
        });
    }

    #[test]
    fn test_document_id_display() {
        let id = DocumentId::new("doc-7");
        assert_eq!(id.to_string(), "doc-7");
        assert_eq!(id.as_str(), "doc-7");
    }
}
