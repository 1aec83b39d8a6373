//! Folio ODM
//!
//! A schema-validated document client: schemas registered at runtime, lazy
//! type coercion and declarative validation at save time, and an injected
//! storage hook for actual persistence.
//!
//! # Overview
//!
//! - [`SchemaRegistry`] holds named field definitions per document kind
//! - [`ConnectionManager`] owns the connection state machine and gates
//!   every store operation on readiness
//! - [`ModelHandle`] binds a schema to a live connection and creates
//!   [`DocumentInstance`]s
//! - [`StorageHook`] is the narrow persistence contract; [`MemoryStore`]
//!   implements it in memory for tests
//!
//! # Example
//!
//! ```rust
//! use folio_odm::{
//!     ConnectOptions, ConnectionManager, FieldDefinition, FieldType, MemoryStore,
//!     ModelHandle, SchemaRegistry,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> folio_odm::Result<()> {
//! let mut registry = SchemaRegistry::new();
//! registry.register(
//!     "article",
//!     vec![
//!         FieldDefinition::new("title", FieldType::String).required(),
//!         FieldDefinition::new("views", FieldType::Number).default_value(0i64),
//!     ],
//! )?;
//!
//! let conn = Arc::new(ConnectionManager::new(Arc::new(MemoryStore::new())));
//! conn.open("memory://local", ConnectOptions::default()).await?;
//!
//! let articles = ModelHandle::bind(&registry, "article", conn)?;
//! let mut doc = articles.create();
//! doc.set("title", "hello");
//! doc.save().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod document;
pub mod model;
pub mod schema;
pub mod storage;

pub use connection::{ConnectOptions, ConnectionManager, ConnectionState, SubscriptionId};
pub use document::DocumentInstance;
pub use folio_common::{FolioError, Result};
pub use model::ModelHandle;
pub use schema::{Schema, SchemaRegistry};
pub use storage::{DocumentId, MemoryStore, StorageHook};

// Validation surface used when declaring schemas
pub use folio_validation::{
    DocumentContext, FieldDefinition, FieldError, FieldErrorKind, FieldMap, FieldType,
    ValidationErrors, Value,
};
