//! Error types for Folio

use folio_validation::ValidationErrors;
use thiserror::Error;

/// Result type alias for Folio operations
pub type Result<T> = std::result::Result<T, FolioError>;

/// Unified error type for all Folio operations
#[derive(Error, Debug, Clone)]
pub enum FolioError {
    /// Two fields share a name within one schema registration
    #[error("Duplicate field `{field}` in schema for kind '{kind}'")]
    DuplicateField { kind: String, field: String },

    /// The document kind was never registered
    #[error("Unknown document kind: {0}")]
    UnknownKind(String),

    /// A save attempt failed validation; carries the per-field error map
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Connection establishment or teardown failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// An operation required an established connection
    #[error("Connection is not established")]
    NotConnected,

    /// The connection began closing while the operation was in flight
    #[error("Connection closed")]
    ConnectionClosed,

    /// The storage hook reported a failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invariant violation inside the client itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FolioError {
    /// Returns true if the caller can retry with corrected input.
    ///
    /// Field-level failures are recoverable; registry and connection errors
    /// are not (the caller must fix the schema or re-open the connection).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FolioError::Validation(_))
    }

    /// Returns true for connection-level failures
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            FolioError::Connection(_) | FolioError::NotConnected | FolioError::ConnectionClosed
        )
    }

    /// The per-field error map, when this is a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            FolioError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for FolioError {
    fn from(errors: ValidationErrors) -> Self {
        FolioError::Validation(errors)
    }
}
