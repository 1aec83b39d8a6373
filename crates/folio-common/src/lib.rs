//! Shared error taxonomy for the Folio workspace

pub mod error;

pub use error::{FolioError, Result};
