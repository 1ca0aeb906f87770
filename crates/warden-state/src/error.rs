//! Error types for warden-state

use thiserror::Error;

/// Errors that can occur in the audit/persistence layer.
///
/// A missing state snapshot is not an error — `load_*` returns `Ok(None)`.
/// These variants cover genuine backend faults, which the kernel treats as
/// collaborator-contract violations and propagates to the caller.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend connection or query error
    #[error("Backend operation failed: {0}")]
    Backend(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A referenced record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;
