//! Storage error types.

use thiserror::Error;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from rusqlite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (e.g., creating directories).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A stored row no longer forms a valid office hour.
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for officehours_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => officehours_core::Error::NotFound(id),
            other => officehours_core::Error::UpstreamUnavailable(other.to_string()),
        }
    }
}
