//! Watcher error types.

use thiserror::Error;

/// Errors raised while delivering change events.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// HTTP request to the event service failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Event sink refused the event.
    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;
