//! Error types for log persistence.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while reading, locking or appending to a log.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another writer held the lock for longer than we were willing to wait.
    #[error("timed out after {waited:?} waiting for writer lock {}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    /// The log contains bytes that are not UTF-8.
    #[error("log is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A blocking file task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
