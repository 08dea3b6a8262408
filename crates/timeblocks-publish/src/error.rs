//! Error types for publishing.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while resolving or running a publish channel.
#[derive(Debug, Error)]
pub enum PublishError {
    /// No publisher is registered under this name.
    #[error("unknown publish channel: {0}")]
    UnknownChannel(String),

    /// A channel definition is incomplete or contradictory.
    #[error("invalid channel {name}: {reason}")]
    InvalidChannel { name: String, reason: String },

    /// The adapter ran but reported failure.
    #[error("channel {channel} failed: {reason}")]
    Failed { channel: String, reason: String },

    /// The adapter did not finish in time.
    #[error("channel {channel} timed out after {after:?}")]
    Timeout { channel: String, after: Duration },

    /// I/O error (spawning a process, writing output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Shorthand for [`PublishError::Failed`].
    pub fn failed(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for publish operations.
pub type Result<T> = std::result::Result<T, PublishError>;
