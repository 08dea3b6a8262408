//! Error and warning types for the engine.

use std::path::PathBuf;

use thiserror::Error;
use timeblocks_core::ReplayError;
use timeblocks_scan::{ScanError, ScanWarning};
use timeblocks_store::StoreError;

/// Classification shared by fatal errors and warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A commitment or chain pointer does not match. Fatal.
    ChainCorruption,
    /// The log was written by a newer schema. Fatal.
    UnsupportedSchema,
    /// A file could not be read. Recoverable.
    FileUnreadable,
    /// A publish adapter failed or timed out. Recoverable.
    AdapterFailure,
    /// Unknown algorithm or channel, or an unreadable settings file.
    ConfigurationError,
    /// Log I/O, locking, or a background task failure.
    Io,
}

/// Fatal errors. Every one of them aborts before the log is touched.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The existing log failed verification.
    #[error("chain corruption: {0}")]
    ChainCorruption(ReplayError),

    /// The existing log declares a schema this engine does not know.
    #[error("unsupported log schema: {0}")]
    UnsupportedSchema(ReplayError),

    /// Invalid settings or configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Log storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Tree scan error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl EngineError {
    /// Where this error sits in the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ChainCorruption(_) => ErrorKind::ChainCorruption,
            EngineError::UnsupportedSchema(_) => ErrorKind::UnsupportedSchema,
            EngineError::Configuration(_) => ErrorKind::ConfigurationError,
            EngineError::Scan(ScanError::InvalidRule { .. }) => ErrorKind::ConfigurationError,
            EngineError::Store(_) | EngineError::Scan(_) | EngineError::Task(_) => ErrorKind::Io,
        }
    }

    /// The replay error behind a corruption or schema failure.
    pub fn replay_error(&self) -> Option<&ReplayError> {
        match self {
            EngineError::ChainCorruption(e) | EngineError::UnsupportedSchema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReplayError> for EngineError {
    fn from(err: ReplayError) -> Self {
        if err.is_corruption() {
            EngineError::ChainCorruption(err)
        } else {
            EngineError::UnsupportedSchema(err)
        }
    }
}

/// Recoverable events, returned alongside a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A file was skipped because it could not be read.
    FileUnreadable { path: PathBuf, reason: String },

    /// A publish channel failed or timed out.
    AdapterFailure { channel: String, reason: String },

    /// A configured channel name has no registered publisher.
    UnknownChannel { channel: String },
}

impl Warning {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Warning::FileUnreadable { .. } => ErrorKind::FileUnreadable,
            Warning::AdapterFailure { .. } => ErrorKind::AdapterFailure,
            Warning::UnknownChannel { .. } => ErrorKind::ConfigurationError,
        }
    }
}

impl From<ScanWarning> for Warning {
    fn from(w: ScanWarning) -> Self {
        Warning::FileUnreadable {
            path: w.path,
            reason: w.reason,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::FileUnreadable { path, reason } => {
                write!(f, "skipped unreadable file {}: {}", path.display(), reason)
            }
            Warning::AdapterFailure { channel, reason } => {
                write!(f, "publish channel {channel} failed: {reason}")
            }
            Warning::UnknownChannel { channel } => write!(f, "unknown publish channel {channel}"),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_errors_are_classified() {
        let corrupt: EngineError = ReplayError::OrphanRoot { line: 3 }.into();
        assert_eq!(corrupt.kind(), ErrorKind::ChainCorruption);
        assert_eq!(corrupt.replay_error().map(|e| e.line()), Some(3));

        let newer: EngineError = ReplayError::UnsupportedSchema {
            line: 1,
            found: 2,
            supported: 1,
        }
        .into();
        assert_eq!(newer.kind(), ErrorKind::UnsupportedSchema);
    }

    #[test]
    fn test_warning_kinds() {
        let w: Warning = ScanWarning {
            path: "a".into(),
            reason: "denied".into(),
        }
        .into();
        assert_eq!(w.kind(), ErrorKind::FileUnreadable);
        assert_eq!(w.to_string(), "skipped unreadable file a: denied");
        assert_eq!(
            Warning::UnknownChannel { channel: "iota".into() }.kind(),
            ErrorKind::ConfigurationError
        );
    }
}
