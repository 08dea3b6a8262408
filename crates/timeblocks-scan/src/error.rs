//! Error types for tree scanning.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal scan errors. Per-file problems are [`ScanWarning`]s instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// An ignore rule could not be compiled.
    #[error("invalid ignore rule {rule:?}: {reason}")]
    InvalidRule { rule: String, reason: String },

    /// The tree root does not exist or is not a directory.
    #[error("scan root {} is not a directory", .0.display())]
    RootMissing(PathBuf),

    /// The scan was cancelled before it finished.
    #[error("scan cancelled")]
    Cancelled,
}

/// A file or directory that could not be read. The scan continues without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    /// Path relative to the scan root.
    pub path: PathBuf,
    /// What went wrong.
    pub reason: String,
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Result type for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;
