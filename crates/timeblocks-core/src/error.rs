//! Error types for Timeblocks Core.

use thiserror::Error;

/// Errors from parsing digests, algorithm names and data lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown hashing algorithm: {0:?}")]
    UnknownAlgorithm(String),

    #[error("invalid digest: {0:?}")]
    InvalidDigest(String),

    #[error("malformed data line: {0}")]
    MalformedDataLine(String),

    #[error("chain pointer mismatch: expected {expected}, found {found}")]
    BrokenLink { expected: String, found: String },
}

impl CoreError {
    /// Attach the log line number at which this error was detected.
    pub fn at_line(self, line: usize) -> ReplayError {
        match self {
            CoreError::UnknownAlgorithm(name) => ReplayError::UnknownAlgorithm { line, name },
            CoreError::InvalidDigest(text) => ReplayError::MalformedMarker { line, text },
            CoreError::MalformedDataLine(reason) => ReplayError::MalformedDataLine { line, reason },
            CoreError::BrokenLink { expected, found } => ReplayError::BrokenLink {
                line,
                expected,
                found,
            },
        }
    }
}

/// Errors raised while replaying a log.
///
/// Line numbers are 1-based. Every variant except [`ReplayError::UnsupportedSchema`]
/// means the log cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("line {line}: root mismatch: recorded {recorded}, computed {computed}")]
    RootMismatch {
        line: usize,
        recorded: String,
        computed: String,
    },

    #[error("line {line}: chain pointer mismatch: expected {expected}, found {found}")]
    BrokenLink {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("line {line}: data line is not followed by its #root commitment")]
    MissingRoot { line: usize },

    #[error("line {line}: #root without a preceding data line")]
    OrphanRoot { line: usize },

    #[error("line {line}: malformed data line: {reason}")]
    MalformedDataLine { line: usize, reason: String },

    #[error("line {line}: malformed marker: {text:?}")]
    MalformedMarker { line: usize, text: String },

    #[error("line {line}: schema version went backwards from v{previous} to v{found}")]
    SchemaRegression {
        line: usize,
        previous: u32,
        found: u32,
    },

    #[error("line {line}: unknown hashing algorithm {name:?}")]
    UnknownAlgorithm { line: usize, name: String },

    #[error("line {line}: log schema v{found} is newer than supported v{supported}")]
    UnsupportedSchema {
        line: usize,
        found: u32,
        supported: u32,
    },
}

impl ReplayError {
    /// The 1-based log line that triggered the error.
    pub fn line(&self) -> usize {
        match self {
            ReplayError::RootMismatch { line, .. }
            | ReplayError::BrokenLink { line, .. }
            | ReplayError::MissingRoot { line }
            | ReplayError::OrphanRoot { line }
            | ReplayError::MalformedDataLine { line, .. }
            | ReplayError::MalformedMarker { line, .. }
            | ReplayError::SchemaRegression { line, .. }
            | ReplayError::UnknownAlgorithm { line, .. }
            | ReplayError::UnsupportedSchema { line, .. } => *line,
        }
    }

    /// Whether the log content itself is corrupt or tampered.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, ReplayError::UnsupportedSchema { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_line_keeps_payload() {
        let err = CoreError::BrokenLink {
            expected: "aa".into(),
            found: "bb".into(),
        }
        .at_line(7);
        assert_eq!(err.line(), 7);
        assert!(matches!(err, ReplayError::BrokenLink { ref expected, .. } if expected == "aa"));
    }

    #[test]
    fn test_unsupported_schema_is_not_corruption() {
        let err = ReplayError::UnsupportedSchema {
            line: 1,
            found: 9,
            supported: 1,
        };
        assert!(!err.is_corruption());
        assert!(ReplayError::OrphanRoot { line: 2 }.is_corruption());
    }
}
