//! Log line grammar.
//!
//! A log is UTF-8 text. Lines starting with `#` are markers or comments,
//! blank lines are ignored, and everything else is a data line:
//!
//! ```text
//! <timestamp> [<proper-root>] [<last-root>] <digest>*
//! ```
//!
//! Serialization is canonical: single spaces, digests in lexicographic order.
//! Re-rendering a parsed line yields the same bytes, which is what the
//! commitment covers.

use serde::{Deserialize, Serialize};

use crate::chain::ChainPointers;
use crate::crypto::HashAlgorithm;
use crate::error::CoreError;
use crate::types::Digest;

/// Schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Prefix of the schema marker, followed by the version number.
pub const VERSION_MARKER: &str = "#timehashblock v";

/// Prefix of the algorithm marker, followed by the algorithm name.
pub const HASHING_MARKER: &str = "#hashing ";

/// Prefix of a commitment line, followed by the hex root.
pub const ROOT_MARKER: &str = "#root ";

/// A classified log line. Payloads are the text after the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLine<'a> {
    Blank,
    Version(&'a str),
    Hashing(&'a str),
    Root(&'a str),
    Comment(&'a str),
    Data(&'a str),
}

impl<'a> LogLine<'a> {
    /// Classify one line (without its newline).
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            LogLine::Blank
        } else if let Some(rest) = line.strip_prefix(VERSION_MARKER) {
            LogLine::Version(rest.trim())
        } else if let Some(rest) = line.strip_prefix(HASHING_MARKER) {
            LogLine::Hashing(rest.trim())
        } else if let Some(rest) = line.strip_prefix(ROOT_MARKER) {
            LogLine::Root(rest.trim())
        } else if let Some(rest) = line.strip_prefix('#') {
            LogLine::Comment(rest)
        } else {
            LogLine::Data(line)
        }
    }
}

/// Render a schema marker line.
pub fn version_marker(version: u32) -> String {
    format!("{VERSION_MARKER}{version}")
}

/// Render an algorithm marker line.
pub fn hashing_marker(algorithm: HashAlgorithm) -> String {
    format!("{HASHING_MARKER}{algorithm}")
}

/// Render a commitment line.
pub fn root_marker(root: &Digest) -> String {
    format!("{ROOT_MARKER}{root}")
}

/// The structured content of a data line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLine {
    /// Unix seconds at write time. Writer-claimed, untrusted.
    pub timestamp: i64,
    /// Last root under the writer's algorithm, when it differs from `last_root`.
    pub proper_root: Option<Digest>,
    /// The immediately preceding commitment.
    pub last_root: Option<Digest>,
    /// File digests committed by this entry, sorted.
    pub digests: Vec<Digest>,
}

impl DataLine {
    /// Assemble a data line. Digests are sorted and deduplicated.
    pub fn new(timestamp: i64, pointers: ChainPointers, digests: impl IntoIterator<Item = Digest>) -> Self {
        let mut digests: Vec<Digest> = digests.into_iter().collect();
        digests.sort();
        digests.dedup();
        Self {
            timestamp,
            proper_root: pointers.proper_root,
            last_root: pointers.last_root,
            digests,
        }
    }

    /// Canonical text: single-space separated tokens.
    pub fn render(&self) -> String {
        let mut tokens = Vec::with_capacity(3 + self.digests.len());
        tokens.push(self.timestamp.to_string());
        tokens.extend(self.proper_root.iter().map(|d| d.as_str().to_owned()));
        tokens.extend(self.last_root.iter().map(|d| d.as_str().to_owned()));
        tokens.extend(self.digests.iter().map(|d| d.as_str().to_owned()));
        tokens.join(" ")
    }

    /// Parse a data line written under `algorithm`, expecting `pointers`.
    ///
    /// The chain pointers are positional: after the timestamp the line must
    /// carry exactly the expected proper root (if any) and then the expected
    /// last root (if any). Every remaining token must be a digest of the
    /// algorithm's length.
    pub fn parse(
        text: &str,
        algorithm: HashAlgorithm,
        pointers: &ChainPointers,
    ) -> Result<Self, CoreError> {
        let mut tokens = text.split_whitespace();

        let timestamp = tokens
            .next()
            .ok_or_else(|| CoreError::MalformedDataLine("empty line".into()))?;
        let timestamp: i64 = timestamp
            .parse()
            .map_err(|_| CoreError::MalformedDataLine(format!("bad timestamp {timestamp:?}")))?;

        for expected in pointers.iter() {
            match tokens.next() {
                Some(found) if found == expected.as_str() => {}
                found => {
                    return Err(CoreError::BrokenLink {
                        expected: expected.to_string(),
                        found: found.unwrap_or("<end of line>").to_owned(),
                    })
                }
            }
        }

        let digests = tokens
            .map(|token| {
                if token.len() != algorithm.hex_len() {
                    return Err(CoreError::MalformedDataLine(format!(
                        "token {token:?} is not a {algorithm} digest"
                    )));
                }
                Digest::from_hex(token).map_err(|_| {
                    CoreError::MalformedDataLine(format!("token {token:?} is not lowercase hex"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            timestamp,
            proper_root: pointers.proper_root.clone(),
            last_root: pointers.last_root.clone(),
            digests,
        })
    }
}

/// A verified entry of a replayed log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based line number of the data line.
    pub line: usize,
    /// Algorithm the commitment was computed with.
    pub algorithm: HashAlgorithm,
    /// Parsed data line.
    pub data: DataLine,
    /// The verified commitment.
    pub root: Digest,
}
