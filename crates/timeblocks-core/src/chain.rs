//! Chain state: what a replayed log tells the next writer.
//!
//! A [`ChainState`] is rebuilt from scratch on every invocation. It is never
//! cached between runs, so the log file stays the single source of truth.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::crypto::HashAlgorithm;
use crate::entry::SCHEMA_VERSION;
use crate::types::Digest;

/// Which tokens of a replayed data line count as "already committed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryMode {
    /// Only the file digests that follow the timestamp and chain pointers.
    #[default]
    FileDigests,

    /// Every whitespace token, including the timestamp and chain pointers.
    ///
    /// Matches logs whose writers deduplicated against the full token set.
    AllTokens,
}

/// The chain pointers a data line must carry.
///
/// `proper_root` is only kept when it differs from `last_root`; that is the
/// case right after the log switched away from the configured algorithm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainPointers {
    pub proper_root: Option<Digest>,
    pub last_root: Option<Digest>,
}

impl ChainPointers {
    /// Normalize a pair of roots into the pointers a data line carries.
    pub fn new(proper_root: Option<Digest>, last_root: Option<Digest>) -> Self {
        let proper_root = proper_root.filter(|proper| last_root.as_ref() != Some(proper));
        Self {
            proper_root,
            last_root,
        }
    }

    /// Pointers in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = &Digest> {
        self.proper_root.iter().chain(self.last_root.iter())
    }

    /// Whether there is nothing to point back to (first entry).
    pub fn is_empty(&self) -> bool {
        self.proper_root.is_none() && self.last_root.is_none()
    }
}

/// State of a log after a successful replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    /// Digests recorded under the configured algorithm.
    pub digest_set: HashSet<Digest>,

    /// The most recent commitment, under whatever algorithm wrote it.
    pub last_root: Option<Digest>,

    /// The most recent commitment computed under the configured algorithm.
    pub last_proper_root: Option<Digest>,

    /// Schema version declared by the log (current version if undeclared).
    pub schema_version: u32,

    /// Algorithm in effect at the end of the log.
    pub active_algorithm: HashAlgorithm,

    /// Number of verified entries.
    pub entry_count: usize,
}

impl ChainState {
    /// State of an empty log.
    pub fn new() -> Self {
        Self {
            digest_set: HashSet::new(),
            last_root: None,
            last_proper_root: None,
            schema_version: SCHEMA_VERSION,
            active_algorithm: HashAlgorithm::default(),
            entry_count: 0,
        }
    }

    /// Whether the log has no entries yet.
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Whether this digest has not been committed under the configured algorithm.
    pub fn is_new(&self, digest: &Digest) -> bool {
        !self.digest_set.contains(digest)
    }

    /// Pointers the next data line must carry.
    pub fn pointers(&self) -> ChainPointers {
        ChainPointers::new(self.last_proper_root.clone(), self.last_root.clone())
    }

    /// Whether a block written with `algorithm` needs a `#hashing` marker first.
    pub fn needs_hashing_marker(&self, algorithm: HashAlgorithm) -> bool {
        self.active_algorithm != algorithm
    }

    /// Whether the log declares an older schema than this writer emits.
    pub fn needs_version_marker(&self) -> bool {
        self.schema_version < SCHEMA_VERSION
    }
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(byte: u8) -> Digest {
        Digest::from_bytes(&[byte; 32])
    }

    #[test]
    fn test_pointers_drop_equal_proper_root() {
        let p = ChainPointers::new(Some(digest(1)), Some(digest(1)));
        assert_eq!(p.proper_root, None);
        assert_eq!(p.last_root, Some(digest(1)));
        assert_eq!(p.iter().count(), 1);
    }

    #[test]
    fn test_pointers_keep_distinct_proper_root() {
        let p = ChainPointers::new(Some(digest(1)), Some(digest(2)));
        let order: Vec<_> = p.iter().cloned().collect();
        assert_eq!(order, vec![digest(1), digest(2)]);
    }

    #[test]
    fn test_empty_state() {
        let state = ChainState::new();
        assert!(state.is_empty());
        assert!(state.pointers().is_empty());
        assert!(state.is_new(&digest(9)));
        assert!(!state.needs_version_marker());
        assert!(!state.needs_hashing_marker(HashAlgorithm::Sha256));
        assert!(state.needs_hashing_marker(HashAlgorithm::Sha384));
    }

    #[test]
    fn test_older_schema_needs_marker() {
        let state = ChainState {
            schema_version: 0,
            ..ChainState::new()
        };
        assert!(state.needs_version_marker());
    }
}
