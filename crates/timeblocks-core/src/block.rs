//! Block: the entry produced by one run.
//!
//! A block is immutable once built. The engine appends it to the log and then
//! hands the same value to every publisher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::chain::ChainState;
use crate::crypto::HashAlgorithm;
use crate::entry::DataLine;
use crate::types::Digest;

/// A finalized log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    root: Digest,
    data: String,
    timestamp: i64,
    hashed_files: Vec<Digest>,
    hashing: HashAlgorithm,
}

impl Block {
    /// The commitment: hash of [`Block::data`].
    pub fn root(&self) -> &Digest {
        &self.root
    }

    /// The serialized data line.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Unix seconds at build time.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Newly committed file digests, sorted.
    pub fn hashed_files(&self) -> &[Digest] {
        &self.hashed_files
    }

    /// Algorithm of the root and the file digests.
    pub fn hashing(&self) -> HashAlgorithm {
        self.hashing
    }

    /// Whether the block commits no new file digests (a forced heartbeat).
    pub fn is_heartbeat(&self) -> bool {
        self.hashed_files.is_empty()
    }
}

/// Builder for the next block of a chain.
#[derive(Debug, Clone)]
pub struct BlockBuilder<'a> {
    chain: &'a ChainState,
    algorithm: HashAlgorithm,
    timestamp: Option<i64>,
    digests: BTreeSet<Digest>,
}

impl<'a> BlockBuilder<'a> {
    /// Start a block that extends `chain`, hashed with `algorithm`.
    pub fn new(chain: &'a ChainState, algorithm: HashAlgorithm) -> Self {
        Self {
            chain,
            algorithm,
            timestamp: None,
            digests: BTreeSet::new(),
        }
    }

    /// Set the timestamp (defaults to now).
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add one file digest.
    pub fn add_digest(mut self, digest: Digest) -> Self {
        self.digests.insert(digest);
        self
    }

    /// Add file digests.
    pub fn digests(mut self, digests: impl IntoIterator<Item = Digest>) -> Self {
        self.digests.extend(digests);
        self
    }

    /// Serialize the data line and compute its root.
    pub fn build(self) -> Block {
        let timestamp = self.timestamp.unwrap_or_else(now_secs);
        let hashed_files: Vec<Digest> = self.digests.into_iter().collect();
        let line = DataLine::new(timestamp, self.chain.pointers(), hashed_files.iter().cloned());
        let data = line.render();
        let root = self.algorithm.hash(data.as_bytes());

        Block {
            root,
            data,
            timestamp,
            hashed_files,
            hashing: self.algorithm,
        }
    }
}

/// Build the block committing `new_digests` on top of `chain`.
pub fn build_block(
    new_digests: &BTreeSet<Digest>,
    chain: &ChainState,
    algorithm: HashAlgorithm,
    timestamp: i64,
) -> Block {
    BlockBuilder::new(chain, algorithm)
        .timestamp(timestamp)
        .digests(new_digests.iter().cloned())
        .build()
}

/// Current Unix time in seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
