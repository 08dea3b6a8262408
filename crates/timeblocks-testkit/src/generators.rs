//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use proptest::prelude::*;

use timeblocks_core::{Digest, HashAlgorithm};

/// Any supported algorithm.
pub fn algorithm() -> impl Strategy<Value = HashAlgorithm> {
    prop::sample::select(HashAlgorithm::ALL.to_vec())
}

/// A digest of random content under `algorithm`.
pub fn digest(algorithm: HashAlgorithm) -> impl Strategy<Value = Digest> {
    prop::collection::vec(any::<u8>(), 0..64).prop_map(move |bytes| algorithm.hash(&bytes))
}

/// A plausible Unix timestamp in seconds.
pub fn timestamp() -> impl Strategy<Value = i64> {
    1_000_000_000i64..4_000_000_000i64
}

/// File content of at most `max_len` bytes.
pub fn contents(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// A tree-relative file name, optionally one directory deep.
pub fn file_name() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", proptest::option::of("[a-z]{1,6}")).prop_map(|(file, dir)| match dir {
        Some(dir) => format!("{dir}/{file}.txt"),
        None => format!("{file}.txt"),
    })
}

/// A small file tree: relative path to content.
pub fn tree(max_files: usize) -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(file_name(), contents(256), 1..=max_files)
}

/// A sequence of trees, one per run.
pub fn runs(max_runs: usize, max_files: usize) -> impl Strategy<Value = Vec<BTreeMap<String, Vec<u8>>>> {
    prop::collection::vec(tree(max_files), 1..=max_runs)
}
