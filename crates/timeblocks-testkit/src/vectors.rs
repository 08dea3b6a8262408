//! Log fixtures: known-good logs built the way the engine writes them.

use timeblocks::entry_lines;
use timeblocks_core::{BlockBuilder, ChainReplayer, Digest, HashAlgorithm};

/// One entry to write: algorithm, timestamp, file contents.
#[derive(Debug, Clone)]
pub struct EntrySpec {
    pub algorithm: HashAlgorithm,
    pub timestamp: i64,
    pub contents: Vec<Vec<u8>>,
}

impl EntrySpec {
    pub fn new(algorithm: HashAlgorithm, timestamp: i64, contents: &[&[u8]]) -> Self {
        Self {
            algorithm,
            timestamp,
            contents: contents.iter().map(|c| c.to_vec()).collect(),
        }
    }

    fn digests(&self) -> Vec<Digest> {
        self.contents.iter().map(|c| self.algorithm.hash(c)).collect()
    }
}

/// Append one entry to `log` exactly as the engine would.
pub fn append_entry(log: &mut String, entry: &EntrySpec) {
    let chain = ChainReplayer::new(entry.algorithm)
        .replay(log)
        .expect("fixture log must replay")
        .state;
    let block = BlockBuilder::new(&chain, entry.algorithm)
        .timestamp(entry.timestamp)
        .digests(entry.digests())
        .build();
    for line in entry_lines(&chain, &block) {
        log.push_str(&line);
        log.push('\n');
    }
}

/// A log made of `entries`, in order.
pub fn build_log(entries: &[EntrySpec]) -> String {
    let mut log = String::new();
    for entry in entries {
        append_entry(&mut log, entry);
    }
    log
}

/// The log a first run over `a = "x"`, `b = "y"` with sha256 writes at `timestamp`.
pub fn two_file_scenario(timestamp: i64) -> String {
    let mut digests = [
        HashAlgorithm::Sha256.hash(b"x").into_string(),
        HashAlgorithm::Sha256.hash(b"y").into_string(),
    ];
    digests.sort();
    let data = format!("{timestamp} {} {}", digests[0], digests[1]);
    let root = HashAlgorithm::Sha256.hash(data.as_bytes());
    format!("{data}\n#root {root}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_matches_builder() {
        let built = build_log(&[EntrySpec::new(HashAlgorithm::Sha256, 1_700_000_000, &[b"x", b"y"])]);
        assert_eq!(built, two_file_scenario(1_700_000_000));
    }

    #[test]
    fn test_switch_writes_hashing_marker() {
        let log = build_log(&[
            EntrySpec::new(HashAlgorithm::Sha256, 1, &[b"x"]),
            EntrySpec::new(HashAlgorithm::Sha512, 2, &[b"x"]),
        ]);
        assert_eq!(log.lines().nth(2), Some("#hashing sha512"));
    }
}
