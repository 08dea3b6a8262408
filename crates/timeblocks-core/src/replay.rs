//! Chain replay: verify a log line by line and rebuild its [`ChainState`].
//!
//! Replay is strictly sequential. Each `#root` line is checked against the
//! hash of the data line before it, under the algorithm in effect at that
//! point, and the chain pointers inside the data line are checked against the
//! roots seen so far. Any mismatch stops replay; nothing is repaired.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::chain::{ChainPointers, ChainState, HistoryMode};
use crate::crypto::HashAlgorithm;
use crate::entry::{DataLine, LogEntry, LogLine, SCHEMA_VERSION};
use crate::error::ReplayError;
use crate::types::Digest;

/// Result of a successful replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    /// State the next writer builds on.
    pub state: ChainState,
    /// Every verified entry, in log order.
    pub entries: Vec<LogEntry>,
}

/// Replays a log from the perspective of a writer configured with one algorithm.
#[derive(Debug, Clone, Copy)]
pub struct ChainReplayer {
    configured: HashAlgorithm,
    history: HistoryMode,
}

impl ChainReplayer {
    /// Create a replayer for a writer using `configured`.
    pub fn new(configured: HashAlgorithm) -> Self {
        Self {
            configured,
            history: HistoryMode::default(),
        }
    }

    /// Choose which data line tokens count as history.
    pub fn history_mode(mut self, history: HistoryMode) -> Self {
        self.history = history;
        self
    }

    /// Verify `text` and rebuild the chain state.
    pub fn replay(&self, text: &str) -> Result<Replay, ReplayError> {
        let mut cursor = Cursor::new(*self);
        for (index, line) in text.lines().enumerate() {
            cursor.step(index + 1, line)?;
        }
        let replay = cursor.finish()?;
        debug!(
            entries = replay.state.entry_count,
            digests = replay.state.digest_set.len(),
            configured = %self.configured,
            active = %replay.state.active_algorithm,
            "replayed log"
        );
        Ok(replay)
    }
}

/// Replay `text` for a writer using `configured`, returning only the state.
pub fn replay(text: &str, configured: HashAlgorithm) -> Result<ChainState, ReplayError> {
    ChainReplayer::new(configured).replay(text).map(|r| r.state)
}

/// A data line waiting for its `#root`.
struct Pending<'a> {
    line: usize,
    text: &'a str,
}

struct Cursor<'a> {
    replayer: ChainReplayer,
    state: ChainState,
    declared_version: Option<u32>,
    roots_by_algorithm: HashMap<HashAlgorithm, Digest>,
    pending: Option<Pending<'a>>,
    entries: Vec<LogEntry>,
}

impl<'a> Cursor<'a> {
    fn new(replayer: ChainReplayer) -> Self {
        Self {
            replayer,
            state: ChainState::new(),
            declared_version: None,
            roots_by_algorithm: HashMap::new(),
            pending: None,
            entries: Vec::new(),
        }
    }

    fn step(&mut self, line: usize, text: &'a str) -> Result<(), ReplayError> {
        match LogLine::classify(text) {
            LogLine::Blank | LogLine::Comment(_) => Ok(()),
            LogLine::Version(version) => {
                self.expect_no_pending()?;
                self.on_version(line, version)
            }
            LogLine::Hashing(name) => {
                self.expect_no_pending()?;
                self.state.active_algorithm = name
                    .parse()
                    .map_err(|e: crate::error::CoreError| e.at_line(line))?;
                trace!(line, algorithm = %self.state.active_algorithm, "hashing marker");
                Ok(())
            }
            LogLine::Root(root) => self.on_root(line, root),
            LogLine::Data(data) => {
                self.expect_no_pending()?;
                self.pending = Some(Pending { line, text: data });
                Ok(())
            }
        }
    }

    fn on_version(&mut self, line: usize, version: &str) -> Result<(), ReplayError> {
        let found: u32 = version.parse().map_err(|_| ReplayError::MalformedMarker {
            line,
            text: version.to_owned(),
        })?;

        if let Some(previous) = self.declared_version {
            if found < previous {
                return Err(ReplayError::SchemaRegression {
                    line,
                    previous,
                    found,
                });
            }
        }
        if found > SCHEMA_VERSION {
            return Err(ReplayError::UnsupportedSchema {
                line,
                found,
                supported: SCHEMA_VERSION,
            });
        }

        self.declared_version = Some(found);
        self.state.schema_version = found;
        Ok(())
    }

    fn on_root(&mut self, line: usize, root: &str) -> Result<(), ReplayError> {
        let pending = self.pending.take().ok_or(ReplayError::OrphanRoot { line })?;
        let recorded = Digest::from_hex(root).map_err(|e| e.at_line(line))?;

        let algorithm = self.state.active_algorithm;
        let computed = algorithm.hash(pending.text.as_bytes());
        if computed != recorded {
            return Err(ReplayError::RootMismatch {
                line,
                recorded: recorded.into_string(),
                computed: computed.into_string(),
            });
        }

        let pointers = ChainPointers::new(
            self.roots_by_algorithm.get(&algorithm).cloned(),
            self.state.last_root.clone(),
        );
        let data = DataLine::parse(pending.text, algorithm, &pointers).map_err(|e| e.at_line(line))?;

        if algorithm == self.replayer.configured {
            match self.replayer.history {
                HistoryMode::FileDigests => {
                    self.state.digest_set.extend(data.digests.iter().cloned());
                }
                HistoryMode::AllTokens => {
                    self.state
                        .digest_set
                        .extend(pending.text.split_whitespace().map(Digest::from_token));
                }
            }
            self.state.last_proper_root = Some(recorded.clone());
        }

        trace!(line, root = recorded.short(), digests = data.digests.len(), "verified entry");

        self.roots_by_algorithm.insert(algorithm, recorded.clone());
        self.state.last_root = Some(recorded.clone());
        self.state.entry_count += 1;
        self.entries.push(LogEntry {
            line: pending.line,
            algorithm,
            data,
            root: recorded,
        });
        Ok(())
    }

    fn expect_no_pending(&self) -> Result<(), ReplayError> {
        match &self.pending {
            Some(pending) => Err(ReplayError::MissingRoot { line: pending.line }),
            None => Ok(()),
        }
    }

    fn finish(self) -> Result<Replay, ReplayError> {
        self.expect_no_pending()?;
        Ok(Replay {
            state: self.state,
            entries: self.entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::entry::{hashing_marker, root_marker, version_marker};

    fn digest(byte: u8) -> Digest {
        Digest::from_bytes(&[byte; 32])
    }

    /// Append a block to `log` the way the engine does.
    fn write_block(log: &mut String, algorithm: HashAlgorithm, digests: &[Digest], ts: i64) -> Digest {
        let state = replay(log, algorithm).unwrap();
        let block = BlockBuilder::new(&state, algorithm)
            .timestamp(ts)
            .digests(digests.iter().cloned())
            .build();
        if state.needs_hashing_marker(algorithm) {
            log.push_str(&hashing_marker(algorithm));
            log.push('\n');
        }
        log.push_str(block.data());
        log.push('\n');
        log.push_str(&root_marker(block.root()));
        log.push('\n');
        block.root().clone()
    }

    fn sha256_digests() -> Vec<Digest> {
        vec![
            HashAlgorithm::Sha256.hash(b"x"),
            HashAlgorithm::Sha256.hash(b"y"),
        ]
    }

    #[test]
    fn test_empty_log() {
        let state = replay("", HashAlgorithm::Sha256).unwrap();
        assert_eq!(state, ChainState::new());
    }

    #[test]
    fn test_single_entry() {
        let mut log = String::new();
        let root = write_block(&mut log, HashAlgorithm::Sha256, &sha256_digests(), 100);
        assert_eq!(log.lines().count(), 2);

        let replay = ChainReplayer::new(HashAlgorithm::Sha256).replay(&log).unwrap();
        assert_eq!(replay.state.last_root, Some(root.clone()));
        assert_eq!(replay.state.last_proper_root, Some(root));
        assert_eq!(replay.state.digest_set.len(), 2);
        assert_eq!(replay.entries.len(), 1);
        assert_eq!(replay.entries[0].line, 1);
        assert_eq!(replay.entries[0].data.timestamp, 100);
    }

    #[test]
    fn test_chain_of_entries() {
        let mut log = String::new();
        write_block(&mut log, HashAlgorithm::Sha256, &[digest(1)], 1);
        write_block(&mut log, HashAlgorithm::Sha256, &[digest(2)], 2);
        let last = write_block(&mut log, HashAlgorithm::Sha256, &[digest(3)], 3);

        let state = replay(&log, HashAlgorithm::Sha256).unwrap();
        assert_eq!(state.entry_count, 3);
        assert_eq!(state.last_root, Some(last));
        let expected: std::collections::HashSet<_> = [digest(1), digest(2), digest(3)].into();
        assert_eq!(state.digest_set, expected);
    }

    #[test]
    fn test_tampered_data_line() {
        let mut log = String::new();
        write_block(&mut log, HashAlgorithm::Sha256, &[digest(1)], 1);
        let tampered = log.replacen("1 ", "2 ", 1);
        let err = replay(&tampered, HashAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, ReplayError::RootMismatch { line: 2, .. }));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_tampered_root_line() {
        let mut log = String::new();
        write_block(&mut log, HashAlgorithm::Sha256, &[digest(1)], 1);
        let mut lines: Vec<String> = log.lines().map(String::from).collect();
        lines[1] = root_marker(&digest(0xee));
        let err = replay(&lines.join("\n"), HashAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, ReplayError::RootMismatch { line: 2, .. }));
    }

    #[test]
    fn test_spliced_entry_breaks_link() {
        // An entry that hashes correctly but points at the wrong predecessor.
        let mut log = String::new();
        write_block(&mut log, HashAlgorithm::Sha256, &[digest(1)], 1);
        let data = format!("2 {} {}", digest(0x77), digest(2));
        let root = HashAlgorithm::Sha256.hash(data.as_bytes());
        log.push_str(&format!("{data}\n{}\n", root_marker(&root)));

        let err = replay(&log, HashAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, ReplayError::BrokenLink { line: 4, .. }));
    }

    #[test]
    fn test_missing_root_at_eof() {
        let log = format!("1 {}\n", digest(1));
        assert_eq!(
            replay(&log, HashAlgorithm::Sha256).unwrap_err(),
            ReplayError::MissingRoot { line: 1 }
        );
    }

    #[test]
    fn test_two_data_lines_in_a_row() {
        let log = format!("1 {}\n2 {}\n", digest(1), digest(2));
        assert_eq!(
            replay(&log, HashAlgorithm::Sha256).unwrap_err(),
            ReplayError::MissingRoot { line: 1 }
        );
    }

    #[test]
    fn test_orphan_root() {
        let log = root_marker(&digest(1));
        assert_eq!(
            replay(&log, HashAlgorithm::Sha256).unwrap_err(),
            ReplayError::OrphanRoot { line: 1 }
        );
    }

    #[test]
    fn test_unsupported_schema() {
        let log = format!("{}\n", version_marker(SCHEMA_VERSION + 1));
        let err = replay(&log, HashAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, ReplayError::UnsupportedSchema { found: 2, supported: 1, .. }));
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_schema_regression() {
        let log = format!("{}\n{}\n", version_marker(1), version_marker(0));
        assert!(matches!(
            replay(&log, HashAlgorithm::Sha256),
            Err(ReplayError::SchemaRegression { line: 2, previous: 1, found: 0 })
        ));
    }

    #[test]
    fn test_declared_old_schema_is_reported() {
        let log = format!("{}\n", version_marker(0));
        let state = replay(&log, HashAlgorithm::Sha256).unwrap();
        assert_eq!(state.schema_version, 0);
        assert!(state.needs_version_marker());
    }

    #[test]
    fn test_unknown_algorithm_marker() {
        let err = replay("#hashing whirlpool\n", HashAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, ReplayError::UnknownAlgorithm { line: 1, ref name } if name == "whirlpool"));
    }

    #[test]
    fn test_comments_and_blank_lines_are_ignored() {
        let mut log = String::from("# written by hand\n\n");
        write_block(&mut log, HashAlgorithm::Sha256, &[digest(1)], 1);
        log.push_str("\n# trailing note\n");
        let state = replay(&log, HashAlgorithm::Sha256).unwrap();
        assert_eq!(state.entry_count, 1);
    }

    #[test]
    fn test_algorithm_switch_hides_history() {
        let mut log = String::new();
        write_block(&mut log, HashAlgorithm::Sha256, &sha256_digests(), 1);

        let other = replay(&log, HashAlgorithm::Sha384).unwrap();
        assert!(other.digest_set.is_empty());
        assert!(other.last_root.is_some());
        assert_eq!(other.last_proper_root, None);
        assert_eq!(other.active_algorithm, HashAlgorithm::Sha256);
    }

    #[test]
    fn test_switch_and_back_threads_proper_root() {
        let mut log = String::new();
        let first = write_block(&mut log, HashAlgorithm::Sha256, &[digest(1)], 1);
        let x384 = HashAlgorithm::Sha384.hash(b"x");
        let second = write_block(&mut log, HashAlgorithm::Sha384, &[x384], 2);
        assert!(log.contains("#hashing sha384"));

        // Switching back: the data line carries the old sha256 root, then the sha384 root.
        let before = replay(&log, HashAlgorithm::Sha256).unwrap();
        assert_eq!(before.last_proper_root, Some(first.clone()));
        assert_eq!(before.last_root, Some(second.clone()));
        assert_eq!(before.digest_set.len(), 1);

        write_block(&mut log, HashAlgorithm::Sha256, &[digest(3)], 3);
        assert!(log.contains(&format!("3 {first} {second} ")));
        assert!(log.contains("#hashing sha256"));

        let state = replay(&log, HashAlgorithm::Sha256).unwrap();
        assert_eq!(state.entry_count, 3);
        assert_eq!(state.digest_set.len(), 2);
    }

    #[test]
    fn test_all_tokens_history_mode() {
        let mut log = String::new();
        let root = write_block(&mut log, HashAlgorithm::Sha256, &[digest(1)], 1234);
        write_block(&mut log, HashAlgorithm::Sha256, &[digest(2)], 1235);

        let state = ChainReplayer::new(HashAlgorithm::Sha256)
            .history_mode(HistoryMode::AllTokens)
            .replay(&log)
            .unwrap()
            .state;
        assert!(state.digest_set.contains(&Digest::from_token("1234")));
        assert!(state.digest_set.contains(&root));
        assert!(state.digest_set.contains(&digest(2)));

        let strict = replay(&log, HashAlgorithm::Sha256).unwrap();
        assert!(!strict.digest_set.contains(&root));
        assert_eq!(strict.digest_set.len(), 2);
    }

    #[test]
    fn test_marker_between_data_and_root() {
        let log = format!("1 {}\n#hashing sha256\n", digest(1));
        assert_eq!(
            replay(&log, HashAlgorithm::Sha256).unwrap_err(),
            ReplayError::MissingRoot { line: 1 }
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn three_entry_log() -> String {
            let mut log = String::new();
            write_block(&mut log, HashAlgorithm::Sha256, &[digest(1), digest(2)], 1_700_000_000);
            write_block(&mut log, HashAlgorithm::Sha256, &[digest(3)], 1_700_000_100);
            write_block(&mut log, HashAlgorithm::Sha256, &[digest(4)], 1_700_000_200);
            log
        }

        proptest! {
            #[test]
            fn flipping_a_data_character_is_detected_at_its_root(
                entry in 0usize..3,
                position in any::<prop::sample::Index>(),
                replacement in prop::sample::select(vec!['0', '7', 'a', 'f', 'x', ' ']),
            ) {
                let log = three_entry_log();
                let mut lines: Vec<String> = log.lines().map(String::from).collect();
                let data_index = entry * 2;
                let chars: Vec<char> = lines[data_index].chars().collect();
                let at = position.index(chars.len());
                prop_assume!(chars[at] != replacement);

                let mut flipped = chars.clone();
                flipped[at] = replacement;
                lines[data_index] = flipped.into_iter().collect();

                let err = replay(&lines.join("\n"), HashAlgorithm::Sha256).unwrap_err();
                prop_assert!(err.is_corruption());
                prop_assert_eq!(err.line(), data_index + 2);
            }
        }
    }
}
