//! The engine: one invocation of replay, scan, append and publish.
//!
//! ```text
//! resolve channels, compile ignore rules
//!   -> lock log -> replay -> scan -> drop known digests
//!   -> build block -> single append -> unlock
//!   -> publish to each channel in order
//! ```
//!
//! Every fatal error happens before the append, so a failed run never
//! leaves a partial entry behind.

use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use timeblocks_core::{
    entry::{hashing_marker, root_marker, version_marker},
    Block, BlockBuilder, ChainReplayer, ChainState, Digest, Replay, SCHEMA_VERSION,
};
use timeblocks_publish::{publish_all, PublishContext, Publisher, PublisherRegistry};
use timeblocks_scan::{CancellationToken, PathMatcher, ScanOutput, TreeScanner};
use timeblocks_store::{lock_path_for, FileLog, LogStore};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result, Warning};
use crate::settings::{Settings, DEFAULT_SETTINGS_PATH};

/// A channel that accepted the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub channel: String,
    /// External transaction id, when the channel returns one.
    pub transaction_id: Option<String>,
}

/// What one [`LogEngine::update`] run did.
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    /// The block built this run, if any.
    pub block: Option<Block>,
    /// Whether the block was appended (false for dry runs and no-op runs).
    pub appended: bool,
    /// The log lines of the block, in append order.
    pub lines: Vec<String>,
    /// Number of files digested.
    pub files_scanned: usize,
    /// Number of digests not seen before.
    pub new_digests: usize,
    /// Channels that accepted the block.
    pub published: Vec<Publication>,
    /// Recoverable problems.
    pub warnings: Vec<Warning>,
}

/// The log engine.
pub struct LogEngine<S: LogStore> {
    /// The log.
    store: Arc<S>,
    /// Publish channels by name.
    registry: PublisherRegistry,
    /// Configuration for this invocation.
    config: EngineConfig,
    /// Stops an in-flight scan.
    cancel: CancellationToken,
}

impl<S: LogStore> std::fmt::Debug for LogEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEngine")
            .field("log", &self.store.location())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LogEngine<FileLog> {
    /// Engine over the log file named by `config`.
    pub fn open(config: EngineConfig, registry: PublisherRegistry) -> Self {
        let store = FileLog::new(config.resolved_log_path());
        Self::new(store, config, registry)
    }

    /// Engine configured from `<root>/.timestampblocks/config.toml`, or
    /// defaults when that file does not exist.
    pub fn from_settings(root_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        let settings = Settings::load_or_default(&root_dir.join(DEFAULT_SETTINGS_PATH))?;
        let registry = settings.registry()?;
        let config = settings.to_config(root_dir)?;
        Ok(Self::open(config, registry))
    }
}

impl<S: LogStore> LogEngine<S> {
    /// Create an engine over `store`.
    pub fn new(store: S, config: EngineConfig, registry: PublisherRegistry) -> Self {
        Self {
            store: Arc::new(store),
            registry,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` to stop scans early.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Register an additional publisher.
    pub fn register(&mut self, publisher: Arc<dyn Publisher>) {
        self.registry.register(publisher);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Timestamp the tree: append a block if anything changed, then publish it.
    #[instrument(
        skip(self),
        fields(
            root = %self.config.root_dir.display(),
            algorithm = %self.config.algorithm,
            dry_run = self.config.dry_run
        )
    )]
    pub async fn update(&self) -> Result<UpdateReport> {
        let mut report = UpdateReport::default();

        let publishers = self.resolve_channels(&mut report.warnings);
        let scanner = TreeScanner::new(&self.config.root_dir, self.matcher()?)
            .cancellation(self.cancel.clone());

        let lock = self.store.lock(self.config.lock_timeout).await?;
        let chain = self.replay().await?.state;
        let scan = self.scan(scanner).await?;

        let new_digests: BTreeSet<Digest> = scan
            .digests()
            .into_iter()
            .filter(|d| chain.is_new(d))
            .collect();
        report.files_scanned = scan.files.len();
        report.new_digests = new_digests.len();
        report
            .warnings
            .extend(scan.warnings.into_iter().map(Warning::from));

        if new_digests.is_empty() && !self.config.force_publish {
            info!(files = report.files_scanned, "no new digests, nothing to append");
            return Ok(report);
        }

        let block = BlockBuilder::new(&chain, self.config.algorithm)
            .digests(new_digests)
            .build();
        let lines = entry_lines(&chain, &block);

        if self.config.dry_run {
            info!(root = block.root().short(), lines = lines.len(), "dry run, not appending");
        } else {
            self.store.append(&lock, &lines).await?;
            report.appended = true;
            info!(
                root = block.root().short(),
                digests = block.hashed_files().len(),
                log = %self.store.location(),
                "appended block"
            );
        }
        drop(lock);
        report.lines = lines;

        let ctx = PublishContext {
            dry_run: self.config.dry_run,
            root_dir: self.config.root_dir.clone(),
            log_path: self.config.resolved_log_path(),
        };
        let outcomes = publish_all(&publishers, &block, &ctx, self.config.publish_timeout).await;
        for outcome in outcomes {
            match outcome.result {
                Ok(transaction_id) => report.published.push(Publication {
                    channel: outcome.channel,
                    transaction_id,
                }),
                Err(e) => report.warnings.push(Warning::AdapterFailure {
                    channel: outcome.channel,
                    reason: e.to_string(),
                }),
            }
        }

        report.block = Some(block);
        Ok(report)
    }

    /// Replay and verify the log without scanning or writing.
    #[instrument(skip(self), fields(log = %self.store.location()))]
    pub async fn verify(&self) -> Result<Replay> {
        let replay = self.replay().await?;
        info!(
            entries = replay.state.entry_count,
            digests = replay.state.digest_set.len(),
            "log verified"
        );
        Ok(replay)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn replay(&self) -> Result<Replay> {
        let text = self.store.read_all().await?;
        let replay = ChainReplayer::new(self.config.algorithm)
            .history_mode(self.config.history_mode)
            .replay(&text)?;
        Ok(replay)
    }

    /// Publishers for the configured channels. Unknown names become warnings.
    fn resolve_channels(&self, warnings: &mut Vec<Warning>) -> Vec<Arc<dyn Publisher>> {
        let mut publishers = Vec::with_capacity(self.config.channels.len());
        for name in &self.config.channels {
            match self.registry.resolve(std::slice::from_ref(name)) {
                Ok(mut found) => publishers.append(&mut found),
                Err(e) => {
                    warn!(channel = %name, error = %e, "skipping unknown publish channel");
                    warnings.push(Warning::UnknownChannel {
                        channel: name.clone(),
                    });
                }
            }
        }
        publishers
    }

    /// Ignore file rules, extra rules, and the log's own files.
    fn matcher(&self) -> Result<PathMatcher> {
        let ignore_path = self.config.resolved_ignore_path();
        let mut rules: Vec<String> = match std::fs::read_to_string(&ignore_path) {
            Ok(text) => text.lines().map(String::from).collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(EngineError::Configuration(format!(
                    "cannot read ignore file {}: {e}",
                    ignore_path.display()
                )))
            }
        };
        rules.extend(self.config.extra_ignore.iter().cloned());
        debug!(path = %ignore_path.display(), rules = rules.len(), "loaded ignore rules");

        let log = self.config.resolved_log_path();
        let excluded = [lock_path_for(&log), log];
        Ok(PathMatcher::compile(&self.config.root_dir, &rules, &excluded)?)
    }

    async fn scan(&self, scanner: TreeScanner) -> Result<ScanOutput> {
        let algorithm = self.config.algorithm;
        let output = tokio::task::spawn_blocking(move || scanner.scan(algorithm))
            .await
            .map_err(|e| EngineError::Task(e.to_string()))??;
        Ok(output)
    }
}

/// The log lines for appending `block` to a log in state `chain`.
///
/// A version marker is only written when the log explicitly declares an
/// older schema; a log without one is implicitly current. A hashing marker
/// is written whenever the block's algorithm differs from the one in effect.
pub fn entry_lines(chain: &ChainState, block: &Block) -> Vec<String> {
    let mut lines = Vec::with_capacity(4);
    if chain.needs_version_marker() {
        lines.push(version_marker(SCHEMA_VERSION));
    }
    if chain.needs_hashing_marker(block.hashing()) {
        lines.push(hashing_marker(block.hashing()));
    }
    lines.push(block.data().to_owned());
    lines.push(root_marker(block.root()));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeblocks_core::HashAlgorithm;

    #[test]
    fn test_entry_lines_fresh_log() {
        let chain = ChainState::new();
        let block = BlockBuilder::new(&chain, HashAlgorithm::Sha256).timestamp(1).build();
        let lines = entry_lines(&chain, &block);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], block.data());
        assert!(lines[1].starts_with("#root "));
    }

    #[test]
    fn test_entry_lines_algorithm_switch_and_old_schema() {
        let chain = ChainState {
            schema_version: 0,
            ..ChainState::new()
        };
        let block = BlockBuilder::new(&chain, HashAlgorithm::Blake3).timestamp(1).build();
        let lines = entry_lines(&chain, &block);
        assert_eq!(lines[0], "#timehashblock v1");
        assert_eq!(lines[1], "#hashing blake3");
        assert_eq!(lines.len(), 4);
    }
}
