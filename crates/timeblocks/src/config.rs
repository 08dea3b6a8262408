//! Engine configuration.
//!
//! One explicit [`EngineConfig`] value per invocation. Nothing is read from
//! the environment or reloaded behind the engine's back; use
//! [`Settings`](crate::Settings) to build one from a settings file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use timeblocks_core::{HashAlgorithm, HistoryMode};

/// Default log file name, relative to the tree root.
pub const DEFAULT_LOG_FILE: &str = "timestampblocks.log";

/// Default ignore file name, relative to the tree root.
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// Configuration for one engine run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root of the tree to timestamp.
    pub root_dir: PathBuf,
    /// Algorithm for file digests and commitments.
    pub algorithm: HashAlgorithm,
    /// Publish channels, in publish order.
    pub channels: Vec<String>,
    /// Append a block even when no file changed.
    pub force_publish: bool,
    /// Do everything except appending; publishers see `dry_run = true`.
    pub dry_run: bool,
    /// Log file. Relative paths are resolved against `root_dir`.
    pub log_path: PathBuf,
    /// Ignore file. Relative paths are resolved against `root_dir`.
    pub ignore_path: PathBuf,
    /// Extra ignore rules applied after the ignore file.
    pub extra_ignore: Vec<String>,
    /// Which tokens of past data lines count as committed.
    pub history_mode: HistoryMode,
    /// How long to wait for another writer to release the log.
    pub lock_timeout: Duration,
    /// How long each publish channel may take.
    pub publish_timeout: Duration,
}

impl Default for EngineConfig {
    /// sha256 and the `shell` channel only. Git publishing and sha384 are
    /// opt-in through the settings file.
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            algorithm: HashAlgorithm::default(),
            channels: vec!["shell".to_string()],
            force_publish: false,
            dry_run: false,
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            ignore_path: PathBuf::from(DEFAULT_IGNORE_FILE),
            extra_ignore: Vec::new(),
            history_mode: HistoryMode::default(),
            lock_timeout: Duration::from_secs(5),
            publish_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Defaults for the tree at `root_dir`.
    pub fn for_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// The log file path, resolved against the root.
    pub fn resolved_log_path(&self) -> PathBuf {
        resolve(&self.root_dir, &self.log_path)
    }

    /// The ignore file path, resolved against the root.
    pub fn resolved_ignore_path(&self) -> PathBuf {
        resolve(&self.root_dir, &self.ignore_path)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.channels, vec!["shell"]);
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.publish_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let mut config = EngineConfig::for_root("/tree");
        assert_eq!(config.resolved_log_path(), PathBuf::from("/tree/timestampblocks.log"));
        assert_eq!(config.resolved_ignore_path(), PathBuf::from("/tree/.gitignore"));

        config.log_path = PathBuf::from("/var/log/t.log");
        assert_eq!(config.resolved_log_path(), PathBuf::from("/var/log/t.log"));
    }
}
