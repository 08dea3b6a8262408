//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use timeblocks::{EngineConfig, HashAlgorithm, LogEngine};
use timeblocks_publish::{Publisher, PublisherRegistry, RecordingPublisher};
use timeblocks_store::FileLog;

/// A temporary file tree with a log at its root.
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Root of the tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to the tree-relative `rel`, creating directories.
    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> &Self {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, content).expect("write file");
        self
    }

    /// Remove a file.
    pub fn remove(&self, rel: &str) -> &Self {
        fs::remove_file(self.path().join(rel)).expect("remove file");
        self
    }

    /// Rename a file within the tree.
    pub fn rename(&self, from: &str, to: &str) -> &Self {
        let to = self.path().join(to);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::rename(self.path().join(from), to).expect("rename file");
        self
    }

    /// Path of the default log.
    pub fn log_path(&self) -> PathBuf {
        self.config(HashAlgorithm::default()).resolved_log_path()
    }

    /// Current log text (empty if the log does not exist yet).
    pub fn log(&self) -> String {
        fs::read_to_string(self.log_path()).unwrap_or_default()
    }

    /// Replace the log text.
    pub fn set_log(&self, text: &str) {
        fs::write(self.log_path(), text).expect("write log");
    }

    /// Engine configuration for this tree with no publish channels.
    pub fn config(&self, algorithm: HashAlgorithm) -> EngineConfig {
        EngineConfig {
            algorithm,
            channels: Vec::new(),
            ..EngineConfig::for_root(self.path())
        }
    }

    /// An engine over this tree with no publish channels.
    pub fn engine(&self, algorithm: HashAlgorithm) -> LogEngine<FileLog> {
        LogEngine::open(self.config(algorithm), PublisherRegistry::new())
    }

    /// An engine over this tree publishing to a single recording channel.
    pub fn engine_with_recorder(
        &self,
        config: EngineConfig,
        recorder: &RecordingPublisher,
    ) -> LogEngine<FileLog> {
        let mut registry = PublisherRegistry::new();
        registry.register(Arc::new(recorder.clone()));
        LogEngine::open(
            EngineConfig {
                channels: vec![recorder.name().to_owned()],
                ..config
            },
            registry,
        )
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a test subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
