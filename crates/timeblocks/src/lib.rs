//! # timeblocks
//!
//! Timestamp a file tree into an append-only hash-chain log.
//!
//! ## Overview
//!
//! Each run digests every file that the ignore rules let through, drops
//! the digests the log already contains, and appends one entry committing
//! to the rest. The entry points back at the previous commitment, so
//! rewriting any earlier line breaks every later `#root`. Once appended,
//! the block is handed to publish channels that anchor it elsewhere.
//!
//! ## Key Concepts
//!
//! - **Block**: one run's data line plus its commitment (`#root`).
//! - **Chain pointer**: the previous commitment, embedded in the next data line.
//! - **Digest set**: every digest committed under the configured algorithm.
//!   Files whose content is already in it are not committed again.
//! - **Replay**: the log is re-verified from the first line on every run.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use timeblocks::{EngineConfig, LogEngine};
//! use timeblocks::publish::PublisherRegistry;
//!
//! async fn example() -> timeblocks::Result<()> {
//!     let config = EngineConfig::for_root("/srv/documents");
//!     let engine = LogEngine::open(config, PublisherRegistry::with_builtins());
//!
//!     let report = engine.update().await?;
//!     if let Some(block) = &report.block {
//!         println!("committed {} new files under {}", block.hashed_files().len(), block.root());
//!     }
//!     for warning in &report.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `timeblocks::core` - digests, log grammar, replay, block building
//! - `timeblocks::store` - log persistence and locking
//! - `timeblocks::scan` - ignore rules and tree digesting
//! - `timeblocks::publish` - publish channels

pub mod config;
pub mod engine;
pub mod error;
pub mod settings;

// Re-export component crates
pub use timeblocks_core as core;
pub use timeblocks_publish as publish;
pub use timeblocks_scan as scan;
pub use timeblocks_store as store;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use engine::{entry_lines, LogEngine, Publication, UpdateReport};
pub use error::{EngineError, ErrorKind, Result, Warning};
pub use settings::{DefaultSection, Settings, DEFAULT_SETTINGS_PATH};

// Re-export commonly used core types
pub use timeblocks_core::{
    Block, ChainState, Digest, HashAlgorithm, HistoryMode, LogEntry, Replay, ReplayError,
};
