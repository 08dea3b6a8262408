//! Publisher abstraction.
//!
//! A publisher anchors a finalized block somewhere outside the log: a
//! terminal, a version control history, a ledger. Publishing happens after
//! the log append, so a failing publisher never affects the log.

use std::path::PathBuf;

use async_trait::async_trait;
use timeblocks_core::Block;

use crate::error::Result;

/// What a publisher knows about the run besides the block itself.
#[derive(Debug, Clone, Default)]
pub struct PublishContext {
    /// When set, publishers must not cause any side effect.
    pub dry_run: bool,
    /// Root of the timestamped tree.
    pub root_dir: PathBuf,
    /// Path of the log the block was appended to.
    pub log_path: PathBuf,
}

/// Publisher trait for anchoring blocks.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Channel name this publisher is registered under.
    fn name(&self) -> &str;

    /// Anchor `block`. Returns an external transaction id when there is one.
    async fn publish(&self, block: &Block, ctx: &PublishContext) -> Result<Option<String>>;
}
