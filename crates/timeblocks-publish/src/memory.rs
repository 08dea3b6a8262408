//! In-memory publisher for testing.
//!
//! Records every block it receives and can be told to fail or hang, so the
//! engine's warning and timeout handling can be exercised without a real
//! external system.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use timeblocks_core::Block;

use crate::error::{PublishError, Result};
use crate::publisher::{PublishContext, Publisher};

/// How a [`RecordingPublisher`] responds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Record the block and return this transaction id.
    Succeed(Option<String>),
    /// Record the block and fail with this reason.
    Fail(String),
    /// Record the block and never return.
    Hang,
}

/// A publisher that records what it was given.
#[derive(Debug, Clone)]
pub struct RecordingPublisher {
    name: String,
    behavior: Behavior,
    received: Arc<Mutex<Vec<(Block, bool)>>>,
}

impl RecordingPublisher {
    /// A publisher that always succeeds without a transaction id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: Behavior::Succeed(None),
            received: Arc::default(),
        }
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Blocks received so far, in order.
    pub async fn blocks(&self) -> Vec<Block> {
        self.received.lock().await.iter().map(|(b, _)| b.clone()).collect()
    }

    /// The `dry_run` flag of each call, in order.
    pub async fn dry_runs(&self) -> Vec<bool> {
        self.received.lock().await.iter().map(|(_, d)| *d).collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, block: &Block, ctx: &PublishContext) -> Result<Option<String>> {
        self.received.lock().await.push((block.clone(), ctx.dry_run));
        match &self.behavior {
            Behavior::Succeed(id) => Ok(id.clone()),
            Behavior::Fail(reason) => Err(PublishError::failed(&self.name, reason.clone())),
            Behavior::Hang => std::future::pending().await,
        }
    }
}
