//! Sequential fan-out of one block to many publishers.
//!
//! Each publisher runs under its own timeout. A failure or timeout is
//! recorded and the next publisher still runs.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use timeblocks_core::Block;

use crate::error::{PublishError, Result};
use crate::publisher::{PublishContext, Publisher};

/// Outcome of handing a block to one channel.
#[derive(Debug)]
pub struct PublishOutcome {
    pub channel: String,
    /// Transaction id on success.
    pub result: Result<Option<String>>,
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Publish `block` to each publisher in order.
pub async fn publish_all(
    publishers: &[Arc<dyn Publisher>],
    block: &Block,
    ctx: &PublishContext,
    timeout: Duration,
) -> Vec<PublishOutcome> {
    let mut outcomes = Vec::with_capacity(publishers.len());
    for publisher in publishers {
        let channel = publisher.name().to_owned();
        let result = match tokio::time::timeout(timeout, publisher.publish(block, ctx)).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout {
                channel: channel.clone(),
                after: timeout,
            }),
        };

        match &result {
            Ok(id) => info!(
                %channel,
                root = block.root().short(),
                transaction = id.as_deref().unwrap_or("-"),
                dry_run = ctx.dry_run,
                "published block"
            ),
            Err(e) => warn!(%channel, error = %e, "publish failed"),
        }
        outcomes.push(PublishOutcome { channel, result });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Behavior, RecordingPublisher};
    use timeblocks_core::{BlockBuilder, ChainState, HashAlgorithm};

    fn block() -> Block {
        BlockBuilder::new(&ChainState::new(), HashAlgorithm::Sha256)
            .timestamp(1)
            .build()
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_channels() {
        let failing = RecordingPublisher::new("a").behavior(Behavior::Fail("down".into()));
        let ok = RecordingPublisher::new("b").behavior(Behavior::Succeed(Some("tx1".into())));
        let publishers: Vec<Arc<dyn Publisher>> = vec![Arc::new(failing), Arc::new(ok.clone())];

        let outcomes = publish_all(
            &publishers,
            &block(),
            &PublishContext::default(),
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_success());
        assert_eq!(outcomes[1].result.as_ref().unwrap(), &Some("tx1".to_string()));
        assert_eq!(ok.blocks().await, vec![block()]);
    }

    #[tokio::test]
    async fn test_hanging_channel_times_out() {
        let hang = RecordingPublisher::new("slow").behavior(Behavior::Hang);
        let after = RecordingPublisher::new("after");
        let publishers: Vec<Arc<dyn Publisher>> = vec![Arc::new(hang), Arc::new(after.clone())];

        let outcomes = publish_all(
            &publishers,
            &block(),
            &PublishContext::default(),
            Duration::from_millis(20),
        )
        .await;

        assert!(matches!(outcomes[0].result, Err(PublishError::Timeout { .. })));
        assert!(outcomes[1].is_success());
        assert_eq!(after.blocks().await.len(), 1);
    }
}
