//! The `shell` channel: print a human-readable block report.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;
use timeblocks_core::Block;

use crate::error::Result;
use crate::publisher::{PublishContext, Publisher};

/// Prints the block to standard output.
#[derive(Debug, Clone)]
pub struct ShellPublisher {
    name: String,
}

impl ShellPublisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The report printed for `block`.
    pub fn render(block: &Block) -> String {
        let when = DateTime::from_timestamp(block.timestamp(), 0)
            .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "<out of range>".to_string());

        let mut out = String::new();
        out.push_str(&format!("New block with root '{}', and data:\n", block.root()));
        out.push_str(block.data());
        out.push('\n');
        out.push_str(&format!("Used hashing algorithm: {}\n", block.hashing()));
        out.push_str(&format!("Timestamp: {} -- {}\n", block.timestamp(), when));
        out
    }
}

impl Default for ShellPublisher {
    fn default() -> Self {
        Self::new("shell")
    }
}

#[async_trait]
impl Publisher for ShellPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, block: &Block, _ctx: &PublishContext) -> Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(Self::render(block).as_bytes()).await?;
        stdout.flush().await?;
        Ok(None)
    }
}
