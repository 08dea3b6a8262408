//! The `command` protocol: hand the block to an external program.
//!
//! This is how ledgers and contracts are reached without the engine doing
//! network I/O or holding credentials itself. The program receives the
//! block in environment variables and its trimmed standard output, if any,
//! becomes the transaction id.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};
use timeblocks_core::Block;

use crate::error::{PublishError, Result};
use crate::publisher::{PublishContext, Publisher};

/// Environment variable carrying the block root.
pub const ENV_ROOT: &str = "TIMEBLOCKS_ROOT";
/// Environment variable carrying the data line.
pub const ENV_DATA: &str = "TIMEBLOCKS_DATA";
/// Environment variable carrying the Unix timestamp.
pub const ENV_TIMESTAMP: &str = "TIMEBLOCKS_TIMESTAMP";
/// Environment variable carrying the algorithm name.
pub const ENV_HASHING: &str = "TIMEBLOCKS_HASHING";
/// Environment variable carrying the whole block as JSON.
pub const ENV_BLOCK: &str = "TIMEBLOCKS_BLOCK";
/// Environment variable carrying the log path.
pub const ENV_LOG: &str = "TIMEBLOCKS_LOG";

/// Runs a configured program once per block.
#[derive(Debug, Clone)]
pub struct CommandPublisher {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandPublisher {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }

    /// Environment passed to the program for `block`.
    pub fn environment(block: &Block, ctx: &PublishContext) -> Result<Vec<(&'static str, String)>> {
        let json = serde_json::to_string(block)
            .map_err(|e| PublishError::failed("command", format!("cannot encode block: {e}")))?;
        Ok(vec![
            (ENV_ROOT, block.root().to_string()),
            (ENV_DATA, block.data().to_string()),
            (ENV_TIMESTAMP, block.timestamp().to_string()),
            (ENV_HASHING, block.hashing().to_string()),
            (ENV_BLOCK, json),
            (ENV_LOG, ctx.log_path.display().to_string()),
        ])
    }
}

#[async_trait]
impl Publisher for CommandPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, block: &Block, ctx: &PublishContext) -> Result<Option<String>> {
        if ctx.dry_run {
            info!(channel = %self.name, program = %self.program, "dry run, not running command");
            return Ok(None);
        }

        debug!(channel = %self.name, program = %self.program, args = ?self.args, "running command");
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(Self::environment(block, ctx)?)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if ctx.root_dir.is_dir() {
            command.current_dir(&ctx.root_dir);
        }

        let output = command.output().await.map_err(|e| {
            PublishError::failed(&self.name, format!("cannot run {}: {e}", self.program))
        })?;
        if !output.status.success() {
            return Err(PublishError::failed(
                &self.name,
                format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!stdout.is_empty()).then_some(stdout))
    }
}
