//! The `git` channel: commit the updated tree and log, optionally push.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};
use timeblocks_core::Block;

use crate::error::{PublishError, Result};
use crate::publisher::{PublishContext, Publisher};

/// Commit message for a block.
pub fn commit_message(block: &Block) -> String {
    format!("timestampblocks update for root {}", block.root())
}

/// Commits the tree (including the log, even if git ignores it) and pushes.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    name: String,
    push: bool,
    remote: Option<String>,
}

impl GitPublisher {
    /// A publisher that commits and pushes to the default remote.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            push: true,
            remote: None,
        }
    }

    /// Whether to push after committing.
    pub fn push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    /// Push to `remote` instead of the branch's default.
    pub fn remote(mut self, remote: Option<String>) -> Self {
        self.remote = remote;
        self
    }

    /// The git invocations for one block, in order.
    pub fn plan(&self, block: &Block, ctx: &PublishContext) -> Vec<Vec<String>> {
        let log = ctx
            .log_path
            .strip_prefix(&ctx.root_dir)
            .unwrap_or(&ctx.log_path)
            .display()
            .to_string();

        let mut steps: Vec<Vec<String>> = vec![
            vec!["add".to_string(), "--all".to_string()],
            vec!["add".to_string(), "--force".to_string(), log],
            vec!["commit".to_string(), "-m".to_string(), commit_message(block)],
        ];
        if self.push {
            let mut push = vec!["push".to_string()];
            push.extend(self.remote.iter().cloned());
            steps.push(push);
        }
        steps
    }

    async fn git(&self, dir: &Path, args: &[String]) -> Result<String> {
        debug!(channel = %self.name, ?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(PublishError::failed(
                &self.name,
                format!(
                    "git {} exited with {}: {}",
                    args.first().map(String::as_str).unwrap_or_default(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for GitPublisher {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, block: &Block, ctx: &PublishContext) -> Result<Option<String>> {
        let steps = self.plan(block, ctx);
        if ctx.dry_run {
            for args in &steps {
                info!(channel = %self.name, "dry run, not running `git {}`", args.join(" "));
            }
            return Ok(None);
        }

        for args in &steps {
            self.git(&ctx.root_dir, args).await?;
        }
        let commit = self
            .git(&ctx.root_dir, &["rev-parse".to_string(), "HEAD".to_string()])
            .await?;
        info!(channel = %self.name, %commit, root = block.root().short(), "committed block");
        Ok(Some(commit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use timeblocks_core::{BlockBuilder, ChainState, HashAlgorithm};

    fn block() -> Block {
        BlockBuilder::new(&ChainState::new(), HashAlgorithm::Sha256)
            .timestamp(42)
            .build()
    }

    fn ctx(dry_run: bool) -> PublishContext {
        PublishContext {
            dry_run,
            root_dir: PathBuf::from("/tree"),
            log_path: PathBuf::from("/tree/timestampblocks.log"),
        }
    }

    #[test]
    fn test_commit_message() {
        let block = block();
        assert_eq!(
            commit_message(&block),
            format!("timestampblocks update for root {}", block.root())
        );
    }

    #[test]
    fn test_plan_with_push() {
        let block = block();
        let plan = GitPublisher::default()
            .remote(Some("origin".into()))
            .plan(&block, &ctx(false));
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[1], vec!["add", "--force", "timestampblocks.log"]);
        assert_eq!(plan[2][2], commit_message(&block));
        assert_eq!(plan[3], vec!["push", "origin"]);
    }

    #[test]
    fn test_plan_without_push() {
        let plan = GitPublisher::default().push(false).plan(&block(), &ctx(false));
        assert!(plan.iter().all(|args| args[0] != "push"));
    }

    #[tokio::test]
    async fn test_dry_run_runs_nothing() {
        // /tree does not exist, so any real git call would fail.
        let id = GitPublisher::default().publish(&block(), &ctx(true)).await.unwrap();
        assert_eq!(id, None);
    }
}
