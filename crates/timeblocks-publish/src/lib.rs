//! # timeblocks publish
//!
//! Publish adapters anchor a finalized block outside the log. The engine
//! appends first and publishes afterwards, so nothing a publisher does can
//! corrupt the log.
//!
//! ## Key Types
//!
//! - [`Publisher`] - the async adapter trait
//! - [`Channel`] - builtin protocols: `shell`, `git`, `command`
//! - [`PublisherRegistry`] - channel names to publishers
//! - [`publish_all`] - sequential fan-out with a per-channel timeout
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use timeblocks_publish::{publish_all, PublishContext, PublisherRegistry};
//! # use timeblocks_core::Block;
//!
//! async fn example(block: &Block) -> timeblocks_publish::Result<()> {
//!     let registry = PublisherRegistry::with_builtins();
//!     let publishers = registry.resolve(&["shell"])?;
//!     let outcomes = publish_all(
//!         &publishers,
//!         block,
//!         &PublishContext::default(),
//!         Duration::from_secs(60),
//!     )
//!     .await;
//!     assert_eq!(outcomes.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod git;
pub mod memory;
pub mod publisher;
pub mod registry;
pub mod shell;

pub use channel::Channel;
pub use command::CommandPublisher;
pub use dispatch::{publish_all, PublishOutcome};
pub use error::{PublishError, Result};
pub use git::GitPublisher;
pub use memory::{Behavior, RecordingPublisher};
pub use publisher::{PublishContext, Publisher};
pub use registry::PublisherRegistry;
pub use shell::ShellPublisher;
