//! # timeblocks store
//!
//! Persistence for timestamp logs. The engine talks to the log only through
//! the [`LogStore`] trait, which offers exactly three things: read the whole
//! log, take the exclusive writer lock, and append lines.
//!
//! ## Key Types
//!
//! - [`LogStore`] - The async trait for log persistence
//! - [`FileLog`] - A plain text file with a `<log>.lock` sidecar lock
//! - [`MemoryLog`] - In-memory log for tests
//! - [`WriterLock`] - RAII proof of exclusive write access
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use timeblocks_store::{FileLog, LogStore};
//!
//! async fn example() -> timeblocks_store::Result<()> {
//!     let log = FileLog::new("timestampblocks.log");
//!     let lock = log.lock(Duration::from_secs(5)).await?;
//!     let text = log.read_all().await?;
//!     if text.is_empty() {
//!         log.append(&lock, &["# first line".to_string()]).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Append-only**: existing bytes are never rewritten
//! - **One write per block**: all lines of a block go out in a single `write_all` + `sync_all`
//! - **Advisory locking**: only cooperating writers are excluded

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::{lock_path_for, FileLog};
pub use memory::MemoryLog;
pub use traits::{LogStore, WriterLock};
