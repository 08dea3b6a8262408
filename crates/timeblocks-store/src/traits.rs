//! LogStore trait: the persistence seam between the engine and the log file.
//!
//! A log is append-only. Implementations never rewrite existing bytes; the
//! only mutation is [`LogStore::append`], which writes a whole block in one
//! call while the caller holds a [`WriterLock`].

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::file::FileGuard;

/// Proof that the holder is the only writer of a log.
///
/// The lock is released when this value is dropped.
#[must_use = "the writer lock is released as soon as it is dropped"]
pub struct WriterLock {
    inner: LockInner,
}

#[allow(dead_code)]
enum LockInner {
    File(FileGuard),
    Memory(tokio::sync::OwnedMutexGuard<()>),
}

impl WriterLock {
    pub(crate) fn file(guard: FileGuard) -> Self {
        Self {
            inner: LockInner::File(guard),
        }
    }

    pub(crate) fn memory(guard: tokio::sync::OwnedMutexGuard<()>) -> Self {
        Self {
            inner: LockInner::Memory(guard),
        }
    }
}

impl std::fmt::Debug for WriterLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            LockInner::File(guard) => f.debug_tuple("WriterLock").field(&guard.path()).finish(),
            LockInner::Memory(_) => f.write_str("WriterLock(memory)"),
        }
    }
}

/// Async interface over an append-only timestamp log.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Acquire the exclusive writer lock, waiting at most `timeout`.
    async fn lock(&self, timeout: Duration) -> Result<WriterLock>;

    /// Read the whole log. A log that does not exist yet reads as empty.
    async fn read_all(&self) -> Result<String>;

    /// Append `lines` (without newlines) in a single write and flush them.
    ///
    /// If the existing log does not end with a newline one is inserted first,
    /// so appended lines never merge into the last existing line.
    async fn append(&self, lock: &WriterLock, lines: &[String]) -> Result<()>;

    /// Human-readable location, for logs and reports.
    fn location(&self) -> String;
}

/// Join lines into the bytes of one append.
pub(crate) fn render_append(existing_ends_with_newline: bool, lines: &[String]) -> String {
    let mut buf = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum::<usize>() + 1);
    if !existing_ends_with_newline {
        buf.push('\n');
    }
    for line in lines {
        buf.push_str(line);
        buf.push('\n');
    }
    buf
}
