//! In-memory implementation of the LogStore trait.
//!
//! This is primarily for testing. It has the same append and locking
//! semantics as [`FileLog`](crate::FileLog) but keeps the text in memory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::traits::{render_append, LogStore, WriterLock};

/// In-memory log. Clones share the same contents and lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    text: Arc<Mutex<String>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that already contains `text`.
    pub fn with_contents(text: impl Into<String>) -> Self {
        Self {
            text: Arc::new(Mutex::new(text.into())),
            writer: Arc::default(),
        }
    }

    /// Snapshot of the current contents.
    pub async fn contents(&self) -> String {
        self.text.lock().await.clone()
    }
}

#[async_trait]
impl LogStore for MemoryLog {
    async fn lock(&self, timeout: Duration) -> Result<WriterLock> {
        match tokio::time::timeout(timeout, self.writer.clone().lock_owned()).await {
            Ok(guard) => Ok(WriterLock::memory(guard)),
            Err(_) => Err(StoreError::LockTimeout {
                path: "<memory>".into(),
                waited: timeout,
            }),
        }
    }

    async fn read_all(&self) -> Result<String> {
        Ok(self.contents().await)
    }

    async fn append(&self, _lock: &WriterLock, lines: &[String]) -> Result<()> {
        let mut text = self.text.lock().await;
        let ends_with_newline = text.is_empty() || text.ends_with('\n');
        text.push_str(&render_append(ends_with_newline, lines));
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_shared_between_clones() {
        let log = MemoryLog::new();
        let view = log.clone();

        let lock = log.lock(Duration::from_secs(1)).await.unwrap();
        log.append(&lock, &["1 aa".to_string()]).await.unwrap();

        assert_eq!(view.read_all().await.unwrap(), "1 aa\n");
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let log = MemoryLog::new();
        let _held = log.lock(Duration::from_secs(1)).await.unwrap();
        let err = log.lock(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout { .. }));
    }

    #[tokio::test]
    async fn test_with_contents() {
        let log = MemoryLog::with_contents("# seeded");
        let lock = log.lock(Duration::from_secs(1)).await.unwrap();
        log.append(&lock, &["x".to_string()]).await.unwrap();
        assert_eq!(log.contents().await, "# seeded\nx\n");
    }
}
