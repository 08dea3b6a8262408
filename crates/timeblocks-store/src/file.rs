//! File-backed log with an advisory writer lock.
//!
//! The lock lives in a sidecar file `<log>.lock` next to the log, so readers
//! that only open the log itself are never blocked. Blocking file I/O runs on
//! `spawn_blocking` to keep the async runtime responsive.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fs2::FileExt;
use tracing::{debug, trace};

use crate::error::{Result, StoreError};
use crate::traits::{render_append, LogStore, WriterLock};

/// How long to sleep between lock attempts.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Path of the lock sidecar for a log file.
pub fn lock_path_for(log_path: &Path) -> PathBuf {
    let mut name: OsString = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    log_path.with_file_name(name)
}

/// An exclusively locked sidecar file. Unlocked on drop.
#[derive(Debug)]
pub(crate) struct FileGuard {
    file: File,
    path: PathBuf,
}

impl FileGuard {
    fn try_acquire(path: &Path) -> io::Result<Option<Self>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(_) => Ok(None),
        }
    }

    async fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let start = Instant::now();
        loop {
            if let Some(guard) = Self::try_acquire(path)? {
                trace!(path = %path.display(), waited = ?start.elapsed(), "acquired writer lock");
                return Ok(guard);
            }
            if start.elapsed() >= timeout {
                return Err(StoreError::LockTimeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }
            tokio::time::sleep(LOCK_POLL_INTERVAL).await;
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        trace!(path = %self.path.display(), "released writer lock");
    }
}

/// A log stored in a plain text file.
#[derive(Debug, Clone)]
pub struct FileLog {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileLog {
    /// Open the log at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        Self { path, lock_path }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock sidecar.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

#[async_trait]
impl LogStore for FileLog {
    async fn lock(&self, timeout: Duration) -> Result<WriterLock> {
        FileGuard::acquire(&self.lock_path, timeout)
            .await
            .map(WriterLock::file)
    }

    async fn read_all(&self) -> Result<String> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_log(&path))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn append(&self, _lock: &WriterLock, lines: &[String]) -> Result<()> {
        let path = self.path.clone();
        let lines = lines.to_vec();
        tokio::task::spawn_blocking(move || append_log(&path, &lines))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn read_log(path: &Path) -> Result<String> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8(bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn append_log(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;

    let ends_with_newline = match file.metadata()?.len() {
        0 => true,
        len => {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(len - 1))?;
            file.read_exact(&mut last)?;
            last[0] == b'\n'
        }
    };

    let buf = render_append(ends_with_newline, lines);
    file.write_all(buf.as_bytes())?;
    file.sync_all()?;

    debug!(path = %path.display(), lines = lines.len(), bytes = buf.len(), "appended to log");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lock_path_for() {
        assert_eq!(
            lock_path_for(Path::new("/tmp/x/timestampblocks.log")),
            PathBuf::from("/tmp/x/timestampblocks.log.lock")
        );
    }

    #[tokio::test]
    async fn test_missing_log_reads_empty() {
        let dir = TempDir::new().unwrap();
        let log = FileLog::new(dir.path().join("missing.log"));
        assert_eq!(log.read_all().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let dir = TempDir::new().unwrap();
        let log = FileLog::new(dir.path().join("t.log"));

        let lock = log.lock(Duration::from_secs(1)).await.unwrap();
        log.append(&lock, &lines(&["1 aa", "#root bb"])).await.unwrap();
        log.append(&lock, &lines(&["2 bb", "#root cc"])).await.unwrap();
        drop(lock);

        assert_eq!(
            log.read_all().await.unwrap(),
            "1 aa\n#root bb\n2 bb\n#root cc\n"
        );
    }

    #[tokio::test]
    async fn test_append_never_rewrites_existing_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.log");
        fs::write(&path, "# hand written").unwrap();

        let log = FileLog::new(&path);
        let lock = log.lock(Duration::from_secs(1)).await.unwrap();
        log.append(&lock, &lines(&["1 aa"])).await.unwrap();

        let text = log.read_all().await.unwrap();
        assert_eq!(text, "# hand written\n1 aa\n");
    }

    #[tokio::test]
    async fn test_second_writer_times_out() {
        let dir = TempDir::new().unwrap();
        let log = FileLog::new(dir.path().join("t.log"));
        let other = FileLog::new(dir.path().join("t.log"));

        let _held = log.lock(Duration::from_secs(1)).await.unwrap();
        let err = other.lock(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout { .. }));
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let log = FileLog::new(dir.path().join("t.log"));

        let first = log.lock(Duration::from_secs(1)).await.unwrap();
        drop(first);
        log.lock(Duration::from_millis(100)).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.log");
        fs::write(&path, [0xff, 0xfe]).unwrap();
        let err = FileLog::new(&path).read_all().await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidUtf8(_)));
    }
}
