//! Tree scanning: walk, filter, digest.
//!
//! The walk itself is sequential and prunes ignored directories before
//! descending into them. Digesting is the expensive part and runs on the
//! rayon pool. The output is sorted by path so runs are reproducible.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::WalkDir;

use timeblocks_core::{Digest, HashAlgorithm};

use crate::digest::FileDigester;
use crate::error::{Result, ScanError, ScanWarning};
use crate::matcher::PathMatcher;

/// One digested file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Path relative to the scan root.
    pub path: PathBuf,
    pub digest: Digest,
}

/// Everything a scan produced.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Digested files, sorted by path.
    pub files: Vec<ScannedFile>,
    /// Files and directories that could not be read.
    pub warnings: Vec<ScanWarning>,
}

impl ScanOutput {
    /// Distinct digests across all files. Identical content at two paths
    /// yields one digest.
    pub fn digests(&self) -> BTreeSet<Digest> {
        self.files.iter().map(|f| f.digest.clone()).collect()
    }
}

/// Walks a tree and digests every file the matcher lets through.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    root: PathBuf,
    matcher: PathMatcher,
    digester: FileDigester,
    cancel: CancellationToken,
}

enum Outcome {
    Digested(ScannedFile),
    Unreadable(ScanWarning),
    Skipped,
}

impl TreeScanner {
    /// Scanner for the tree at `root`.
    pub fn new(root: impl Into<PathBuf>, matcher: PathMatcher) -> Self {
        Self {
            root: root.into(),
            matcher,
            digester: FileDigester::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `digester` instead of the default one.
    pub fn digester(mut self, digester: FileDigester) -> Self {
        self.digester = digester;
        self
    }

    /// Stop between files once `cancel` fires.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree and digest every included regular file with `algorithm`.
    ///
    /// This blocks; async callers should run it on `spawn_blocking`.
    pub fn scan(&self, algorithm: HashAlgorithm) -> Result<ScanOutput> {
        if !self.root.is_dir() {
            return Err(ScanError::RootMissing(self.root.clone()));
        }

        let mut warnings = Vec::new();
        let candidates = self.collect_candidates(&mut warnings)?;
        debug!(root = %self.root.display(), candidates = candidates.len(), "walked tree");

        let files = self.digest_candidates(&candidates, algorithm, &mut warnings)?;

        for warning in &warnings {
            warn!(path = %warning.path.display(), reason = %warning.reason, "file unreadable, skipped");
        }
        debug!(files = files.len(), warnings = warnings.len(), %algorithm, "digested tree");

        Ok(ScanOutput { files, warnings })
    }

    /// Digest `candidates` on the rayon pool. A file that cannot be read
    /// becomes a warning and the rest are still digested.
    fn digest_candidates(
        &self,
        candidates: &[PathBuf],
        algorithm: HashAlgorithm,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<Vec<ScannedFile>> {
        let outcomes: Vec<Outcome> = candidates
            .par_iter()
            .map(|rel| {
                if self.cancel.is_cancelled() {
                    return Outcome::Skipped;
                }
                match self.digester.digest(&self.root.join(rel), algorithm) {
                    Ok(digest) => Outcome::Digested(ScannedFile {
                        path: rel.clone(),
                        digest,
                    }),
                    Err(e) => Outcome::Unreadable(ScanWarning {
                        path: rel.clone(),
                        reason: e.to_string(),
                    }),
                }
            })
            .collect();

        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut files = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Outcome::Digested(file) => files.push(file),
                Outcome::Unreadable(warning) => warnings.push(warning),
                Outcome::Skipped => {}
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Tree-relative paths of every included regular file.
    fn collect_candidates(&self, warnings: &mut Vec<ScanWarning>) -> Result<Vec<PathBuf>> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let rel = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
                !self.matcher.matches(rel, entry.file_type().is_dir())
            });

        let mut candidates = Vec::new();
        for entry in walker {
            if self.cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| p.strip_prefix(&self.root).unwrap_or(p).to_path_buf())
                        .unwrap_or_default();
                    warnings.push(ScanWarning {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_path_buf();

            let file_type = entry.file_type();
            let is_file = if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(meta) => meta.is_file(),
                    Err(e) => {
                        warnings.push(ScanWarning {
                            path: rel,
                            reason: format!("broken symlink: {e}"),
                        });
                        continue;
                    }
                }
            } else {
                file_type.is_file()
            };
            if is_file {
                candidates.push(rel);
            }
        }
        Ok(candidates)
    }
}
