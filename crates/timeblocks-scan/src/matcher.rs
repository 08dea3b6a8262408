//! Ignore rules: gitignore text compiled into a path predicate.
//!
//! Rules follow gitignore semantics. Later rules override earlier ones, `!`
//! re-includes, a trailing `/` only matches directories, `**` spans any
//! number of directories, and a rule matching a directory excludes
//! everything beneath it.

use std::env;
use std::path::{Component, Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

use crate::error::{Result, ScanError};

/// Directory that is never scanned, regardless of the rules.
const VCS_DIR: &str = ".git";

/// Compiled ignore rules for one tree.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    rules: Gitignore,
    /// Tree-relative paths that are always excluded (the log and its lock).
    always: Vec<PathBuf>,
}

impl PathMatcher {
    /// Compile `rule_lines` for the tree at `root`.
    ///
    /// `excluded` lists files that are always skipped, typically the log and
    /// its lock sidecar. They may be spelled differently from `root` (relative
    /// vs absolute, `..` segments, symlinked parents) and need not exist yet.
    /// Paths outside `root` are ignored.
    pub fn compile<I, S>(root: &Path, rule_lines: I, excluded: &[PathBuf]) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(root);
        let mut count = 0usize;
        for line in rule_lines {
            let line = line.as_ref();
            builder
                .add_line(None, line)
                .map_err(|e| ScanError::InvalidRule {
                    rule: line.to_owned(),
                    reason: e.to_string(),
                })?;
            count += 1;
        }
        let rules = builder.build().map_err(|e| ScanError::InvalidRule {
            rule: "<rule set>".to_owned(),
            reason: e.to_string(),
        })?;

        let resolved_root = resolve(root);
        let always = excluded
            .iter()
            .filter_map(|path| relative_to(&resolved_root, &resolve(path)))
            .collect::<Vec<_>>();

        debug!(rules = count, always = always.len(), "compiled ignore rules");
        Ok(Self { rules, always })
    }

    /// A matcher with no rules besides the implicit exclusions.
    pub fn empty(root: &Path, excluded: &[PathBuf]) -> Result<Self> {
        Self::compile(root, std::iter::empty::<&str>(), excluded)
    }

    /// Whether the tree-relative `path` is excluded from scanning.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        if path.as_os_str().is_empty() {
            return false;
        }
        if path.components().next().map(|c| c.as_os_str()) == Some(VCS_DIR.as_ref()) {
            return true;
        }
        if self.always.iter().any(|p| p == path) {
            return true;
        }
        self.rules
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }
}

/// `path` relative to `root`, if it lies inside it. Both must be resolved.
fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.to_path_buf())
}

/// One absolute spelling of `path`.
///
/// Existing paths are canonicalized. A missing file is resolved through its
/// parent directory so a log that does not exist yet still compares equal to
/// the one written later.
fn resolve(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    if let Ok(canonical) = absolute.canonicalize() {
        return canonical;
    }

    let cleaned = normalize(&absolute);
    match (cleaned.parent(), cleaned.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => parent.join(name),
            Err(_) => cleaned,
        },
        _ => cleaned,
    }
}

/// Drop `.` segments and fold `..` into the preceding segment.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(rules: &[&str]) -> PathMatcher {
        PathMatcher::compile(
            Path::new("/tree"),
            rules.iter().copied(),
            &[PathBuf::from("/tree/timestampblocks.log")],
        )
        .unwrap()
    }

    #[test]
    fn test_log_always_excluded() {
        let m = matcher(&[]);
        assert!(m.matches(Path::new("timestampblocks.log"), false));
        assert!(!m.matches(Path::new("notes.txt"), false));
    }

    #[test]
    fn test_git_dir_excluded() {
        let m = matcher(&[]);
        assert!(m.matches(Path::new(".git"), true));
        assert!(m.matches(Path::new(".git/HEAD"), false));
        assert!(!m.matches(Path::new(".gitignore"), false));
    }

    #[test]
    fn test_later_rules_override() {
        let m = matcher(&["*.log", "!keep.log"]);
        assert!(m.matches(Path::new("debug.log"), false));
        assert!(!m.matches(Path::new("keep.log"), false));
    }

    #[test]
    fn test_directory_only_rule() {
        let m = matcher(&["build/"]);
        assert!(m.matches(Path::new("build"), true));
        assert!(!m.matches(Path::new("build"), false));
    }

    #[test]
    fn test_parent_match_excludes_children() {
        let m = matcher(&["target/"]);
        assert!(m.matches(Path::new("target/debug/app"), false));
    }

    #[test]
    fn test_double_star() {
        let m = matcher(&["**/cache"]);
        assert!(m.matches(Path::new("cache"), true));
        assert!(m.matches(Path::new("a/b/cache"), true));
        assert!(m.matches(Path::new("a/b/cache/entry"), false));
    }

    #[test]
    fn test_comments_and_blank_lines_are_not_rules() {
        let m = matcher(&["# *.txt", "", "   "]);
        assert!(!m.matches(Path::new("a.txt"), false));
    }

    #[test]
    fn test_relative_root_and_log() {
        let m = PathMatcher::empty(Path::new("."), &[PathBuf::from("./timestampblocks.log")]).unwrap();
        assert!(m.matches(Path::new("timestampblocks.log"), false));
    }

    #[test]
    fn test_excluded_spelled_differently_from_root() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let root = dir.path().join("sub").join("..");
        let excluded = [
            dir.path().join("timestampblocks.log"),
            dir.path().join("sub/../timestampblocks.log.lock"),
        ];

        let m = PathMatcher::empty(&root, &excluded).unwrap();
        assert!(m.matches(Path::new("timestampblocks.log"), false));
        assert!(m.matches(Path::new("timestampblocks.log.lock"), false));
        assert!(!m.matches(Path::new("sub"), true));
    }

    #[test]
    fn test_missing_excluded_under_missing_dir() {
        let m = PathMatcher::empty(
            Path::new("/tree"),
            &[PathBuf::from("/tree/logs/../timestampblocks.log")],
        )
        .unwrap();
        assert!(m.matches(Path::new("timestampblocks.log"), false));
    }

    #[test]
    fn test_excluded_outside_root_is_dropped() {
        let m = PathMatcher::empty(Path::new("/tree"), &[PathBuf::from("/elsewhere/t.log")]).unwrap();
        assert!(!m.matches(Path::new("t.log"), false));
    }
}
