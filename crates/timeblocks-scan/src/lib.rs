//! # timeblocks scan
//!
//! Turns a directory tree into a sorted list of `(path, digest)` pairs.
//!
//! ## Key Types
//!
//! - [`PathMatcher`] - gitignore rules plus the implicit exclusions
//! - [`FileDigester`] - streaming hash of one file in 64 KiB chunks
//! - [`TreeScanner`] - walk, filter and digest a tree in parallel
//! - [`ScanOutput`] - the digested files and any per-file warnings
//!
//! Unreadable files never abort a scan. They are reported as
//! [`ScanWarning`]s and left out of the output.

pub mod digest;
pub mod error;
pub mod matcher;
pub mod scanner;

pub use digest::{FileDigester, CHUNK_SIZE};
pub use error::{Result, ScanError, ScanWarning};
pub use matcher::PathMatcher;
pub use scanner::{ScanOutput, ScannedFile, TreeScanner};

pub use tokio_util::sync::CancellationToken;
