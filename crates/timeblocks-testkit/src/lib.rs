//! # timeblocks testkit
//!
//! Testing utilities for timeblocks.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: [`TestTree`], a temporary tree with helpers to build engines over it
//! - **Vectors**: known-good logs built exactly the way the engine appends
//! - **Generators**: Proptest strategies for trees, digests and timestamps
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use timeblocks::HashAlgorithm;
//! use timeblocks_testkit::TestTree;
//!
//! # async fn example() {
//! let tree = TestTree::new();
//! tree.write("a", "x").write("b", "y");
//! let report = tree.engine(HashAlgorithm::Sha256).update().await.unwrap();
//! assert!(report.appended);
//! # }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{init_tracing, TestTree};
pub use vectors::{append_entry, build_log, two_file_scenario, EntrySpec};
