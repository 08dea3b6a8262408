//! # Timeblocks Core
//!
//! Pure primitives for the timestamp log: digests, hash algorithms, the log
//! line grammar, chain replay and block construction.
//!
//! This crate contains no I/O, no storage, no networking. Everything here is
//! computation over log text and digests, so any reader holding a log file can
//! re-verify it with nothing but this crate.
//!
//! ## Key Types
//!
//! - [`Digest`] - Lowercase-hex content digest (file digest or commitment)
//! - [`HashAlgorithm`] - The closed set of supported algorithms
//! - [`ChainReplayer`] - Verifies a log and rebuilds its [`ChainState`]
//! - [`BlockBuilder`] - Assembles the next data line and its root
//! - [`Block`] - The immutable result handed to publishers
//!
//! ## Log Grammar
//!
//! ```text
//! #timehashblock v1                      (optional schema marker)
//! #hashing sha384                        (only when the algorithm changes)
//! 1700000000 <proper-root>? <last-root>? <digest> <digest> ...
//! #root <hash of the line above>
//! ```

pub mod block;
pub mod chain;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod replay;
pub mod types;

pub use block::{build_block, Block, BlockBuilder};
pub use chain::{ChainPointers, ChainState, HistoryMode};
pub use crypto::{HashAlgorithm, Hasher};
pub use entry::{DataLine, LogEntry, LogLine, SCHEMA_VERSION};
pub use error::{CoreError, ReplayError};
pub use replay::{replay, ChainReplayer, Replay};
pub use types::Digest;
