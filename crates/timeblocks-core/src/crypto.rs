//! Hash algorithms for file digests and commitments.
//!
//! Wraps the SHA-2 family and Blake3 behind one streaming [`Hasher`] so the
//! replayer, the block builder and the file digester never branch on names.

use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Digest;

/// A supported hashing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HashAlgorithm {
    Sha224,
    /// Implied by a log that carries no `#hashing` marker.
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake3,
    ];

    /// The name used in `#hashing` markers and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Output length in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Output length as hex characters.
    pub const fn hex_len(self) -> usize {
        self.output_len() * 2
    }

    /// Start a streaming hash.
    pub fn hasher(self) -> Hasher {
        Hasher::new(self)
    }

    /// Hash a complete buffer.
    pub fn hash(self, data: &[u8]) -> Digest {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        HashAlgorithm::ALL
            .into_iter()
            .find(|algo| algo.name() == wanted)
            .ok_or_else(|| CoreError::UnknownAlgorithm(s.to_owned()))
    }
}

impl TryFrom<String> for HashAlgorithm {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HashAlgorithm> for String {
    fn from(algo: HashAlgorithm) -> Self {
        algo.name().to_owned()
    }
}

/// Running hash state for one of the supported algorithms.
#[derive(Clone)]
pub struct Hasher {
    state: HasherState,
}

#[derive(Clone)]
enum HasherState {
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    /// Create an empty hash state.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha224 => HasherState::Sha224(sha2::Sha224::new()),
            HashAlgorithm::Sha256 => HasherState::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => HasherState::Sha384(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => HasherState::Sha512(sha2::Sha512::new()),
            HashAlgorithm::Blake3 => HasherState::Blake3(Box::new(blake3::Hasher::new())),
        };
        Self { state }
    }

    /// The algorithm of this state.
    pub fn algorithm(&self) -> HashAlgorithm {
        match self.state {
            HasherState::Sha224(_) => HashAlgorithm::Sha224,
            HasherState::Sha256(_) => HashAlgorithm::Sha256,
            HasherState::Sha384(_) => HashAlgorithm::Sha384,
            HasherState::Sha512(_) => HashAlgorithm::Sha512,
            HasherState::Blake3(_) => HashAlgorithm::Blake3,
        }
    }

    /// Fold more bytes into the state.
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HasherState::Sha224(h) => h.update(data),
            HasherState::Sha256(h) => h.update(data),
            HasherState::Sha384(h) => h.update(data),
            HasherState::Sha512(h) => h.update(data),
            HasherState::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> Digest {
        match self.state {
            HasherState::Sha224(h) => Digest::from_bytes(&h.finalize()),
            HasherState::Sha256(h) => Digest::from_bytes(&h.finalize()),
            HasherState::Sha384(h) => Digest::from_bytes(&h.finalize()),
            HasherState::Sha512(h) => Digest::from_bytes(&h.finalize()),
            HasherState::Blake3(h) => Digest::from_bytes(h.finalize().as_bytes()),
        }
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hasher({})", self.algorithm())
    }
}
