//! Strong type definitions for Timeblocks.
//!
//! Digests are kept as lowercase hex text because the log stores them that
//! way and equality is byte-exact on the serialized form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A lowercase-hex digest: either a file digest or a commitment (root).
///
/// The algorithm is not part of the value; it is implied by the `#hashing`
/// marker in effect where the digest appears.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Encode raw hash output.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse from hex string.
    ///
    /// Only lowercase hex of even, non-zero length is accepted.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        if Self::is_well_formed(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(CoreError::InvalidDigest(s.to_owned()))
        }
    }

    /// Wrap a raw log token without validation.
    ///
    /// Used for the legacy history mode, where every token of a data line is
    /// remembered whether or not it is a digest.
    pub(crate) fn from_token(token: &str) -> Self {
        Self(token.to_owned())
    }

    /// Check whether `s` is lowercase hex of even, non-zero length.
    pub fn is_well_formed(s: &str) -> bool {
        !s.is_empty()
            && s.len() % 2 == 0
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// The hex text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 16 hex characters, for log output.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(16)]
    }

    /// Consume into the hex string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Digest {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_well_formed(&s) {
            Ok(Self(s))
        } else {
            Err(CoreError::InvalidDigest(s))
        }
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}
