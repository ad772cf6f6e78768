//! The 128-bit storage key of a position.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::POSITION_KEY_LENGTH;

/// Fixed-width key derived from a board position.
///
/// Ordering is plain lexicographic byte order, which is also the order the
/// store keeps keys in, so `BTreeSet<PositionKey>` iterates the way a range
/// scan would.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionKey([u8; POSITION_KEY_LENGTH]);

impl PositionKey {
    pub const fn from_bytes(bytes: [u8; POSITION_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; POSITION_KEY_LENGTH] {
        &self.0
    }

    /// Reinterpret a stored key. Fails unless `bytes` is exactly
    /// [`POSITION_KEY_LENGTH`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvalidPositionKey> {
        let array: [u8; POSITION_KEY_LENGTH] =
            bytes.try_into().map_err(|_| InvalidPositionKey)?;
        Ok(Self(array))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for PositionKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionKey({})", self.to_hex())
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PositionKey {
    type Err = InvalidPositionKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; POSITION_KEY_LENGTH];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidPositionKey)?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for PositionKey {
    type Error = InvalidPositionKey;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PositionKey> for String {
    fn from(key: PositionKey) -> String {
        key.to_hex()
    }
}

/// A string or byte slice that is not a 16-byte key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid position key: expected {} hex characters", POSITION_KEY_LENGTH * 2)]
pub struct InvalidPositionKey;
