//! # Position Hashing
//!
//! Maps a board position to its [`PositionKey`]. The mapping must be pure
//! and stable across processes, machines and releases: the key is the only
//! link between a position and its statistics on disk.
//!
//! The shipped hasher is keyed BLAKE3 truncated to 128 bits. The key is
//! derived from a context string, which gives every variant (standard,
//! chess960, crazyhouse, ...) its own keyspace inside the same store.
//!
//! There is no collision detection. Two distinct positions sharing a key
//! would silently share statistics; at 128 bits that is not a practical
//! concern.

use crate::config::{POSITION_KEY_LENGTH, STANDARD_HASHER_CONTEXT};

use super::key::PositionKey;

/// Canonical byte encoding of a position.
///
/// Implementations must write everything that makes two positions
/// different under the rules (piece placement, side to move, castling
/// rights, en-passant square, repetition state) and nothing that doesn't
/// (move counters, how the position was reached). Equal positions must
/// produce identical bytes.
pub trait CanonicalPosition {
    fn write_canonical(&self, buf: &mut Vec<u8>);
}

/// Deterministic position to key mapping.
pub trait PositionHasher<P: ?Sized> {
    fn hash(&self, position: &P) -> PositionKey;
}

impl CanonicalPosition for [u8] {
    fn write_canonical(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}

impl CanonicalPosition for str {
    fn write_canonical(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }
}

impl<T: CanonicalPosition + ?Sized> CanonicalPosition for &T {
    fn write_canonical(&self, buf: &mut Vec<u8>) {
        (**self).write_canonical(buf);
    }
}

// ---------------------------------------------------------------------------
// Blake3PositionHasher
// ---------------------------------------------------------------------------

/// Keyed BLAKE3 over the canonical encoding, truncated to 128 bits.
#[derive(Clone)]
pub struct Blake3PositionHasher {
    key: [u8; 32],
}

impl Blake3PositionHasher {
    /// Hasher for the keyspace named by `context`.
    pub fn new(context: &str) -> Self {
        Self {
            key: blake3::derive_key(context, b""),
        }
    }

    /// Hasher for standard chess.
    pub fn standard() -> Self {
        Self::new(STANDARD_HASHER_CONTEXT)
    }

    /// Hash raw canonical bytes.
    pub fn hash_bytes(&self, canonical: &[u8]) -> PositionKey {
        let digest = blake3::keyed_hash(&self.key, canonical);
        let mut bytes = [0u8; POSITION_KEY_LENGTH];
        bytes.copy_from_slice(&digest.as_bytes()[..POSITION_KEY_LENGTH]);
        PositionKey::from_bytes(bytes)
    }
}

impl Default for Blake3PositionHasher {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Blake3PositionHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blake3PositionHasher").finish_non_exhaustive()
    }
}

impl<P: CanonicalPosition + ?Sized> PositionHasher<P> for Blake3PositionHasher {
    fn hash(&self, position: &P) -> PositionKey {
        let mut buf = Vec::with_capacity(96);
        position.write_canonical(&mut buf);
        self.hash_bytes(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";
    const E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -";

    #[test]
    fn same_position_same_key() {
        let hasher = Blake3PositionHasher::standard();
        assert_eq!(hasher.hash(START_FEN), hasher.hash(START_FEN));
        // A second instance with the same context agrees.
        assert_eq!(
            hasher.hash(START_FEN),
            Blake3PositionHasher::standard().hash(START_FEN)
        );
    }

    #[test]
    fn different_positions_different_keys() {
        let hasher = Blake3PositionHasher::standard();
        assert_ne!(hasher.hash(START_FEN), hasher.hash(E4_FEN));
    }

    #[test]
    fn contexts_separate_keyspaces() {
        let standard = Blake3PositionHasher::standard();
        let chess960 = Blake3PositionHasher::new("opening-explorer 2026-01 chess960 position key");
        assert_ne!(standard.hash(START_FEN), chess960.hash(START_FEN));
    }

    #[test]
    fn str_and_bytes_agree() {
        let hasher = Blake3PositionHasher::standard();
        assert_eq!(hasher.hash(START_FEN), hasher.hash(START_FEN.as_bytes()));
        assert_eq!(hasher.hash(START_FEN), hasher.hash_bytes(START_FEN.as_bytes()));
    }

    #[test]
    fn key_is_truncated_keyed_digest() {
        let key = Blake3PositionHasher::new("test").hash_bytes(b"");
        let expected = {
            let derived = blake3::derive_key("test", b"");
            let digest = blake3::keyed_hash(&derived, b"");
            hex::encode(&digest.as_bytes()[..16])
        };
        assert_eq!(key.to_hex(), expected);
    }
}
