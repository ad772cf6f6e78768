//! # StatEntry Wire Format
//!
//! ```text
//! +---------+-------------------------------------------+
//! | version | bincode(StatEntry)                        |
//! | 1 byte  | varint ints, little endian, no trailing   |
//! +---------+-------------------------------------------+
//! ```
//!
//! Decoding is strict. Empty input, an unknown version byte, truncated or
//! over-long input, trailing bytes, and entries that violate the
//! [`StatEntry`] invariants are all a [`DecodeError`]. Nothing decodes to a
//! default: a corrupt record shown as "no games" would be a silent lie.
//!
//! Game ledger records use the same options without a version byte.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ENTRY_FORMAT_VERSION, MAX_ENTRY_BYTES};

use super::entry::StatEntry;
use super::game::GameReference;

/// Stored bytes that are not a valid entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty record")]
    Empty,

    #[error("unsupported entry format version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("entry invariant violated: {0}")]
    Invariant(&'static str),
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_ENTRY_BYTES)
        .with_little_endian()
        .with_varint_encoding()
        .reject_trailing_bytes()
}

fn serialize_into<T: Serialize>(buf: &mut Vec<u8>, value: &T) {
    // Writing into a Vec only fails past MAX_ENTRY_BYTES, which the bounded
    // entry layout cannot reach.
    wire_options()
        .serialize_into(buf, value)
        .expect("stat entry exceeds MAX_ENTRY_BYTES");
}

fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    wire_options()
        .deserialize(bytes)
        .map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Encode an entry for storage.
pub fn encode(entry: &StatEntry) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.push(ENTRY_FORMAT_VERSION);
    serialize_into(&mut buf, entry);
    buf
}

/// Decode a stored entry.
pub fn decode(bytes: &[u8]) -> Result<StatEntry, DecodeError> {
    let (&version, body) = bytes.split_first().ok_or(DecodeError::Empty)?;
    if version != ENTRY_FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    let entry: StatEntry = deserialize(body)?;
    entry.check_invariants().map_err(DecodeError::Invariant)?;
    Ok(entry)
}

pub(crate) fn encode_game(game: &GameReference) -> Vec<u8> {
    let mut buf = Vec::with_capacity(24);
    serialize_into(&mut buf, game);
    buf
}

pub(crate) fn decode_game(bytes: &[u8]) -> Result<GameReference, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    deserialize(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_RECENT_GAMES;
    use crate::stats::entry::StatEntry;
    use crate::stats::game::Outcome;
    use crate::stats::testing::{game, reachable_entry};
    use proptest::prelude::*;

    fn sample_entry() -> StatEntry {
        [
            game("aaaaaaa1", Outcome::WhiteWins, "2019/05"),
            game("aaaaaaa2", Outcome::Draw, "2020/11"),
            game("aaaaaaa3", Outcome::BlackWins, "2020/11"),
        ]
        .iter()
        .map(StatEntry::from_game_ref)
        .sum()
    }

    #[test]
    fn round_trip_empty() {
        let bytes = encode(&StatEntry::empty());
        assert_eq!(bytes[0], ENTRY_FORMAT_VERSION);
        assert_eq!(decode(&bytes).unwrap(), StatEntry::empty());
    }

    #[test]
    fn round_trip_sample() {
        let entry = sample_entry();
        assert_eq!(decode(&encode(&entry)).unwrap(), entry);
    }

    #[test]
    fn encoding_is_compact() {
        // Varint tallies keep a typical entry well under a hundred bytes.
        let bytes = encode(&sample_entry());
        assert!(bytes.len() < 100, "entry took {} bytes", bytes.len());
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(decode(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = encode(&sample_entry());
        bytes[0] = 0xFF;
        assert_eq!(decode(&bytes), Err(DecodeError::UnsupportedVersion(0xFF)));
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = encode(&sample_entry());
        for cut in 1..bytes.len() {
            assert!(
                matches!(decode(&bytes[..cut]), Err(DecodeError::Malformed(_))),
                "prefix of {cut} bytes decoded"
            );
        }
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = encode(&sample_entry());
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn rejects_invalid_game_id_bytes() {
        let entry = StatEntry::from_game_ref(&game("aaaaaaa1", Outcome::Draw, "2020/01"));
        let mut bytes = encode(&entry);
        let pos = bytes
            .windows(8)
            .position(|w| w == b"aaaaaaa1")
            .expect("id bytes present");
        bytes[pos] = b'-';
        assert!(matches!(decode(&bytes), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn rejects_too_many_recent_games() {
        // Encode a list past the cap by hand; combine would never build one.
        let games: Vec<_> = (0..=MAX_RECENT_GAMES)
            .map(|i| crate::stats::entry::RecentGame::from(&game(
                &format!("game{:04}", 100 - i),
                Outcome::Draw,
                "2020/01",
            )))
            .collect();
        let mut bytes = vec![ENTRY_FORMAT_VERSION];
        serialize_into(
            &mut bytes,
            &(crate::stats::game::BySpeed::<crate::stats::entry::Stats>::default(), games),
        );
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::Invariant("too many recent games"))
        );
    }

    #[test]
    fn game_record_round_trip() {
        let g = game("Qa7FJNk2", Outcome::BlackWins, "2021/03");
        assert_eq!(decode_game(&encode_game(&g)).unwrap(), g);
        assert_eq!(decode_game(&[]), Err(DecodeError::Empty));
    }

    proptest! {
        #[test]
        fn round_trip(entry in reachable_entry()) {
            prop_assert_eq!(decode(&encode(&entry)).unwrap(), entry);
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            let _ = decode(&bytes);
        }
    }
}
