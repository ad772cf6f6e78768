//! # Stats Module
//!
//! The aggregation side of the explorer: what a game contributes to a
//! position, how contributions combine, and how the result is stored.
//!
//! ```text
//! month.rs — Month, the time resolution of game references
//! game.rs  — GameId, Outcome, Speed, GameReference
//! entry.rs — Stats, RecentGame, StatEntry (the commutative monoid)
//! codec.rs — strict binary encoding of StatEntry
//! ```

pub mod codec;
pub mod entry;
pub mod game;
pub mod month;

pub use codec::{decode, encode, DecodeError};
pub use entry::{RecentGame, StatEntry, Stats};
pub use game::{
    BySpeed, GameId, GameReference, InvalidGameId, InvalidOutcome, InvalidSpeed, Outcome, Speed,
};
pub use month::{InvalidMonth, Month};
