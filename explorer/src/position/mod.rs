//! # Position Module
//!
//! Everything that turns a board position into a storage key, plus the
//! seam to the external rules engine.
//!
//! ```text
//! key.rs    — PositionKey, the 16-byte storage key
//! hasher.rs — PositionHasher trait and the keyed BLAKE3 implementation
//! rules.rs  — Rules trait (legal moves and successor positions)
//! ```

pub mod hasher;
pub mod key;
pub mod rules;

pub use hasher::{Blake3PositionHasher, CanonicalPosition, PositionHasher};
pub use key::{InvalidPositionKey, PositionKey};
pub use rules::Rules;
