//! # Storage Module
//!
//! Persistent storage for the explorer. One sled database holds two trees:
//! position statistics and the ledger of indexed games.
//!
//! ## Design Decisions
//!
//! 1. **Keys are raw 16-byte position keys.** sled orders them
//!    lexicographically, which gives range and prefix scans for free and
//!    keeps the on-disk format identical to what older tooling expects.
//!
//! 2. **Values are opaque to the store.** The store decodes and encodes
//!    through [`crate::stats::codec`] and combines through
//!    [`StatEntry::combine`](crate::stats::StatEntry::combine); it never
//!    looks inside an entry.
//!
//! 3. **No global write lock.** Each key is updated with its own
//!    compare-and-swap loop.

pub mod db;

pub use db::{PositionStore, StoreError, StoreResult, StoreStats};
