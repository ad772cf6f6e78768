// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Opening Explorer — Core Library
//!
//! The storage and aggregation core of a chess opening explorer: for every
//! position ever reached in an imported game, how often white won, how often
//! black won, how often it was drawn, and which games got there most
//! recently.
//!
//! The core knows nothing about chess. Positions come in through the
//! [`position::Rules`] and [`position::CanonicalPosition`] traits, games
//! come in as [`stats::GameReference`] values, and everything else is
//! bytes in a sled database.
//!
//! ## Architecture
//!
//! - **position** — 128-bit position keys and the hasher that makes them.
//! - **stats** — per-position statistics: a commutative monoid plus its
//!   strict binary codec.
//! - **storage** — the sled-backed store with atomic per-key updates.
//! - **import** — the write side: coordinator and indexer worker pool.
//! - **explorer** — the read side: probe a position or all of its children.
//! - **config** — constants and runtime settings.
//!
//! ## Design Philosophy
//!
//! 1. Statistics combine in any order. Import parallelism is free.
//! 2. Corrupt data is an error, never a silent zero.
//! 3. One store handle, shared by `Arc`, opened and closed explicitly.

pub mod config;
pub mod explorer;
pub mod import;
pub mod position;
pub mod stats;
pub mod storage;

pub use config::{IndexerConfig, StoreConfig};
pub use explorer::{ExplorerError, ExplorerNode, ExplorerTree};
pub use import::{ImportCoordinator, ImportJob, ImportOutcome, Indexer, IndexerReport, SubmitError};
pub use position::{Blake3PositionHasher, CanonicalPosition, PositionHasher, PositionKey, Rules};
pub use stats::{GameId, GameReference, Month, Outcome, Speed, StatEntry, Stats};
pub use storage::{PositionStore, StoreError, StoreResult, StoreStats};
