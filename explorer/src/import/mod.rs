//! # Import Module
//!
//! The write side of the explorer.
//!
//! - **coordinator** — applies one game to the positions it visited, with
//!   an optional once-per-game-id path backed by the game ledger.
//! - **indexer** — a sharded pool of tokio workers in front of the
//!   coordinator, with bounded queues for backpressure.

pub mod coordinator;
pub mod indexer;

pub use coordinator::{ImportCoordinator, ImportOutcome};
pub use indexer::{ImportJob, Indexer, IndexerReport, SubmitError};
