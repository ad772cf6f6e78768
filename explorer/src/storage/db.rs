//! # PositionStore — Persistent Storage Engine
//!
//! The persistence layer of the explorer, built on sled's embedded ordered
//! key-value store. Every statistic on disk flows through this module.
//!
//! ## Tree Layout
//!
//! | Tree        | Key                    | Value                       |
//! |-------------|------------------------|-----------------------------|
//! | `positions` | `PositionKey` (16B)    | `codec::encode(StatEntry)`  |
//! | `games`     | `GameId` (8B ASCII)    | `codec::encode_game(game)`  |
//!
//! sled keeps keys in lexicographic byte order, so prefix and range scans
//! over position keys come for free. A missing key means "no games"; the
//! store never writes explicit empty records or tombstones.
//!
//! ## Atomicity
//!
//! Updates are an optimistic read-combine-CAS loop per key: read the
//! current bytes, decode, combine, and compare-and-swap against the bytes
//! that were read. If another writer got there first the loop retries with
//! the fresh value. Writers of different keys never wait on each other and
//! no update is ever lost.
//!
//! There is no atomicity across keys. A failure halfway through
//! [`PositionStore::update_many`] leaves the earlier keys updated.
//!
//! ## Lifecycle
//!
//! The store is opened explicitly and closed explicitly. Every operation
//! holds the lifecycle lock shared; [`PositionStore::close`] takes it
//! exclusively, so it waits for in-flight operations, flushes, and releases
//! the trees. Operations after `close` fail with [`StoreError::Closed`].

use std::collections::BTreeSet;

use parking_lot::RwLock;
use sled::{Db, Tree};
use tracing::{debug, info, warn};

use crate::config::{StoreConfig, GAMES_TREE, POSITIONS_TREE};
use crate::position::PositionKey;
use crate::stats::codec::{self, DecodeError};
use crate::stats::{GameId, GameReference, StatEntry};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O failure, corruption detected by sled, or resource exhaustion.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// A stored record does not decode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("store is closed")]
    Closed,
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// StoreStats
// ---------------------------------------------------------------------------

/// Size report of an open store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub positions: usize,
    pub games: usize,
    pub size_on_disk: u64,
}

// ---------------------------------------------------------------------------
// PositionStore
// ---------------------------------------------------------------------------

struct Trees {
    db: Db,
    positions: Tree,
    games: Tree,
}

/// Persistent position statistics store.
///
/// Share it across threads with `Arc<PositionStore>`; all methods take
/// `&self`.
pub struct PositionStore {
    trees: RwLock<Option<Trees>>,
}

impl PositionStore {
    /// Open or create a store as described by `config`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .flush_every_ms(config.flush_interval.map(|d| d.as_millis() as u64))
            .mode(sled::Mode::HighThroughput)
            .temporary(config.temporary)
            .open()?;
        let store = Self::from_db(db)?;
        info!(path = %config.path.display(), "position store opened");
        Ok(store)
    }

    /// A store that lives in a temporary directory and disappears when
    /// dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let positions = db.open_tree(POSITIONS_TREE)?;
        let games = db.open_tree(GAMES_TREE)?;
        Ok(Self {
            trees: RwLock::new(Some(Trees {
                db,
                positions,
                games,
            })),
        })
    }

    /// Run `f` against the open trees, holding the lifecycle lock shared.
    fn with_trees<T>(&self, f: impl FnOnce(&Trees) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.trees.read();
        let trees = guard.as_ref().ok_or(StoreError::Closed)?;
        f(trees)
    }

    // -- Position operations ------------------------------------------------

    /// Statistics stored for `key`, or `None` if no game reached it.
    pub fn get(&self, key: &PositionKey) -> StoreResult<Option<StatEntry>> {
        self.with_trees(|trees| match trees.positions.get(key)? {
            Some(bytes) => decode_entry(key, &bytes).map(Some),
            None => Ok(None),
        })
    }

    /// Atomically replace the entry at `key` with `f(current)`.
    ///
    /// `f` may run more than once when writers race on the same key, so it
    /// must be a pure function of its input. Returns the entry written.
    pub fn update_with<F>(&self, key: &PositionKey, f: F) -> StoreResult<StatEntry>
    where
        F: Fn(StatEntry) -> StatEntry,
    {
        self.with_trees(|trees| update_in(&trees.positions, key, &f))
    }

    /// Fold every `(key, game)` pair into the store.
    ///
    /// Games sharing a key are combined first, then each distinct key gets
    /// one atomic read-combine-write. Returns the number of distinct keys
    /// written. Stops at the first error; keys before it stay updated.
    pub fn update_many(
        &self,
        updates: &BTreeSet<(PositionKey, GameReference)>,
    ) -> StoreResult<usize> {
        self.with_trees(|trees| {
            let mut written = 0;
            let mut pending: Option<(PositionKey, StatEntry)> = None;

            // The set iterates in key order, so equal keys are adjacent.
            for (key, game) in updates {
                let single = StatEntry::from_game_ref(game);
                pending = match pending.take() {
                    Some((pending_key, delta)) if pending_key == *key => {
                        Some((pending_key, delta.combine(single)))
                    }
                    Some((pending_key, delta)) => {
                        let apply = |e: StatEntry| e.combine(delta.clone());
                        update_in(&trees.positions, &pending_key, &apply)?;
                        written += 1;
                        Some((*key, single))
                    }
                    None => Some((*key, single)),
                };
            }

            if let Some((key, delta)) = pending {
                let apply = |e: StatEntry| e.combine(delta.clone());
                update_in(&trees.positions, &key, &apply)?;
                written += 1;
            }

            debug!(keys = written, pairs = updates.len(), "update batch applied");
            Ok(written)
        })
    }

    /// All positions whose key starts with `prefix`, in key order.
    ///
    /// Materializes the whole range; keep prefixes selective.
    pub fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(PositionKey, StatEntry)>> {
        self.with_trees(|trees| {
            let mut out = Vec::new();
            for item in trees.positions.scan_prefix(prefix) {
                let (raw_key, bytes) = item?;
                let key = PositionKey::from_slice(&raw_key).map_err(|_| {
                    DecodeError::Malformed(format!("stored key of {} bytes", raw_key.len()))
                })?;
                out.push((key, decode_entry(&key, &bytes)?));
            }
            Ok(out)
        })
    }

    // -- Game ledger --------------------------------------------------------

    /// Record `game` as indexed unless its id is already present.
    ///
    /// Returns `true` if this call inserted the record. Exactly one of any
    /// number of concurrent claims for the same id wins.
    pub fn claim_game(&self, game: &GameReference) -> StoreResult<bool> {
        self.with_trees(|trees| {
            let record = codec::encode_game(game);
            let claimed = trees
                .games
                .compare_and_swap(game.id.as_bytes(), None::<&[u8]>, Some(record))?
                .is_ok();
            Ok(claimed)
        })
    }

    /// Forget a claimed game so a later import can run again.
    pub fn release_game(&self, id: &GameId) -> StoreResult<()> {
        self.with_trees(|trees| {
            trees.games.remove(id.as_bytes())?;
            Ok(())
        })
    }

    /// Ledger record for `id`, if the game was claimed.
    pub fn game(&self, id: &GameId) -> StoreResult<Option<GameReference>> {
        self.with_trees(|trees| match trees.games.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(codec::decode_game(&bytes)?)),
            None => Ok(None),
        })
    }

    // -- Utility operations -------------------------------------------------

    /// Counts and on-disk size. Counting walks both trees, so this is an
    /// operator tool, not a hot-path call.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        self.with_trees(|trees| {
            Ok(StoreStats {
                positions: trees.positions.len(),
                games: trees.games.len(),
                size_on_disk: trees.db.size_on_disk()?,
            })
        })
    }

    /// Block until all writes so far are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.with_trees(|trees| {
            trees.db.flush()?;
            Ok(())
        })
    }

    /// Flush and release the store.
    ///
    /// Waits for in-flight operations. Idempotent: closing a closed store
    /// succeeds. If the final flush fails the store stays open and the
    /// error is returned, so buffered writes are never dropped silently.
    pub fn close(&self) -> StoreResult<()> {
        let mut guard = self.trees.write();
        let Some(trees) = guard.as_ref() else {
            return Ok(());
        };
        let flushed = trees.db.flush()?;
        guard.take();
        info!(flushed_bytes = flushed, "position store closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.trees.read().is_none()
    }

    #[cfg(test)]
    pub(crate) fn put_raw(&self, key: &PositionKey, bytes: &[u8]) {
        self.with_trees(|trees| {
            trees.positions.insert(key, bytes)?;
            Ok(())
        })
        .expect("raw insert");
    }
}

impl std::fmt::Debug for PositionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionStore")
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn decode_entry(key: &PositionKey, bytes: &[u8]) -> StoreResult<StatEntry> {
    codec::decode(bytes).map_err(|e| {
        warn!(%key, error = %e, "corrupt position record");
        StoreError::Decode(e)
    })
}

/// The per-key read-combine-CAS loop.
fn update_in<F>(tree: &Tree, key: &PositionKey, f: &F) -> StoreResult<StatEntry>
where
    F: Fn(StatEntry) -> StatEntry,
{
    let mut current = tree.get(key)?;
    loop {
        let entry = match &current {
            Some(bytes) => decode_entry(key, bytes)?,
            None => StatEntry::empty(),
        };
        let updated = f(entry);
        let proposed = (!updated.is_empty()).then(|| codec::encode(&updated));

        match tree.compare_and_swap(key, current.as_ref(), proposed)? {
            Ok(()) => return Ok(updated),
            Err(conflict) => current = conflict.current,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
