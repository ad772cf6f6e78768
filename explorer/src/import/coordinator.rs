//! # ImportCoordinator — Write Side
//!
//! Turns "this game visited these positions" into position statistics.
//!
//! Two paths:
//!
//! - [`ImportCoordinator::merge_game`] applies the game unconditionally.
//!   Merging the same game twice counts it twice; callers that replay input
//!   must deduplicate themselves.
//! - [`ImportCoordinator::import_game`] first claims the game id in the
//!   ledger and skips games that were already claimed.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::position::PositionKey;
use crate::stats::GameReference;
use crate::storage::{PositionStore, StoreResult};

/// Result of [`ImportCoordinator::import_game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The ledger already knew the game; nothing was written.
    AlreadyIndexed,
    /// The game was applied to this many distinct positions.
    Indexed { positions: usize },
}

/// Applies games to the store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ImportCoordinator {
    store: Arc<PositionStore>,
}

impl ImportCoordinator {
    pub fn new(store: Arc<PositionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<PositionStore> {
        &self.store
    }

    /// Add `game` to every distinct position in `positions`.
    ///
    /// Repeated keys count once. Returns the number of distinct positions
    /// updated. On error, positions before the failing key stay updated.
    pub fn merge_game<I>(&self, game: &GameReference, positions: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = PositionKey>,
    {
        let updates: BTreeSet<(PositionKey, GameReference)> =
            positions.into_iter().map(|key| (key, *game)).collect();
        let written = self.store.update_many(&updates)?;
        debug!(game = %game.id, positions = written, "merged game");
        Ok(written)
    }

    /// Like [`merge_game`](Self::merge_game), but at most once per game id.
    ///
    /// If the merge fails the claim is released so a retry can run; keys
    /// updated before the failure will then be counted again.
    pub fn import_game<I>(&self, game: &GameReference, positions: I) -> StoreResult<ImportOutcome>
    where
        I: IntoIterator<Item = PositionKey>,
    {
        if !self.store.claim_game(game)? {
            debug!(game = %game.id, "already indexed");
            return Ok(ImportOutcome::AlreadyIndexed);
        }

        match self.merge_game(game, positions) {
            Ok(positions) => Ok(ImportOutcome::Indexed { positions }),
            Err(err) => {
                warn!(game = %game.id, error = %err, "merge failed, releasing claim");
                if let Err(release_err) = self.store.release_game(&game.id) {
                    warn!(game = %game.id, error = %release_err, "could not release claim");
                }
                Err(err)
            }
        }
    }
}
