//! # ExplorerTree — Read Side
//!
//! Answers the two questions the opening explorer asks:
//!
//! 1. What happened in games through this position? ([`ExplorerTree::probe`])
//! 2. What happened after each legal reply? ([`ExplorerTree::probe_children`])
//!
//! Probes are plain point reads. Children are probed one after another with
//! no snapshot across them: a concurrent import may land between two child
//! reads, which is fine for a statistics display.

use std::sync::Arc;

use tracing::trace;

use crate::position::{Blake3PositionHasher, PositionHasher, PositionKey, Rules};
use crate::stats::StatEntry;
use crate::storage::{PositionStore, StoreError};

/// Errors from [`ExplorerTree::probe_children`].
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The rules collaborator rejected the position.
    #[error("rules error: {0}")]
    Rules(#[source] E),
}

/// One legal reply and the statistics of the position it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerNode<M> {
    pub mv: M,
    pub entry: StatEntry,
}

/// Read-only view of the store through the rules of one variant.
pub struct ExplorerTree<R, H = Blake3PositionHasher> {
    store: Arc<PositionStore>,
    rules: R,
    hasher: H,
}

impl<R, H> ExplorerTree<R, H>
where
    R: Rules,
    H: PositionHasher<R::Position>,
{
    pub fn new(store: Arc<PositionStore>, rules: R, hasher: H) -> Self {
        Self {
            store,
            rules,
            hasher,
        }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Statistics of `position`; empty if no game reached it.
    pub fn probe(&self, position: &R::Position) -> Result<StatEntry, StoreError> {
        self.probe_key(&self.hasher.hash(position))
    }

    /// Statistics under an already computed key.
    pub fn probe_key(&self, key: &PositionKey) -> Result<StatEntry, StoreError> {
        Ok(self.store.get(key)?.unwrap_or_default())
    }

    /// One node per legal move, in the order the rules return them.
    ///
    /// A rules or store failure aborts the whole call; no partial list is
    /// returned.
    pub fn probe_children(
        &self,
        position: &R::Position,
    ) -> Result<Vec<ExplorerNode<R::Move>>, ExplorerError<R::Error>> {
        let moves = self
            .rules
            .legal_moves(position)
            .map_err(ExplorerError::Rules)?;

        let mut children = Vec::with_capacity(moves.len());
        for (mv, child) in moves {
            let entry = self.probe(&child)?;
            children.push(ExplorerNode { mv, entry });
        }

        trace!(children = children.len(), "probed children");
        Ok(children)
    }
}
