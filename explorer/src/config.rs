//! # Explorer Configuration & Constants
//!
//! Every magic number of the explorer core lives here. Some of these are
//! part of the persisted format (key width, entry format version, hasher
//! context) and changing them orphans existing data. The rest are tuning
//! knobs with defaults picked for a store of tens of millions of positions.

use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Persisted Format
// ---------------------------------------------------------------------------

/// Width of a position key in bytes. 128 bits makes accidental collisions
/// between distinct positions negligible at any realistic corpus size.
pub const POSITION_KEY_LENGTH: usize = 16;

/// Leading byte of every encoded stat entry. Bump on any layout change.
pub const ENTRY_FORMAT_VERSION: u8 = 1;

/// Upper bound on the size of one encoded stat entry. Anything bigger is
/// treated as corrupt rather than allocated.
pub const MAX_ENTRY_BYTES: u64 = 4 * 1024;

/// Number of most recent games remembered per position.
pub const MAX_RECENT_GAMES: usize = 15;

/// Length of a game id (lichess style, alphanumeric).
pub const GAME_ID_LENGTH: usize = 8;

/// Largest representable year. `MAX_YEAR * 12 + 11` still fits in a u16.
pub const MAX_YEAR: u16 = 3000;

/// BLAKE3 key derivation context for standard chess position keys. Other
/// variants must use a different context so their keyspaces never overlap.
pub const STANDARD_HASHER_CONTEXT: &str = "opening-explorer 2026-01 standard position key";

// ---------------------------------------------------------------------------
// Store Layout
// ---------------------------------------------------------------------------

/// Tree holding `PositionKey -> encoded StatEntry`.
pub const POSITIONS_TREE: &str = "positions";

/// Tree holding `GameId -> encoded GameRecord` for deduplicated imports.
pub const GAMES_TREE: &str = "games";

/// Page cache budget. Sized so the hot part of a ~50M position working set
/// stays resident.
pub const DEFAULT_CACHE_CAPACITY: u64 = 1024 * 1024 * 1024;

/// Background flush interval.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Default number of concurrent import workers.
pub const DEFAULT_INDEXER_WORKERS: usize = 16;

/// Default per-worker queue depth. A full queue rejects instead of blocking
/// the submitter when using `try_submit`.
pub const DEFAULT_INDEXER_QUEUE_CAPACITY: usize = 500;

/// Log progress every this many games per worker.
pub const INDEXER_PROGRESS_INTERVAL: u64 = 1024;

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Settings for opening a [`PositionStore`](crate::storage::PositionStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory of the store. Created if absent.
    pub path: PathBuf,
    /// Page cache budget in bytes.
    pub cache_capacity: u64,
    /// Background flush interval. `None` disables periodic flushing; data
    /// then only becomes durable on `flush()` or `close()`.
    pub flush_interval: Option<Duration>,
    /// Remove the store when the last handle drops. Tests only.
    pub temporary: bool,
}

impl StoreConfig {
    /// Default settings for a store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            flush_interval: Some(DEFAULT_FLUSH_INTERVAL),
            temporary: false,
        }
    }

    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    pub fn flush_interval(mut self, interval: Option<Duration>) -> Self {
        self.flush_interval = interval;
        self
    }
}

// ---------------------------------------------------------------------------
// IndexerConfig
// ---------------------------------------------------------------------------

/// Sizing of the import worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Number of workers. Clamped to at least one.
    pub workers: usize,
    /// Queue depth per worker. Clamped to at least one.
    pub queue_capacity: usize,
    /// Use the deduplicating import path (claims the game id first).
    pub dedup: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_INDEXER_WORKERS,
            queue_capacity: DEFAULT_INDEXER_QUEUE_CAPACITY,
            dedup: false,
        }
    }
}
