//! # CLI Interface
//!
//! Defines the command-line argument structure for `explorer-node` using
//! `clap` derive. Supports five subcommands: `init`, `import`, `probe`,
//! `stats`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use opening_explorer::config::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_INDEXER_QUEUE_CAPACITY, DEFAULT_INDEXER_WORKERS,
};
use opening_explorer::{PositionKey, StoreConfig};

/// Opening explorer store operator.
///
/// Creates, fills and inspects the position statistics store behind a
/// chess opening explorer.
#[derive(Parser, Debug)]
#[command(
    name = "explorer-node",
    about = "Opening explorer store operator",
    version,
    propagate_version = true
)]
pub struct ExplorerNodeCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "EXPLORER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the explorer node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and an empty store.
    Init(StoreArgs),
    /// Import a JSON-lines game file.
    Import(ImportArgs),
    /// Print the statistics stored for one position key.
    Probe(ProbeArgs),
    /// Print position count, game count and size on disk.
    Stats(StoreArgs),
    /// Print version information and exit.
    Version,
}

/// Where the store lives and how it is opened.
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Path to the store directory. Created on first use.
    #[arg(long, short = 'd', env = "EXPLORER_DATA_DIR", default_value = "explorer-db")]
    pub data_dir: PathBuf,

    /// Page cache size in bytes.
    #[arg(long, env = "EXPLORER_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: u64,
}

impl StoreArgs {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.data_dir).cache_capacity(self.cache_capacity)
    }
}

/// Arguments for the `import` subcommand.
#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON-lines file, one game per line.
    pub file: PathBuf,

    /// Number of indexer workers.
    #[arg(long, env = "EXPLORER_INDEXERS", default_value_t = DEFAULT_INDEXER_WORKERS)]
    pub indexers: usize,

    /// Queue depth per indexer worker.
    #[arg(long, env = "EXPLORER_QUEUE_CAPACITY", default_value_t = DEFAULT_INDEXER_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Skip games whose id was imported before.
    #[arg(long, env = "EXPLORER_DEDUP")]
    pub dedup: bool,
}

/// Arguments for the `probe` subcommand.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Position key as 32 hex characters.
    pub key: PositionKey,
}
