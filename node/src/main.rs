// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Opening Explorer Node
//!
//! Entry point for the `explorer-node` binary. Parses CLI arguments,
//! initializes logging, opens the store and runs one operator command.
//!
//! The binary supports five subcommands:
//!
//! - `init`    — create the data directory and an empty store
//! - `import`  — feed a JSON-lines game file through the indexer
//! - `probe`   — print one position's statistics as JSON
//! - `stats`   — print store counts and size on disk
//! - `version` — print build version information

mod cli;
mod import;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use opening_explorer::config::ENTRY_FORMAT_VERSION;
use opening_explorer::{ImportCoordinator, IndexerConfig, PositionStore};

use cli::{Commands, ExplorerNodeCli, StoreArgs};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ExplorerNodeCli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    logging::init_logging(
        logging::DEFAULT_DIRECTIVES,
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::Init(args) => init_store(args),
        Commands::Import(args) => import_games(args).await,
        Commands::Probe(args) => probe_position(args),
        Commands::Stats(args) => print_stats(args),
        Commands::Version => Ok(()),
    }
}

/// Creates the data directory if needed and opens the store there.
fn open_store(args: &StoreArgs) -> Result<Arc<PositionStore>> {
    let data_dir = &args.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let store = PositionStore::open(&args.store_config())
        .with_context(|| format!("failed to open store at {}", data_dir.display()))?;
    Ok(Arc::new(store))
}

fn close_store(store: &PositionStore) -> Result<()> {
    store.close().context("failed to close store")
}

/// Creates an empty store and closes it again.
fn init_store(args: StoreArgs) -> Result<()> {
    tracing::info!(data_dir = %args.data_dir.display(), "initializing store");

    let store = open_store(&args)?;
    let stats = store.stats().context("failed to read store stats")?;
    close_store(&store)?;

    println!("Store initialized successfully.");
    println!("  Data directory : {}", args.data_dir.display());
    println!("  Positions      : {}", stats.positions);
    println!("  Games          : {}", stats.games);

    Ok(())
}

/// Streams a JSON-lines file through the indexer, then drains and closes.
async fn import_games(args: cli::ImportArgs) -> Result<()> {
    tracing::info!(
        file = %args.file.display(),
        data_dir = %args.store.data_dir.display(),
        indexers = args.indexers,
        dedup = args.dedup,
        "starting import"
    );

    let store = open_store(&args.store)?;
    let indexer = opening_explorer::Indexer::spawn(
        ImportCoordinator::new(Arc::clone(&store)),
        IndexerConfig {
            workers: args.indexers,
            queue_capacity: args.queue_capacity,
            dedup: args.dedup,
        },
    );

    // Drain and close even when feeding stopped early.
    let fed = import::feed_file(&args.file, &indexer, shutdown_signal()).await;
    let report = indexer.shutdown().await;
    close_store(&store)?;
    let summary = fed?;

    println!("Import finished.");
    println!("  Lines read     : {}", summary.lines);
    println!("  Rejected lines : {}", summary.rejected);
    println!("  Indexed games  : {}", report.indexed);
    println!("  Skipped games  : {}", report.skipped);
    println!("  Failed games   : {}", report.failed);
    if summary.interrupted {
        println!("  Interrupted    : yes");
    }

    Ok(())
}

/// Prints the statistics of one position key as JSON.
fn probe_position(args: cli::ProbeArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let entry = store
        .get(&args.key)
        .with_context(|| format!("failed to read position {}", args.key))?
        .unwrap_or_default();
    close_store(&store)?;

    let output = serde_json::json!({
        "key": args.key,
        "total": entry.total(),
        "entry": entry,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to encode probe output")?
    );
    Ok(())
}

fn print_stats(args: StoreArgs) -> Result<()> {
    let store = open_store(&args)?;
    let stats = store.stats().context("failed to read store stats")?;
    close_store(&store)?;

    println!("Positions    : {}", stats.positions);
    println!("Games        : {}", stats.games);
    println!("Size on disk : {} bytes", stats.size_on_disk);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("explorer-node {}", env!("CARGO_PKG_VERSION"));
    println!("entry format  {}", ENTRY_FORMAT_VERSION);
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
