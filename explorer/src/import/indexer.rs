//! # Indexer — Bounded Import Worker Pool
//!
//! Feeds games into an [`ImportCoordinator`] from async code without ever
//! blocking the runtime on store I/O.
//!
//! ```text
//!              ┌──────────────┐   hash(game id) % workers
//!  submit ───► │   Indexer    │ ─────────────┬──────────────┐
//!              └──────────────┘              ▼              ▼
//!                                     [queue 0: 500]  [queue 1: 500] ...
//!                                            │              │
//!                                     worker 0 task   worker 1 task
//!                                            │              │
//!                                     spawn_blocking  spawn_blocking
//!                                            └──── store ───┘
//! ```
//!
//! Every worker owns one bounded queue. A given game id always lands on the
//! same worker, so two submissions of one game are never applied in
//! parallel. A failed job is logged and counted; the worker moves on.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::{IndexerConfig, INDEXER_PROGRESS_INTERVAL};
use crate::position::PositionKey;
use crate::stats::GameReference;

use super::coordinator::{ImportCoordinator, ImportOutcome};

/// One game and the positions it visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportJob {
    pub game: GameReference,
    pub positions: Vec<PositionKey>,
}

/// Why a job was not queued. The job is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("indexer queue is full")]
    QueueFull,

    #[error("indexer worker is gone")]
    Closed,
}

/// Job counters across all workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexerReport {
    /// Games applied to the store.
    pub indexed: u64,
    /// Games the ledger already knew (deduplicating mode only).
    pub skipped: u64,
    /// Games whose import returned an error.
    pub failed: u64,
}

impl IndexerReport {
    pub fn processed(&self) -> u64 {
        self.indexed + self.skipped + self.failed
    }
}

#[derive(Default)]
struct Counters {
    indexed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> IndexerReport {
        IndexerReport {
            indexed: self.indexed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Handle to a running worker pool.
///
/// Must be created inside a tokio runtime. Call [`Indexer::shutdown`] to
/// drain; dropping the handle closes the queues but does not wait.
pub struct Indexer {
    txs: Vec<mpsc::Sender<ImportJob>>,
    workers: Vec<JoinHandle<()>>,
    random_state: RandomState,
    counters: Arc<Counters>,
}

impl Indexer {
    pub fn spawn(coordinator: ImportCoordinator, config: IndexerConfig) -> Indexer {
        let num_workers = config.workers.max(1);
        let queue_capacity = config.queue_capacity.max(1);
        let counters = Arc::new(Counters::default());

        let mut txs = Vec::with_capacity(num_workers);
        let mut workers = Vec::with_capacity(num_workers);
        for idx in 0..num_workers {
            let (tx, rx) = mpsc::channel(queue_capacity);
            txs.push(tx);
            workers.push(tokio::spawn(
                Worker {
                    idx,
                    rx,
                    coordinator: coordinator.clone(),
                    dedup: config.dedup,
                    counters: Arc::clone(&counters),
                }
                .run(),
            ));
        }

        info!(
            workers = num_workers,
            queue_capacity,
            dedup = config.dedup,
            "indexer started"
        );

        Indexer {
            txs,
            workers,
            random_state: RandomState::new(),
            counters,
        }
    }

    fn responsible_worker(&self, game: &GameReference) -> usize {
        (self.random_state.hash_one(game.id) % self.txs.len() as u64) as usize
    }

    /// Queue `job` without waiting.
    pub fn try_submit(&self, job: ImportJob) -> Result<(), SubmitError> {
        let idx = self.responsible_worker(&job.game);
        match self.txs[idx].try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                error!(
                    worker = idx,
                    game = %job.game.id,
                    "not queuing game because indexer queue is full"
                );
                Err(SubmitError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(SubmitError::Closed),
        }
    }

    /// Queue `job`, waiting for room in the worker's queue.
    pub async fn submit(&self, job: ImportJob) -> Result<(), SubmitError> {
        let idx = self.responsible_worker(&job.game);
        self.txs[idx]
            .send(job)
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// Counters so far. Jobs still queued are not included.
    pub fn report(&self) -> IndexerReport {
        self.counters.snapshot()
    }

    /// Close the queues, wait for every queued job to finish and return the
    /// final counters.
    pub async fn shutdown(self) -> IndexerReport {
        let Indexer {
            txs,
            workers,
            counters,
            ..
        } = self;
        drop(txs);

        for (idx, worker) in workers.into_iter().enumerate() {
            if let Err(err) = worker.await {
                error!(worker = idx, error = %err, "indexer worker died");
            }
        }

        let report = counters.snapshot();
        info!(
            indexed = report.indexed,
            skipped = report.skipped,
            failed = report.failed,
            "indexer drained"
        );
        report
    }
}

struct Worker {
    idx: usize,
    rx: mpsc::Receiver<ImportJob>,
    coordinator: ImportCoordinator,
    dedup: bool,
    counters: Arc<Counters>,
}

impl Worker {
    async fn run(mut self) {
        let mut num_jobs: u64 = 0;
        while let Some(job) = self.rx.recv().await {
            self.process(job).await;

            num_jobs += 1;
            if num_jobs % INDEXER_PROGRESS_INTERVAL == 0 {
                info!(worker = self.idx, games = num_jobs, "indexer progress");
            }
        }
        debug!(worker = self.idx, games = num_jobs, "indexer worker finished");
    }

    async fn process(&self, job: ImportJob) {
        let coordinator = self.coordinator.clone();
        let dedup = self.dedup;
        let id = job.game.id;

        let result = tokio::task::spawn_blocking(move || {
            if dedup {
                coordinator.import_game(&job.game, job.positions)
            } else {
                coordinator
                    .merge_game(&job.game, job.positions)
                    .map(|positions| ImportOutcome::Indexed { positions })
            }
        })
        .await;

        match result {
            Ok(Ok(ImportOutcome::Indexed { .. })) => {
                self.counters.indexed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Ok(ImportOutcome::AlreadyIndexed)) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(err)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(worker = self.idx, game = %id, error = %err, "import failed");
            }
            Err(err) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(worker = self.idx, game = %id, error = %err, "import task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Blake3PositionHasher, PositionHasher};
    use crate::stats::testing::game;
    use crate::stats::Outcome;
    use crate::storage::PositionStore;

    fn coordinator() -> ImportCoordinator {
        ImportCoordinator::new(Arc::new(PositionStore::open_temporary().unwrap()))
    }

    fn job(id: &str, outcome: Outcome, fens: &[&str]) -> ImportJob {
        let hasher = Blake3PositionHasher::standard();
        ImportJob {
            game: game(id, outcome, "2022/07"),
            positions: fens.iter().map(|fen| hasher.hash(*fen)).collect(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn all_submitted_jobs_are_applied_after_shutdown() {
        let coordinator = coordinator();
        let indexer = Indexer::spawn(
            coordinator.clone(),
            IndexerConfig {
                workers: 4,
                queue_capacity: 8,
                dedup: false,
            },
        );

        for i in 0..100 {
            let outcome = if i % 2 == 0 { Outcome::WhiteWins } else { Outcome::Draw };
            indexer
                .submit(job(&format!("game{:04}", i), outcome, &["start", "e4"]))
                .await
                .unwrap();
        }

        let report = indexer.shutdown().await;
        assert_eq!(report.indexed, 100);
        assert_eq!(report.failed, 0);

        let start = Blake3PositionHasher::standard().hash("start");
        let total = coordinator.store().get(&start).unwrap().unwrap().total();
        assert_eq!(total.white, 50);
        assert_eq!(total.draws, 50);
        assert_eq!(total.black, 0);
    }

    #[tokio::test]
    async fn dedup_mode_skips_repeated_games() {
        let indexer = Indexer::spawn(
            coordinator(),
            IndexerConfig {
                workers: 2,
                queue_capacity: 4,
                dedup: true,
            },
        );

        let j = job("aaaaaaa1", Outcome::BlackWins, &["start"]);
        indexer.submit(j.clone()).await.unwrap();
        indexer.submit(j).await.unwrap();

        let report = indexer.shutdown().await;
        assert_eq!(
            report,
            IndexerReport {
                indexed: 1,
                skipped: 1,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn failures_are_counted_and_workers_keep_going() {
        let coordinator = coordinator();
        let indexer = Indexer::spawn(
            coordinator.clone(),
            IndexerConfig {
                workers: 1,
                queue_capacity: 4,
                dedup: false,
            },
        );

        let bad = job("aaaaaaa1", Outcome::WhiteWins, &["corrupt"]);
        coordinator.store().put_raw(&bad.positions[0], &[0xff]);

        indexer.submit(bad).await.unwrap();
        indexer
            .submit(job("bbbbbbb2", Outcome::Draw, &["fine"]))
            .await
            .unwrap();

        let report = indexer.shutdown().await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.indexed, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn try_submit_reports_full_queue() {
        let indexer = Indexer::spawn(
            coordinator(),
            IndexerConfig {
                workers: 1,
                queue_capacity: 1,
                dedup: false,
            },
        );

        // The single-threaded runtime cannot run the worker until this task
        // yields, so the first job fills the queue.
        indexer
            .try_submit(job("aaaaaaa1", Outcome::Draw, &["start"]))
            .unwrap();
        assert_eq!(
            indexer.try_submit(job("bbbbbbb2", Outcome::Draw, &["start"])),
            Err(SubmitError::QueueFull)
        );

        let report = indexer.shutdown().await;
        assert_eq!(report.indexed, 1);
    }

    #[tokio::test]
    async fn zero_sized_config_is_clamped() {
        let indexer = Indexer::spawn(
            coordinator(),
            IndexerConfig {
                workers: 0,
                queue_capacity: 0,
                dedup: false,
            },
        );
        indexer
            .submit(job("aaaaaaa1", Outcome::Draw, &["start"]))
            .await
            .unwrap();
        assert_eq!(indexer.shutdown().await.indexed, 1);
    }
}
