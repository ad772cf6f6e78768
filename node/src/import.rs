//! # JSON-Lines Import
//!
//! Reads a game file line by line and hands each game to the indexer.
//!
//! ```text
//! {"id":"Qa7FJNk2","outcome":"white","speed":"blitz","month":"2021/03","rating":1850,
//!  "positions":["<32 hex chars>", ...]}
//! ```
//!
//! Malformed lines are logged and counted, never fatal. I/O errors are.

use std::future::Future;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use opening_explorer::{
    GameId, GameReference, ImportJob, Indexer, Month, Outcome, PositionKey, Speed,
};

/// One line of the import file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GameLine {
    id: GameId,
    outcome: Outcome,
    speed: Speed,
    month: Month,
    rating: u16,
    positions: Vec<PositionKey>,
}

impl From<GameLine> for ImportJob {
    fn from(line: GameLine) -> Self {
        ImportJob {
            game: GameReference {
                id: line.id,
                outcome: line.outcome,
                speed: line.speed,
                month: line.month,
                rating: line.rating,
            },
            positions: line.positions,
        }
    }
}

pub fn parse_line(line: &str) -> serde_json::Result<ImportJob> {
    serde_json::from_str::<GameLine>(line).map(ImportJob::from)
}

/// What [`feed_file`] saw.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    pub lines: u64,
    pub rejected: u64,
    /// `shutdown` fired before the end of the file.
    pub interrupted: bool,
}

/// Submit every game in `path` to `indexer`, stopping early when
/// `shutdown` completes.
pub async fn feed_file(
    path: &Path,
    indexer: &Indexer,
    shutdown: impl Future<Output = ()>,
) -> Result<FeedSummary> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    tokio::pin!(shutdown);

    let mut summary = FeedSummary::default();
    loop {
        let line = tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::warn!(lines = summary.lines, "shutdown signal received, draining indexer");
                summary.interrupted = true;
                break;
            }
            line = lines.next_line() => {
                line.with_context(|| format!("failed to read {}", path.display()))?
            }
        };
        let Some(line) = line else { break };
        summary.lines += 1;

        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(job) => indexer
                .submit(job)
                .await
                .context("indexer stopped accepting games")?,
            Err(err) => {
                summary.rejected += 1;
                tracing::warn!(line = summary.lines, error = %err, "skipping malformed game line");
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use opening_explorer::{
        Blake3PositionHasher, ImportCoordinator, IndexerConfig, PositionHasher, PositionStore,
    };

    fn line(id: &str, outcome: &str, positions: &[PositionKey]) -> String {
        let positions: Vec<String> = positions.iter().map(PositionKey::to_hex).collect();
        serde_json::json!({
            "id": id,
            "outcome": outcome,
            "speed": "blitz",
            "month": "2021/03",
            "rating": 1850,
            "positions": positions,
        })
        .to_string()
    }

    #[test]
    fn parses_a_game_line() {
        let key = Blake3PositionHasher::standard().hash("start");
        let job = parse_line(&line("Qa7FJNk2", "draw", &[key])).unwrap();
        assert_eq!(job.game.id.as_str(), "Qa7FJNk2");
        assert_eq!(job.game.outcome, Outcome::Draw);
        assert_eq!(job.game.month.to_string(), "2021/03");
        assert_eq!(job.positions, vec![key]);
    }

    #[test]
    fn rejects_bad_fields() {
        assert!(parse_line(r#"{"id":"short"}"#).is_err());
        assert!(parse_line(&line("Qa7FJNk2", "maybe", &[])).is_err());
        let bad_key = line("Qa7FJNk2", "draw", &[]).replace("[]", r#"["abc"]"#);
        assert!(parse_line(&bad_key).is_err());
    }

    #[tokio::test]
    async fn feeds_file_into_store() {
        let start = Blake3PositionHasher::standard().hash("start");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", line("aaaaaaa1", "white", &[start])).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, "{}", line("bbbbbbb2", "draw", &[start])).unwrap();
        file.flush().unwrap();

        let store = Arc::new(PositionStore::open_temporary().unwrap());
        let indexer = Indexer::spawn(
            ImportCoordinator::new(Arc::clone(&store)),
            IndexerConfig::default(),
        );

        let summary = feed_file(file.path(), &indexer, std::future::pending())
            .await
            .unwrap();
        let report = indexer.shutdown().await;

        assert_eq!(
            summary,
            FeedSummary {
                lines: 4,
                rejected: 1,
                interrupted: false
            }
        );
        assert_eq!(report.indexed, 2);

        let total = store.get(&start).unwrap().unwrap().total();
        assert_eq!((total.white, total.draws, total.black), (1, 1, 0));
    }

    #[tokio::test]
    async fn stops_when_shutdown_fires() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", line("aaaaaaa1", "white", &[])).unwrap();
        file.flush().unwrap();

        let store = Arc::new(PositionStore::open_temporary().unwrap());
        let indexer = Indexer::spawn(ImportCoordinator::new(store), IndexerConfig::default());

        let summary = feed_file(file.path(), &indexer, std::future::ready(()))
            .await
            .unwrap();
        indexer.shutdown().await;

        assert!(summary.interrupted);
        assert_eq!(summary.lines, 0);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let store = Arc::new(PositionStore::open_temporary().unwrap());
        let indexer = Indexer::spawn(ImportCoordinator::new(store), IndexerConfig::default());
        let err = feed_file(Path::new("/nonexistent/games.jsonl"), &indexer, std::future::pending())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to open"));
        indexer.shutdown().await;
    }
}
