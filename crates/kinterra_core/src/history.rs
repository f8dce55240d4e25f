use chrono::Utc;
use kinterra_data::EpisodeStats;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

#[derive(Serialize)]
struct EpisodeRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    stats: &'a EpisodeStats,
}

/// Append-only JSONL sink for per-episode aggregates.
pub struct EpisodeLogger {
    file: Option<BufWriter<File>>,
}

impl EpisodeLogger {
    pub fn new_at(dir: &str) -> anyhow::Result<Self> {
        if !std::path::Path::new(dir).exists() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(format!("{}/episodes.jsonl", dir))?;
        Ok(Self {
            file: Some(BufWriter::new(file)),
        })
    }

    /// A logger that drops everything; used when no log dir is configured
    /// and throughout the test suite.
    #[must_use]
    pub fn new_dummy() -> Self {
        Self { file: None }
    }

    pub fn log(&mut self, stats: &EpisodeStats) -> anyhow::Result<()> {
        if let Some(ref mut file) = self.file {
            let record = EpisodeRecord {
                timestamp: Utc::now().to_rfc3339(),
                stats,
            };
            writeln!(file, "{}", serde_json::to_string(&record)?)?;
            file.flush()?;
        }
        Ok(())
    }
}

/// Initialize tracing subscriber for logging.
pub fn init_logging() {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::INFO)
            .finish(),
    )
    .ok();
}
