//! Run statistics collected by the reducer.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Counters accumulated over one run.
#[derive(Debug)]
pub struct RunStats {
    started: Instant,
    articles: u64,
    failed: u64,
    skipped_lines: u64,
    dropped_tables: u64,
    latency_total: Duration,
}

/// Summary written to the stats file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Articles written.
    pub articles: u64,
    /// Wall-clock seconds for the whole run.
    #[serde(rename = "overall (s)")]
    pub overall_secs: f64,
    /// Mean seconds from dispatch to flush per delivered result.
    #[serde(rename = "latency_mean (s)")]
    pub latency_mean_secs: f64,
    /// Records that failed to decode or render.
    pub failed: u64,
    /// Input lines dropped before indexing.
    pub skipped_lines: u64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Starts the run clock.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            articles: 0,
            failed: 0,
            skipped_lines: 0,
            dropped_tables: 0,
            latency_total: Duration::ZERO,
        }
    }

    /// Counts one written article.
    pub fn record_article(&mut self, latency: Duration, dropped_tables: usize) {
        self.articles += 1;
        self.dropped_tables += dropped_tables as u64;
        self.latency_total += latency;
    }

    /// Counts one failed record. The reason is logged by the caller.
    pub fn record_failure(&mut self, latency: Duration) {
        self.failed += 1;
        self.latency_total += latency;
    }

    /// Sets the number of input lines the reader dropped.
    pub fn set_skipped_lines(&mut self, skipped: u64) {
        self.skipped_lines = skipped;
    }

    /// Articles written so far.
    pub fn articles(&self) -> u64 {
        self.articles
    }

    /// Failed records so far.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Tables dropped across all written articles.
    pub fn dropped_tables(&self) -> u64 {
        self.dropped_tables
    }

    /// Snapshot of the counters.
    pub fn summary(&self) -> StatsSummary {
        let delivered = self.articles + self.failed;
        let latency_mean_secs = if delivered == 0 {
            0.0
        } else {
            self.latency_total.as_secs_f64() / delivered as f64
        };
        StatsSummary {
            articles: self.articles,
            overall_secs: self.started.elapsed().as_secs_f64(),
            latency_mean_secs,
            failed: self.failed,
            skipped_lines: self.skipped_lines,
        }
    }

    /// Logs the summary.
    pub fn report(&self) {
        let summary = self.summary();
        info!(
            articles = summary.articles,
            failed = summary.failed,
            skipped_lines = summary.skipped_lines,
            dropped_tables = self.dropped_tables,
            overall_s = summary.overall_secs,
            latency_mean_s = summary.latency_mean_secs,
            "extraction finished"
        );
    }
}

impl StatsSummary {
    /// Writes the summary as JSON to `path`.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string(self).map_err(io::Error::from)?;
        fs::write(path, json)
    }
}
