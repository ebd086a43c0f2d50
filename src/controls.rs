//! Command-line flags and the run settings derived from them.

use crate::writer::ShardLimits;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;
use tracing_subscriber::EnvFilter;
use wiki_parser::ExtractConfig;

/// Rendering used for each output line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// `<doc>`-wrapped plain text.
    Text,
}

impl OutputFormat {
    /// File suffix for shards in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "jsonl",
            Self::Text => "txt",
        }
    }
}

/// Where rendered records go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output, unsharded.
    Stdout,
    /// Rotating shards under a root directory.
    Directory(PathBuf),
}

/// Settings for one extraction run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineControls {
    /// Gzip-compressed dump to read.
    pub input: PathBuf,
    /// Output destination.
    pub output: OutputTarget,
    /// Output rendering.
    pub format: OutputFormat,
    /// Extraction switches passed to every worker.
    pub extract: ExtractConfig,
    /// Stop after this many records.
    pub dev_limit: Option<usize>,
    /// Worker threads.
    pub workers: usize,
    /// Shard size caps.
    pub limits: ShardLimits,
    /// Where the run summary is written.
    pub stats_path: PathBuf,
}

/// Command-line interface of `fastdump-extract`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fastdump-extract",
    version,
    about = "Extract articles from a Wikimedia Enterprise HTML dump"
)]
pub struct Cli {
    /// Gzip-compressed dump (.json.gz or .json.tar.gz)
    #[arg(env = "FASTDUMP_INPUT")]
    pub input: PathBuf,

    /// Root directory for sharded output
    #[arg(
        long,
        env = "FASTDUMP_OUTPUT",
        default_value = "out",
        conflicts_with = "stdout"
    )]
    pub output: PathBuf,

    /// Write records to stdout instead of shard files
    #[arg(long, env = "FASTDUMP_STDOUT", default_value_t = false)]
    pub stdout: bool,

    /// Extract tables and infoboxes
    #[arg(long, env = "FASTDUMP_INCLUDE_TABLES", default_value_t = false)]
    pub include_tables: bool,

    /// Keep lists as body text
    #[arg(long, env = "FASTDUMP_INCLUDE_LISTS", default_value_t = false)]
    pub include_lists: bool,

    /// Reserved; accepted for compatibility
    #[arg(long, env = "FASTDUMP_INCLUDE_LINKS", default_value_t = false)]
    pub include_links: bool,

    /// Emit JSON lines (the default; wins over --html)
    #[arg(long, env = "FASTDUMP_JSON", default_value_t = false)]
    pub json: bool,

    /// Emit <doc>-wrapped text
    #[arg(long, env = "FASTDUMP_HTML", default_value_t = false)]
    pub html: bool,

    /// Process at most this many records
    #[arg(long, env = "FASTDUMP_DEV")]
    pub dev: Option<usize>,

    /// Worker threads (0 = available parallelism)
    #[arg(long, env = "FASTDUMP_PROCESSES", default_value_t = 0)]
    pub processes: usize,

    /// Bytes per shard file before rotating
    #[arg(long, env = "FASTDUMP_MAX_SHARD_BYTES", default_value_t = 20 * 1024)]
    pub max_shard_bytes: u64,

    /// Shard files per numbered directory
    #[arg(long, env = "FASTDUMP_MAX_FILES_PER_DIR", default_value_t = 100)]
    pub max_files_per_dir: u32,

    /// Path of the JSON run summary
    #[arg(long, env = "FASTDUMP_STATS", default_value = "stats.csv")]
    pub stats: PathBuf,
}

impl Cli {
    /// Converts the parsed CLI into `PipelineControls`.
    pub fn build_controls(&self) -> PipelineControls {
        PipelineControls {
            input: self.input.clone(),
            output: if self.stdout {
                OutputTarget::Stdout
            } else {
                OutputTarget::Directory(self.output.clone())
            },
            format: self.output_format(),
            extract: ExtractConfig {
                include_tables: self.include_tables,
                include_lists: self.include_lists,
                include_links: self.include_links,
            },
            dev_limit: self.dev,
            workers: self.worker_count(),
            limits: ShardLimits {
                max_shard_bytes: self.max_shard_bytes,
                max_files_per_directory: self.max_files_per_dir,
            },
            stats_path: self.stats.clone(),
        }
    }

    /// Text only when `--html` is given without `--json`.
    pub fn output_format(&self) -> OutputFormat {
        if self.html && !self.json {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    }

    /// Worker threads for this run, at least one.
    pub fn worker_count(&self) -> usize {
        let available = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        worker_count(self.processes, available, self.dev)
    }
}

fn worker_count(processes: usize, available: usize, dev: Option<usize>) -> usize {
    let requested = if processes > 0 { processes } else { available };
    dev.map_or(requested, |limit| requested.min(limit)).max(1)
}

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
