#![warn(missing_docs)]
//! Core library entry points for the fastdump extractor.
//!
//! A run reads a gzip-compressed Wikimedia Enterprise HTML dump, extracts
//! every article on a pool of worker threads and writes one record per
//! article, in input order, to stdout or to rotating shard files.

pub mod controls;
pub mod document;
pub mod download;
pub mod pipeline;
pub mod reader;
pub mod sequencer;
pub mod stats;
pub mod writer;

pub use controls::{init_tracing, Cli, OutputFormat, OutputTarget, PipelineControls};
pub use document::{process_record, DocumentError, DumpDocument, Identifier, ProcessedDocument};
pub use download::{download_latest, DownloadError, DownloadRequest};
pub use pipeline::{run as run_extraction, run_pipeline};
pub use reader::{DumpReader, GzDumpReader, RawRecord};
pub use sequencer::{OrderedSequencer, SequencerError};
pub use stats::{RunStats, StatsSummary};
pub use writer::{OutputSink, RecordSink, RotatingWriter, ShardLimits, ShardState};
