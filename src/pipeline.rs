//! Reader, worker pool and reducer wiring for one extraction run.
//!
//! The calling thread reads records and feeds a bounded job channel. Workers
//! decode and render records in parallel. A single reducer restores source
//! order before anything reaches the sink. Dropping the last sender of a
//! channel is the only shutdown signal.
//!
//! The reader also takes one slot per record from a bounded slot channel and
//! the reducer returns it once the record is delivered in order. At most
//! [`IN_FLIGHT_PER_WORKER`] times the worker count records are between the
//! reader and the sink, even when one slow record holds back the reorder
//! buffer.

use crate::controls::{OutputTarget, PipelineControls};
use crate::document::{process_record, DocumentError, ProcessedDocument};
use crate::reader::{GzDumpReader, RawRecord};
use crate::sequencer::OrderedSequencer;
use crate::stats::{RunStats, StatsSummary};
use crate::writer::{OutputSink, RecordSink, RotatingWriter};
use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;
use tracing::{debug, debug_span, error, info};

/// Records allowed between reader and sink, per worker: the job queue, the
/// workers themselves and the result queue.
pub const IN_FLIGHT_PER_WORKER: usize = 3;

/// A record queued for a worker.
#[derive(Debug)]
struct Job {
    record: RawRecord,
    dispatched_at: Instant,
}

/// A worker's verdict on one record.
#[derive(Debug)]
struct Completed {
    source_index: u64,
    dispatched_at: Instant,
    outcome: Result<ProcessedDocument, DocumentError>,
}

/// Runs one extraction described by `controls` and writes its stats file.
pub fn run(controls: &PipelineControls) -> Result<StatsSummary> {
    let mut reader = GzDumpReader::open(&controls.input)
        .with_context(|| format!("failed to open dump {:?}", controls.input))?;
    let mut sink = match &controls.output {
        OutputTarget::Stdout => OutputSink::stdout(),
        OutputTarget::Directory(root) => OutputSink::Shards(RotatingWriter::new(
            root.clone(),
            controls.format.extension(),
            controls.limits,
        )),
    };

    info!(
        input = %controls.input.display(),
        workers = controls.workers,
        dev_limit = ?controls.dev_limit,
        "starting extraction"
    );
    let extract = controls.extract;
    let format = controls.format;
    let limit = controls.dev_limit.unwrap_or(usize::MAX);
    let mut stats = RunStats::new();
    run_pipeline(
        reader.by_ref().take(limit),
        controls.workers,
        |record: &RawRecord| process_record(record, &extract, format),
        &mut sink,
        &mut stats,
    )?;

    stats.set_skipped_lines(reader.skipped_lines());
    stats.report();
    let summary = stats.summary();
    summary
        .write(&controls.stats_path)
        .with_context(|| format!("failed to write stats to {:?}", controls.stats_path))?;
    Ok(summary)
}

/// Fans `records` out to `workers` threads running `process`, and writes the
/// results to `sink` in source order.
///
/// Failed documents, panics inside `process` included, are counted in `stats`
/// and never written. A read error, a write error or a panicked reducer
/// aborts the run.
pub fn run_pipeline<I, F, S>(
    records: I,
    workers: usize,
    process: F,
    sink: &mut S,
    stats: &mut RunStats,
) -> Result<()>
where
    I: IntoIterator<Item = io::Result<RawRecord>>,
    F: Fn(&RawRecord) -> Result<ProcessedDocument, DocumentError> + Sync,
    S: RecordSink + Send,
{
    let workers = workers.max(1);
    let (job_tx, job_rx) = bounded::<Job>(workers);
    let (result_tx, result_rx) = bounded::<Completed>(workers);
    let (slot_tx, slot_rx) = bounded::<()>(workers * IN_FLIGHT_PER_WORKER);

    thread::scope(|scope| {
        let process = &process;
        let worker_handles: Vec<_> = (0..workers)
            .map(|worker| {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || worker_loop(worker, jobs, results, process))
            })
            .collect();
        drop(job_rx);
        drop(result_tx);

        let reducer = scope.spawn(move || reduce(result_rx, slot_rx, sink, stats));

        let dispatched = dispatch(records, &job_tx, &slot_tx);
        drop(job_tx);
        drop(slot_tx);

        let mut worker_panicked = false;
        for handle in worker_handles {
            worker_panicked |= handle.join().is_err();
        }
        let reduced = reducer
            .join()
            .map_err(|_| anyhow!("reducer thread panicked"))?;
        if worker_panicked {
            bail!("worker thread panicked");
        }
        reduced?;
        dispatched.map(|count| debug!(dispatched = count, "reader finished"))
    })
}

fn dispatch<I>(records: I, jobs: &Sender<Job>, slots: &Sender<()>) -> Result<u64>
where
    I: IntoIterator<Item = io::Result<RawRecord>>,
{
    let mut count = 0u64;
    for record in records {
        let record = record.context("failed to read dump")?;
        slots
            .send(())
            .map_err(|_| anyhow!("output stopped before the input was exhausted"))?;
        let job = Job {
            record,
            dispatched_at: Instant::now(),
        };
        jobs.send(job)
            .map_err(|_| anyhow!("all workers stopped before the input was exhausted"))?;
        count += 1;
    }
    Ok(count)
}

fn worker_loop<F>(worker: usize, jobs: Receiver<Job>, results: Sender<Completed>, process: &F)
where
    F: Fn(&RawRecord) -> Result<ProcessedDocument, DocumentError>,
{
    let _span = debug_span!("worker", worker).entered();
    for job in jobs.iter() {
        let source_index = job.record.source_index;
        debug!(source_index, "processing record");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| process(&job.record)))
            .unwrap_or_else(|payload| Err(DocumentError::Panicked(panic_message(payload))));
        let completed = Completed {
            source_index,
            dispatched_at: job.dispatched_at,
            outcome,
        };
        if results.send(completed).is_err() {
            // reducer is gone; its error is reported by the caller
            break;
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "unknown panic".to_string(), |message| message.to_string()),
    }
}

fn reduce<S: RecordSink>(
    results: Receiver<Completed>,
    slots: Receiver<()>,
    sink: &mut S,
    stats: &mut RunStats,
) -> Result<()> {
    let mut sequencer = OrderedSequencer::new();
    let mut delivered = Vec::new();

    for completed in results.iter() {
        sequencer.insert(completed.source_index, completed)?;
        while let Some((_, ready)) = sequencer.pop_ready() {
            if let Ok(document) = &ready.outcome {
                sink.write_record(&document.line)
                    .context("failed to write record")?;
            }
            delivered.push(ready);
            // taken by the reader before dispatch, so always present
            let _ = slots.try_recv();
        }
        sink.flush().context("failed to flush output")?;

        for done in delivered.drain(..) {
            let latency = done.dispatched_at.elapsed();
            match done.outcome {
                Ok(document) => stats.record_article(latency, document.dropped_tables),
                Err(err) => {
                    error!(source_index = done.source_index, %err, "document failed");
                    stats.record_failure(latency);
                }
            }
        }
    }

    sequencer.finish()?;
    sink.finish().context("failed to close output")?;
    Ok(())
}
