//! The fetch-transform-persist run: one dispatcher feeding a bounded job
//! queue, a fixed pool of workers draining it.
//!
//! The queue capacity equals the worker count, so the dispatcher blocks
//! once the pool is saturated. That backpressure is the admission control
//! of the whole system: at most `W` items are ever in flight on the
//! network at once.
//!
//! Cancellation is observed by the dispatcher before each read and by
//! workers between jobs. A worker that has accepted a job runs it to
//! completion; after cancellation, remaining workers exit without taking
//! new jobs and the dispatcher stops as soon as it notices the queue has
//! no consumers left.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::{ConfigError, HaulError, IndexError};
use crate::index::{IndexReader, Record};
use crate::item::FieldSpec;
use crate::pipeline::{self, Fetch};
use crate::shutdown::Shutdown;
use crate::types::{Outcome, ProcessOptions, RunStats};

/// Run the whole index through the pipeline with `workers` parallel
/// workers, forwarding each outcome to `report`.
///
/// Returns the tallied stats, or an error for fatal misconfiguration, an
/// unreadable index, or a panicked task.
pub async fn run<F>(
    index_path: &Path,
    spec: FieldSpec,
    options: ProcessOptions,
    workers: usize,
    fetcher: Arc<dyn Fetch>,
    shutdown: Arc<Shutdown>,
    report: F,
) -> Result<RunStats, HaulError>
where
    F: Fn(&Outcome) + Send + Sync + 'static,
{
    if workers == 0 {
        return Err(ConfigError::NoWorkers.into());
    }

    let (tx, rx) = mpsc::channel::<Record>(workers);
    let rx = Arc::new(Mutex::new(rx));
    let spec = Arc::new(spec);
    let options = Arc::new(options);
    let report = Arc::new(report);

    let dispatcher = {
        let index_path = index_path.to_path_buf();
        let shutdown = Arc::clone(&shutdown);
        tokio::task::spawn_blocking(move || dispatch(&index_path, tx, &shutdown))
    };

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        handles.push(tokio::spawn(worker_loop(
            Arc::clone(&rx),
            Arc::clone(&spec),
            Arc::clone(&options),
            Arc::clone(&fetcher),
            Arc::clone(&shutdown),
            Arc::clone(&report),
        )));
    }
    // the workers hold the only receiver clones; once they all exit, a
    // dispatcher blocked on a full queue wakes with a send error
    drop(rx);

    let mut stats = RunStats::default();
    let mut fatal: Option<ConfigError> = None;
    for handle in handles {
        match handle.await? {
            Ok(worker_stats) => stats.merge(worker_stats),
            Err(e) => fatal = Some(fatal.take().unwrap_or(e)),
        }
    }
    dispatcher.await??;

    match fatal {
        Some(e) => Err(e.into()),
        None => Ok(stats),
    }
}

/// Stream index records into the job queue until end of input,
/// cancellation, or queue closure.
fn dispatch(
    index_path: &Path,
    tx: mpsc::Sender<Record>,
    shutdown: &Shutdown,
) -> Result<(), IndexError> {
    let mut reader = IndexReader::open(index_path)?;
    loop {
        if shutdown.is_cancelled() {
            tracing::info!("stopping the index reader");
            break;
        }
        match reader.next_record() {
            None => break,
            Some(Ok(record)) => {
                if record.fields.is_empty() {
                    tracing::error!("line {}: empty record", record.line);
                }
                // blocks while the queue is full; errs once all workers
                // are gone
                if tx.blocking_send(record).is_err() {
                    break;
                }
            }
            Some(Err(e)) => tracing::warn!("skipping malformed index line: {e}"),
        }
    }
    Ok(())
}

/// One worker: pull jobs until the queue closes or cancellation is raised,
/// reporting exactly one outcome per job that produced one.
async fn worker_loop<F>(
    rx: Arc<Mutex<mpsc::Receiver<Record>>>,
    spec: Arc<FieldSpec>,
    options: Arc<ProcessOptions>,
    fetcher: Arc<dyn Fetch>,
    shutdown: Arc<Shutdown>,
    report: Arc<F>,
) -> Result<RunStats, ConfigError>
where
    F: Fn(&Outcome) + Send + Sync + 'static,
{
    let mut stats = RunStats::default();
    loop {
        if shutdown.is_cancelled() {
            tracing::debug!("stopping worker");
            break;
        }
        let record = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(record) = record else { break };

        match pipeline::process(&record, &spec, &options, fetcher.as_ref(), &shutdown).await {
            Ok(outcome) => {
                stats.record(&outcome);
                (report.as_ref())(&outcome);
            }
            Err(fatal) => {
                tracing::error!("{fatal}");
                shutdown.cancel();
                return Err(fatal);
            }
        }
    }
    Ok(stats)
}
