//! imghaul - bulk-fetch the images of a CSV index into a sharded JPEG
//! mirror.
//!
//! Each record's url is normalized, hashed into a deterministic two-level
//! sharded path, fetched, decoded, shrunk to a bounding box, flattened
//! over white, and re-encoded as JPEG. Re-runs with `--resume` skip
//! anything already on disk.
//!
//! # Usage
//!
//! ```bash
//! # Fetch everything in the index, url in the last column
//! imghaul -i index.csv -o ./images
//!
//! # Resume an interrupted run with a progress bar
//! imghaul -i index.csv -o ./images --resume --progress
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use imghaul_core::{
    count_lines, run, FieldSpec, HttpFetcher, Outcome, ProcessOptions, RunStats, Shutdown,
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_SIZE,
};

mod logging;

/// imghaul - mirror the images referenced by a CSV index.
#[derive(Parser, Debug)]
#[command(name = "imghaul")]
#[command(author, version, about, long_about = None)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Index file path
    #[arg(short = 'i', long)]
    index: PathBuf,

    /// Images output root
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Url field index (negative counts from the end of the record)
    #[arg(short = 'u', long, default_value_t = -1)]
    url_field: isize,

    /// Comma-separated identity field indices
    #[arg(long, default_value = "0")]
    id_fields: String,

    /// Output images quality
    #[arg(short = 'q', long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Output images size limit
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    max_size: u32,

    /// Concurrent workers (default: 2x available parallelism)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Skip items whose output file already exists
    #[arg(long)]
    resume: bool,

    /// Per-request timeout in seconds (no timeout when unset)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log every outcome (debug level)
    #[arg(short = 'v', long, conflicts_with = "progress")]
    verbose: bool,

    /// Show a progress bar instead of per-item logging
    #[arg(short = 'p', long)]
    progress: bool,
}

fn default_workers() -> usize {
    2 * std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb
}

fn print_summary(stats: &RunStats, elapsed: Duration) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        stats.total() as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    tracing::info!(
        "{} saved, {} skipped, {} failed in {:.1}s ({:.1} img/sec)",
        stats.saved,
        stats.skipped,
        stats.failed,
        elapsed.as_secs_f64(),
        rate
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.progress);

    // resolve the field configuration up front: a bad spec aborts before
    // any work starts
    let spec = FieldSpec::parse(&cli.id_fields, cli.url_field)?;
    let workers = cli.workers.unwrap_or_else(default_workers);
    anyhow::ensure!(workers > 0, "worker count must be > 0");

    tracing::info!("calculating the index size...");
    let line_count = count_lines(&cli.index)?;
    tracing::info!("{line_count} index lines");

    let options = ProcessOptions {
        output_root: cli.output,
        jpeg_quality: cli.quality,
        max_size: cli.max_size,
        resume: cli.resume,
    };
    let fetcher = Arc::new(HttpFetcher::new(cli.timeout_secs.map(Duration::from_secs))?);
    let shutdown = Arc::new(Shutdown::new());

    // on interrupt: stop taking jobs, wait only for in-flight disk writes,
    // then terminate. Mid-fetch workers are abandoned by design.
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!();
                tracing::warn!("interrupt received, gradually stopping the workers...");
                shutdown.cancel();
                shutdown.wait_idle().await;
                std::process::exit(0);
            }
        });
    }

    let progress = cli.progress.then(|| create_progress_bar(line_count));
    let report = {
        let progress = progress.clone();
        move |outcome: &Outcome| {
            match outcome {
                Outcome::Saved { url } => tracing::info!("save {url}"),
                Outcome::Skipped { url } => tracing::info!("skip {url}"),
                Outcome::Failed { url, error } if url.is_empty() => tracing::warn!("{error}"),
                Outcome::Failed { url, error } => tracing::warn!("{url}: {error}"),
            }
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }
    };

    let start = Instant::now();
    let stats = run(
        &cli.index,
        spec,
        options,
        workers,
        fetcher,
        shutdown,
        report,
    )
    .await?;

    if let Some(pb) = progress {
        // leave the finished bar in place as the summary
        pb.finish();
    }
    print_summary(&stats, start.elapsed());
    Ok(())
}
