//! imghaul-missing - filter an index down to records whose image is not
//! on disk yet.
//!
//! The complement of `--resume`: instead of skipping finished work at
//! fetch time, it rewrites the index so a follow-up run only sees the
//! records that still need fetching. Records whose url does not normalize
//! are dropped (the fetch pipeline could never save them anyway).

use std::path::PathBuf;

use clap::Parser;
use imghaul_core::{normalize_url, url_to_path};

/// imghaul-missing - keep only the records whose target file is missing.
#[derive(Parser, Debug)]
#[command(name = "imghaul-missing")]
#[command(author, version, about, long_about = None)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Input index file path
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output file path
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Images path prefix the targets were written under
    #[arg(short = 'p', long)]
    prefix: PathBuf,

    /// Url field index (negative counts from the end of the record)
    #[arg(short = 'u', long, default_value_t = -1)]
    url_field: isize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&cli.input)?;
    let mut writer = csv::Writer::from_path(&cli.output)?;

    let spinner = indicatif::ProgressBar::new_spinner();
    let mut line = 0u64;

    for result in reader.records() {
        line += 1;
        spinner.inc(1);
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("line {line}: {e}");
                continue;
            }
        };
        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        if fields.is_empty() {
            tracing::warn!("line {line}: empty record");
            continue;
        }
        let Some(raw_url) = imghaul_core::item::pick_url_field(&fields, cli.url_field) else {
            continue;
        };
        let Ok(url) = normalize_url(raw_url) else {
            continue;
        };
        if url_to_path(&url, &cli.prefix).exists() {
            continue;
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    spinner.finish_and_clear();
    Ok(())
}
