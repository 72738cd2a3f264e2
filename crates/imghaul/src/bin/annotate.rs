//! imghaul-annotate - append the derived image path to each index record.
//!
//! Single-pass, stateless CSV transform: the url field is normalized and
//! hashed exactly like the fetch pipeline does, so the appended column
//! names the file `imghaul` will (or did) write for that record. Records
//! whose url does not normalize are logged and dropped from the output.

use std::path::PathBuf;

use clap::Parser;
use imghaul_core::{normalize_url, url_to_path};

/// imghaul-annotate - add a `path` column to an image index.
#[derive(Parser, Debug)]
#[command(name = "imghaul-annotate")]
#[command(author, version, about, long_about = None)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Input index file path
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output file path
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Images path prefix for the derived column
    #[arg(short = 'p', long)]
    prefix: PathBuf,

    /// Url field index (negative counts from the end of the record)
    #[arg(short = 'u', long, default_value_t = -1)]
    url_field: isize,

    /// Treat the first line as a header
    #[arg(long)]
    header: bool,
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

    let mut records = reader.records();
    let mut line = 0u64;

    if cli.header {
        line += 1;
        match records.next() {
            Some(Ok(record)) => {
                writer.write_record(record.iter().chain(["path"]))?;
            }
            Some(Err(e)) => tracing::warn!("line {line}: {e}"),
            None => {}
        }
    }

    for result in records {
        line += 1;
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
        let url = match normalize_url(raw_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("line {line}: {e}");
                continue;
            }
        };
        let path = url_to_path(&url, &cli.prefix);
        writer.write_record(record.iter().chain([path.to_string_lossy().as_ref()]))?;
    }

    writer.flush()?;
    Ok(())
}
