//! The per-item processing pipeline.
//!
//! One record in, one [`Outcome`] out: resolve the item, derive the target
//! path, check for a resume hit, fetch the bytes, decode (with the jpeg
//! fallback), shrink, flatten, and re-encode to disk. Every step is a
//! per-item failure point; nothing here ever aborts other items, with the
//! single exception of an out-of-bounds identity field, which is a
//! startup-class misconfiguration surfaced as a fatal error.

pub mod decode;
pub mod fetch;
pub mod transform;

pub use decode::DecodeError;
pub use fetch::{Fetch, FetchError, HttpFetcher};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::{ConfigError, ItemError};
use crate::index::Record;
use crate::item::{self, FieldSpec, ResolveError};
use crate::shard::{normalize_url, url_to_path};
use crate::shutdown::Shutdown;
use crate::types::{Outcome, ProcessOptions};

use decode::decode_image;
use transform::{flatten, shrink_to_fit};

/// Run one record through the full pipeline.
///
/// Returns `Err` only for fatal misconfiguration; every per-item failure
/// is folded into the returned [`Outcome`].
pub async fn process(
    record: &Record,
    spec: &FieldSpec,
    options: &Arc<ProcessOptions>,
    fetcher: &dyn Fetch,
    shutdown: &Arc<Shutdown>,
) -> Result<Outcome, ConfigError> {
    let item = match item::resolve(record, spec) {
        Ok(item) => item,
        Err(ResolveError::EmptyRecord { line }) => {
            return Ok(Outcome::Failed {
                url: String::new(),
                error: ItemError::EmptyRecord { line },
            });
        }
        Err(ResolveError::IdFieldOutOfBounds { index, len }) => {
            return Err(ConfigError::IdFieldOutOfBounds { index, len });
        }
    };

    let url = match normalize_url(&item.source_url) {
        Ok(url) => url,
        Err(e) => {
            return Ok(Outcome::Failed {
                url: item.source_url,
                error: e.into(),
            });
        }
    };
    let path = url_to_path(&url, &options.output_root);
    tracing::debug!(identity = %item.identity, %url, ?path, "processing item");

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return Ok(Outcome::Failed {
                url,
                error: e.into(),
            });
        }
    }

    // finish early if we are resuming and the file already exists
    if options.resume && path.exists() {
        return Ok(Outcome::Skipped { url });
    }

    let body = match fetcher.fetch(&url).await {
        Ok(body) => body,
        Err(e) => {
            return Ok(Outcome::Failed {
                url,
                error: e.into(),
            });
        }
    };

    // decode, shrink, flatten, and encode off the async workers; the
    // encode+write is the critical section graceful shutdown waits for
    let result = {
        let options = Arc::clone(options);
        let shutdown = Arc::clone(shutdown);
        let path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), ItemError> {
            let image = decode_image(&body)?;
            let image = shrink_to_fit(image, options.max_size);
            let flat = flatten(&image);
            let _guard = shutdown.enter_critical();
            write_jpeg(&path, &flat, options.jpeg_quality)
        })
        .await
    };

    match result {
        Ok(Ok(())) => Ok(Outcome::Saved { url }),
        Ok(Err(error)) => Ok(Outcome::Failed { url, error }),
        Err(join_err) => Ok(Outcome::Failed {
            url,
            error: ItemError::Task(join_err.to_string()),
        }),
    }
}

/// Create/truncate the target file and encode the flattened image into it.
fn write_jpeg(path: &Path, image: &RgbImage, quality: u8) -> Result<(), ItemError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(image)
        .map_err(|e| ItemError::Encode(e.to_string()))?;
    writer.flush()?;
    Ok(())
}
