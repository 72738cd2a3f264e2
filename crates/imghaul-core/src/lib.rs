//! imghaul Core - bulk image fetch/normalize/persist pipeline.
//!
//! imghaul turns a tabular index of image URLs into a sharded on-disk
//! mirror of normalized JPEGs, at high concurrency and with resumable
//! re-runs.
//!
//! # Architecture
//!
//! ```text
//! Index → Dispatcher → bounded queue → Worker Pool
//!                                         │
//!               resolve item → derive path → fetch → decode → shrink
//!                                → flatten → encode+write → Outcome
//! ```
//!
//! The dispatcher and workers cooperate with a shared [`Shutdown`] handle:
//! cancellation stops new jobs, and graceful shutdown waits only for
//! workers inside the encode+write critical section, so no output file is
//! ever observed half-written.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use imghaul_core::{run, FieldSpec, HttpFetcher, ProcessOptions, Shutdown};
//!
//! #[tokio::main]
//! async fn main() -> imghaul_core::Result<()> {
//!     let spec = FieldSpec::parse("0", -1)?;
//!     let fetcher = Arc::new(HttpFetcher::new(None).expect("client"));
//!     let shutdown = Arc::new(Shutdown::new());
//!     let stats = run(
//!         "index.csv".as_ref(),
//!         spec,
//!         ProcessOptions::default(),
//!         8,
//!         fetcher,
//!         shutdown,
//!         |outcome| println!("{outcome:?}"),
//!     )
//!     .await?;
//!     println!("saved {}", stats.saved);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod error;
pub mod index;
pub mod item;
pub mod pipeline;
pub mod runner;
pub mod shard;
pub mod shutdown;
pub mod types;

// Re-exports for convenient access
pub use error::{ConfigError, HaulError, IndexError, ItemError, NormalizeError, Result};
pub use index::{count_lines, IndexReader, Record};
pub use item::{FieldSpec, Item};
pub use pipeline::{DecodeError, Fetch, FetchError, HttpFetcher};
pub use runner::run;
pub use shard::{normalize_url, url_to_path};
pub use shutdown::{CriticalGuard, Shutdown};
pub use types::{Outcome, ProcessOptions, RunStats, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_SIZE};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
