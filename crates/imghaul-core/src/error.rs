//! Error types for the imghaul pipeline.
//!
//! Errors are organized by how far they reach: configuration errors abort
//! the whole run before (or as soon as) they are observed, while item
//! errors are attributed to a single record and never escape the worker
//! that hit them.

use thiserror::Error;

use crate::pipeline::decode::DecodeError;
use crate::pipeline::fetch::FetchError;

/// Top-level error type for a pipeline run.
#[derive(Error, Debug)]
pub enum HaulError {
    /// Configuration-related errors (fatal, abort the run)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Index file could not be opened or read
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// A worker or dispatcher task panicked
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Startup-class misconfiguration. Never recoverable for the run.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An id field spec entry is not a number
    #[error("invalid id field {value:?}: {source}")]
    IdFieldParse {
        value: String,
        source: std::num::ParseIntError,
    },

    /// An id field index points past the end of a record
    #[error("id field index {index} is out of bounds for a record of {len} fields")]
    IdFieldOutOfBounds { index: usize, len: usize },

    /// Worker count of zero makes no progress
    #[error("worker count must be > 0")]
    NoWorkers,
}

/// Index file access errors.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("failed to open index {path:?}: {source}")]
    Open {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read index: {0}")]
    Read(#[from] std::io::Error),
}

/// URL normalization failures. Reported before any network access.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("invalid url {url:?}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {scheme:?} in {url:?}")]
    Scheme { url: String, scheme: String },
}

/// Per-item failure, attributed to one record and recovered locally.
#[derive(Error, Debug)]
pub enum ItemError {
    /// The record has no fields at all, so no url can be addressed
    #[error("line {line}: empty record")]
    EmptyRecord { line: u64 },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Directory creation or output file I/O failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JPEG encoding failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// The blocking transform task died under us
    #[error("worker task failed: {0}")]
    Task(String),
}

/// Convenience alias for run-level results.
pub type Result<T> = std::result::Result<T, HaulError>;
