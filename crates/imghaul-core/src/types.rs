//! Core data types shared across the pipeline.

use std::path::PathBuf;

use crate::error::ItemError;

/// Default JPEG encoding quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Default bounding box for resized output images.
pub const DEFAULT_MAX_SIZE: u32 = 640;

/// Immutable processing configuration, shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Root directory for the sharded output tree
    pub output_root: PathBuf,

    /// JPEG quality for re-encoded images (1-100)
    pub jpeg_quality: u8,

    /// Maximum output dimension; larger images are downscaled to fit
    pub max_size: u32,

    /// Skip items whose target file already exists
    pub resume: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_size: DEFAULT_MAX_SIZE,
            resume: false,
        }
    }
}

/// The outcome of one dispatched job.
///
/// Emitted exactly once per job that actually started. Consumed by an
/// external reporter (log lines or a progress tick); the core does not
/// care which.
#[derive(Debug)]
pub enum Outcome {
    /// The image was fetched, transformed, and written
    Saved { url: String },

    /// Resume mode found the target file already on disk
    Skipped { url: String },

    /// The item failed at some pipeline step; other items are unaffected.
    /// `url` is empty when the record never resolved to a url.
    Failed { url: String, error: ItemError },
}

impl Outcome {
    /// The url this outcome is attributed to, if one was resolved.
    pub fn url(&self) -> &str {
        match self {
            Outcome::Saved { url } | Outcome::Skipped { url } | Outcome::Failed { url, .. } => url,
        }
    }
}

/// Tallies for a completed (or interrupted) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub saved: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl RunStats {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Saved { .. } => self.saved += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Total jobs that reported an outcome.
    pub fn total(&self) -> u64 {
        self.saved + self.skipped + self.failed
    }

    pub(crate) fn merge(&mut self, other: RunStats) {
        self.saved += other.saved;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record() {
        let mut stats = RunStats::default();
        stats.record(&Outcome::Saved {
            url: "http://a.test/1".into(),
        });
        stats.record(&Outcome::Skipped {
            url: "http://a.test/2".into(),
        });
        stats.record(&Outcome::Failed {
            url: String::new(),
            error: ItemError::EmptyRecord { line: 3 },
        });
        assert_eq!(stats.saved, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_default_options() {
        let options = ProcessOptions::default();
        assert_eq!(options.jpeg_quality, 90);
        assert_eq!(options.max_size, 640);
        assert!(!options.resume);
    }
}
