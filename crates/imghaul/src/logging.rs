//! Logging initialization.
//!
//! Uses the `tracing` ecosystem. Log output goes to stderr so the progress
//! bar and any data output stay clean on stdout.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// Per-item outcomes are logged at INFO. `verbose` raises the level to
/// DEBUG; `progress` lowers it to WARN so the bar is the only per-item
/// feedback. The RUST_LOG environment variable overrides either.
pub fn init(verbose: bool, progress: bool) {
    let default_level = if verbose {
        "debug"
    } else if progress {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .init();
}
