//! Logging init: structured `tracing` output on stderr.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,sheetdrop=debug";

/// Initialize logging to stderr, filtered by `RUST_LOG` (default `info,sheetdrop=debug`).
///
/// Stdout stays free for replies written by the directory delivery.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
