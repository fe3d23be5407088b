//! # Logging
//!
//! Structured logging via `tracing`.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages (repository queries)
//! - `RUST_LOG=hrms_app=trace` - Trace for the application crate only
//! - Default: `info`, with sqlx statements at `warn`

use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Builds the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber.
///
/// Safe to call more than once; later calls are ignored, which keeps tests
/// that each initialise logging from panicking.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init();
}
