//! Telemetry helpers for structured logging and tracing.
//!
//! Scheduler lifecycle is logged at `info`, per-firing transitions and skipped
//! ticks at `debug`, work failures at `warn`, panics in work at `error`.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_DIRECTIVE: &str = "prometheus_cadence=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_LOG_DIRECTIVE`]. Does nothing if a global subscriber is already set,
/// so callers remain free to install their own.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_LOG_DIRECTIVE);
}

/// Same as [`init_tracing`] with a caller-chosen fallback directive,
/// e.g. `"prometheus_cadence=debug"` to see every admission.
pub fn init_tracing_with(fallback: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}
