//! Telemetry helpers for structured logging.
//!
//! The scheduler logs through `tracing`: admissions and heartbeat changes at
//! `debug`, every tick at `trace`, refused admissions at `warn` and dropped due
//! sleepers at `error`. Tick-level output is noisy, so the default filter stops
//! at `info` unless `RUST_LOG` says otherwise.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "wakeup_scheduler=info";

/// Install a default fmt subscriber unless one is already set. Users can
/// install their own subscriber instead.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
