//! Logging setup.
//!
//! The engine only emits `tracing` events; installing a subscriber is up
//! to the embedding application. These helpers cover the common cases.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a formatted subscriber filtered by `RUST_LOG` (default `info`).
///
/// ```no_run
/// timetable_engine::logging::init();
/// ```
///
/// Does nothing if a global subscriber is already installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .try_init();
}

/// Subscriber for tests: `debug` level, captured by the test harness.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("timetable_engine=debug"))
        .with_test_writer()
        .try_init();
}
