//! JSON log output for processes embedding the dispatch layer.

use embedgate_core::config::defaults::{DEFAULT_LOG_LEVEL, LOG_FILTER_ENV};
use tracing_subscriber::EnvFilter;

/// Install the global JSON subscriber, filtered by `EMBEDGATE_LOG`
/// (falling back to `info`). Each line carries target, thread id and source
/// location.
///
/// Returns `true` when this call installed the subscriber. A host that
/// already set one keeps it and gets `false`, so calling this from library
/// setup code is safe.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .try_init()
        .is_ok()
}

/// Same as [`init_tracing`] with an explicit filter directive such as
/// `embedgate_dispatch=debug`, ignoring the environment.
pub fn init_tracing_with_filter(directives: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(true)
        .json()
        .try_init()
        .is_ok()
}
