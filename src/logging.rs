//! Tracing subscriber setup.
//!
//! Events come from two targets: `tapi` (auth failures at `warn`, todo
//! create/update/delete at `info`, list results at `debug`, store outages
//! at `warn`) and `tower_http` (one span per request from the trace layer).
//! API keys are never logged; auth failures carry only a hash fingerprint.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "tapi=info,tower_http=info";

/// Install a JSON subscriber filtered by `RUST_LOG`, or [`DEFAULT_FILTER`].
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true),
        )
        .init();
}

/// Plain-text subscriber captured by the test harness. Safe to call from
/// every test; only the first call installs it.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tapi=debug,tower_http=debug")
        .try_init();
}
