//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize JSON tracing for the process.
///
/// `RUST_LOG` wins over `default_directive` when set. Safe to call multiple
/// times (subsequent calls are no-ops). Document lifecycle events are emitted
/// under the `docmapper_infra` target; set `RUST_LOG=docmapper_infra=debug` to
/// see which read path each load took.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
