//! Logging utilities
//!
//! Tracing subscriber initialization and timing helpers.

use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber from `RUST_LOG`
///
/// Falls back to the given default directive when `RUST_LOG` is unset.
/// Safe to call once per process; subsequent calls are ignored.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// Log execution time of a future at debug level
pub async fn timed<F, T>(name: &str, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = Instant::now();
    debug!("Starting: {}", name);

    let result = future.await;

    debug!("Completed: {} in {:?}", name, start.elapsed());
    result
}
