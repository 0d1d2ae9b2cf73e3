//! Process-wide tracing setup, called once from `reel-worker`'s `main`.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing_subscriber` fmt layer filtered by `RUST_LOG` if set,
/// otherwise by the given default level (typically [`crate::config::WorkerConfig::log_level`]).
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
