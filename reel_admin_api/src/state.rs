use std::sync::Arc;
use std::time::Duration;

use reel_store::Store;
use reel_upstream::Upstream;

/// Shared application state injected into every handler via `axum::State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub upstream: Arc<dyn Upstream>,
    /// Drives the `GET /health` running/stale/stopped derivation.
    pub heartbeat_interval: Duration,
    pub worker_name: String,
}
