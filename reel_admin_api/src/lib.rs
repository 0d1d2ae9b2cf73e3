//! Read-mostly HTTP facade over the Store: account and video listings,
//! worker health, and a bulk account-seed endpoint. Carries no scheduling
//! logic of its own.

pub mod blocking;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Builds the router; the caller supplies the `AppState` and picks how to
/// serve it (`axum::serve`, behind a reverse proxy, or under `tower::Service`
/// in tests).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", get(routes::list_accounts))
        .route("/accounts/seed", post(routes::seed_accounts))
        .route("/videos/recent", get(routes::list_recent_videos))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}
