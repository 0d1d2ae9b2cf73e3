use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failures the HTTP layer can surface; everything collapses to a JSON body
/// with an appropriate status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("store error: {0}")]
    Store(#[from] reel_store::StoreError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Store(err) => {
                tracing::error!(%err, "store error serving admin request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
