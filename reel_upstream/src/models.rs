use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One piece of discovered media, as returned by [`crate::client::UpstreamClient::recent_media`].
///
/// This is the shape the Scheduler's discover job consumes directly when
/// calling `reel_store::repo::Store::upsert_video`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaSummary {
    pub video_id: i64,
    pub shortcode: String,
    pub url: String,
    pub caption: Option<String>,
    pub duration_seconds: Option<i32>,
    pub published_at: DateTime<Utc>,
    pub audio_url: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub followers_count: i64,
}

/// A single metrics snapshot, as returned by
/// [`crate::client::UpstreamClient::media_metrics`].
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSnapshot {
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub save_count: Option<i64>,
    pub followers_count: i64,
}

/// Opaque handle returned by `authenticate()`. The only thing callers do
/// with it is keep it alive alongside the client; its content never
/// leaves this crate.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub csrf_token: Option<String>,
}
