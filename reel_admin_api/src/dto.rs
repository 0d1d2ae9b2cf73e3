//! Wire-shaped response bodies. Kept separate from `reel_store`'s Diesel
//! models so that crate doesn't need to carry a `serde` dependency just for
//! this read-only facade.

use reel_store::models::{Account, Metric, Video};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: i64,
    pub username: String,
    pub profile_url: Option<String>,
    pub followers_count: i64,
    pub video_count: i64,
}

impl AccountView {
    pub fn from_row(account: Account, video_count: i64) -> Self {
        Self {
            id: account.id,
            username: account.username,
            profile_url: account.profile_url,
            followers_count: account.followers_count,
            video_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricView {
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub save_count: Option<i64>,
    pub followers_count: i64,
    pub measured_at: String,
}

impl From<Metric> for MetricView {
    fn from(m: Metric) -> Self {
        Self {
            view_count: m.view_count,
            like_count: m.like_count,
            comment_count: m.comment_count,
            save_count: m.save_count,
            followers_count: m.followers_count,
            measured_at: m.measured_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoView {
    pub video_id: i64,
    pub shortcode: String,
    pub account_id: i64,
    pub video_url: String,
    pub caption: Option<String>,
    pub transcription: Option<String>,
    pub published_at: String,
    pub latest_metric: Option<MetricView>,
}

impl VideoView {
    pub fn from_row(video: Video, latest_metric: Option<Metric>) -> Self {
        Self {
            video_id: video.video_id,
            shortcode: video.shortcode,
            account_id: video.account_id,
            video_url: video.video_url,
            caption: video.caption,
            transcription: video.transcription,
            published_at: video.published_at,
            latest_metric: latest_metric.map(MetricView::from),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Running,
    Stale,
    Stopped,
}

#[derive(Debug, Serialize)]
pub struct HealthView {
    pub status: HealthStatus,
    pub worker_name: String,
    pub last_heartbeat: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SeedAccount {
    pub username: String,
    pub user_pk: Option<i64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SeedRequest {
    pub accounts: Vec<SeedAccount>,
}

#[derive(Debug, Serialize)]
pub struct SeedOutcome {
    pub seeded: Vec<AccountView>,
    pub rejected: Vec<SeedRejection>,
}

#[derive(Debug, Serialize)]
pub struct SeedRejection {
    pub username: String,
    pub reason: String,
}
