//! Row types for the store's five tables.
//!
//! Timestamps are stored and read as RFC-3339 UTC strings (see [`crate::time`]);
//! callers convert at the boundary rather than the repository doing it on
//! every read.

use diesel::prelude::*;

use crate::schema::{accounts, metric_schedules, metrics, videos, worker_heartbeats};

/// A tracked account, keyed by the upstream platform's own numeric user id.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Account {
    /// The upstream `user_pk`, used verbatim; never a locally generated surrogate.
    pub id: i64,
    /// Unique, immutable from this system's view.
    pub username: String,
    pub profile_url: Option<String>,
    /// Cached latest follower count, refreshed by discover.
    pub followers_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = accounts)]
pub struct NewAccount<'a> {
    pub id: i64,
    pub username: &'a str,
    pub profile_url: Option<&'a str>,
    pub followers_count: i64,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// A piece of media discovered for an [`Account`].
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = videos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Video {
    pub id: i32,
    /// Upstream numeric media id, globally unique.
    pub video_id: i64,
    /// Upstream opaque short id, globally unique.
    pub shortcode: String,
    pub account_id: i64,
    pub video_url: String,
    pub audio_url: Option<String>,
    pub audio_file_path: Option<String>,
    pub transcription: Option<String>,
    pub caption: Option<String>,
    pub duration_seconds: Option<i32>,
    pub published_at: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = videos)]
pub struct NewVideo<'a> {
    pub video_id: i64,
    pub shortcode: &'a str,
    pub account_id: i64,
    pub video_url: &'a str,
    pub audio_url: Option<&'a str>,
    pub audio_file_path: Option<&'a str>,
    pub transcription: Option<&'a str>,
    pub caption: Option<&'a str>,
    pub duration_seconds: Option<i32>,
    pub published_at: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// An immutable engagement sample for a [`Video`] at an instant.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = metrics)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Metric {
    pub id: i32,
    /// References `videos.video_id`, not the surrogate `videos.id`.
    pub video_id: i64,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub save_count: Option<i64>,
    pub followers_count: i64,
    pub measured_at: String,
    pub created_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = metrics)]
pub struct NewMetric<'a> {
    pub video_id: i64,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub save_count: Option<i64>,
    pub followers_count: i64,
    pub measured_at: &'a str,
    pub created_at: &'a str,
}

/// The control-plane row driving dispatch-due; one per [`Video`].
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = metric_schedules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MetricSchedule {
    pub id: i32,
    pub video_id: i64,
    pub next_due_at: String,
    pub last_run_at: Option<String>,
    /// Advisory; the schedule policy function is authoritative.
    pub interval_seconds: i32,
    /// One of `idle`, `running`, `disabled`.
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = metric_schedules)]
pub struct NewMetricSchedule<'a> {
    pub video_id: i64,
    pub next_due_at: &'a str,
    pub last_run_at: Option<&'a str>,
    pub interval_seconds: i32,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Liveness record for a worker process.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = worker_heartbeats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkerHeartbeat {
    pub id: i32,
    pub worker_name: String,
    pub last_heartbeat: String,
    /// One of `running`, `stopped`.
    pub status: String,
    pub pid: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = worker_heartbeats)]
pub struct NewWorkerHeartbeat<'a> {
    pub worker_name: &'a str,
    pub last_heartbeat: &'a str,
    pub status: &'a str,
    pub pid: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
