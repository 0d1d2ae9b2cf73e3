//! The store: a pooled, transactional repository over the five tables.
//!
//! A small struct wrapping a connection pool, with one method per
//! operation. It owns a `diesel::r2d2` connection pool rather than taking
//! a borrowed connection from the caller, since the Scheduler needs several
//! outstanding Store calls at once. Every method here is synchronous;
//! async callers run them inside `tokio::task::spawn_blocking`.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::upsert::excluded;

use crate::error::StoreError;
use crate::models::{
    Account, Metric, MetricSchedule, NewAccount, NewMetric, NewMetricSchedule, NewVideo, Video,
    WorkerHeartbeat,
};
use crate::schema::{accounts, metric_schedules, metrics, videos, worker_heartbeats};
use crate::time::to_rfc3339_millis;

/// Status values for [`crate::models::MetricSchedule::status`].
pub mod schedule_status {
    pub const IDLE: &str = "idle";
    pub const RUNNING: &str = "running";
    pub const DISABLED: &str = "disabled";
}

/// Status values for [`crate::models::WorkerHeartbeat::status`].
pub mod heartbeat_status {
    pub const RUNNING: &str = "running";
    pub const STOPPED: &str = "stopped";
}

/// Pooled handle to the relational store.
#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    /// Opens a connection pool against `database_url`, sized to `pool_size`.
    /// Does not run migrations; call [`crate::db::migrate::run_all`] first.
    pub fn open(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        Ok(Self { pool })
    }

    fn conn(
        &self,
    ) -> Result<diesel::r2d2::PooledConnection<ConnectionManager<SqliteConnection>>, StoreError>
    {
        self.pool.get().map_err(StoreError::from)
    }

    /// Inserts or updates an account. Conflict on `id` updates only the
    /// mutable fields (`profile_url`, `followers_count`); `username` is
    /// immutable from this system's view and is never overwritten.
    pub fn upsert_account(
        &self,
        id: i64,
        username: &str,
        profile_url: Option<&str>,
        followers_count: i64,
    ) -> Result<Account, StoreError> {
        let conn = &mut self.conn()?;
        let now = to_rfc3339_millis(Utc::now());
        let row = NewAccount {
            id,
            username,
            profile_url,
            followers_count,
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(accounts::table)
            .values(&row)
            .on_conflict(accounts::id)
            .do_update()
            .set((
                accounts::profile_url.eq(excluded(accounts::profile_url)),
                accounts::followers_count.eq(excluded(accounts::followers_count)),
                accounts::updated_at.eq(excluded(accounts::updated_at)),
            ))
            .execute(conn)?;

        accounts::table
            .find(id)
            .select(Account::as_select())
            .first(conn)
            .map_err(StoreError::from)
    }

    /// All accounts ordered by username.
    pub fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let conn = &mut self.conn()?;
        accounts::table
            .order(accounts::username.asc())
            .select(Account::as_select())
            .load(conn)
            .map_err(StoreError::from)
    }

    /// Looks up a video by its upstream shortcode.
    pub fn get_video_by_shortcode(&self, shortcode: &str) -> Result<Option<Video>, StoreError> {
        let conn = &mut self.conn()?;
        videos::table
            .filter(videos::shortcode.eq(shortcode))
            .select(Video::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    /// Looks up a video by its upstream numeric media id, the id
    /// [`crate::models::MetricSchedule`] and [`crate::models::Metric`] rows
    /// reference.
    pub fn get_video(&self, video_id: i64) -> Result<Option<Video>, StoreError> {
        let conn = &mut self.conn()?;
        videos::table
            .filter(videos::video_id.eq(video_id))
            .select(Video::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    /// All videos, in no particular order. Used by `reschedule` to walk
    /// every video's schedule each tick.
    pub fn list_videos(&self) -> Result<Vec<Video>, StoreError> {
        let conn = &mut self.conn()?;
        videos::table.select(Video::as_select()).load(conn).map_err(StoreError::from)
    }

    /// Inserts a newly discovered video, or, if `video_id` already exists,
    /// leaves immutable fields untouched and fills `audio_url`,
    /// `audio_file_path`, and `transcription` only where they are currently
    /// null (an enrichment retry may supply what an earlier attempt missed).
    #[allow(clippy::too_many_arguments)]
    pub fn upsert_video(
        &self,
        video_id: i64,
        shortcode: &str,
        account_id: i64,
        video_url: &str,
        audio_url: Option<&str>,
        audio_file_path: Option<&str>,
        transcription: Option<&str>,
        caption: Option<&str>,
        duration_seconds: Option<i32>,
        published_at: DateTime<Utc>,
    ) -> Result<Video, StoreError> {
        let conn = &mut self.conn()?;
        let now = to_rfc3339_millis(Utc::now());
        let published_at_s = to_rfc3339_millis(published_at);

        let row = NewVideo {
            video_id,
            shortcode,
            account_id,
            video_url,
            audio_url,
            audio_file_path,
            transcription,
            caption,
            duration_seconds,
            published_at: &published_at_s,
            created_at: &now,
            updated_at: &now,
        };

        conn.immediate_transaction(|tx| -> diesel::QueryResult<()> {
            let inserted = diesel::insert_into(videos::table)
                .values(&row)
                .on_conflict(videos::video_id)
                .do_nothing()
                .execute(tx)?;

            if inserted == 0 {
                let existing: Video = videos::table
                    .filter(videos::video_id.eq(video_id))
                    .select(Video::as_select())
                    .first(tx)?;

                let fill_audio_url = existing.audio_url.is_none().then_some(audio_url).flatten();
                let fill_audio_file_path = existing
                    .audio_file_path
                    .is_none()
                    .then_some(audio_file_path)
                    .flatten();
                let fill_transcription = existing
                    .transcription
                    .is_none()
                    .then_some(transcription)
                    .flatten();

                if fill_audio_url.is_some()
                    || fill_audio_file_path.is_some()
                    || fill_transcription.is_some()
                {
                    diesel::update(videos::table.filter(videos::video_id.eq(video_id)))
                        .set((
                            fill_audio_url.map(|v| videos::audio_url.eq(v)),
                            fill_audio_file_path.map(|v| videos::audio_file_path.eq(v)),
                            fill_transcription.map(|v| videos::transcription.eq(v)),
                            videos::updated_at.eq(now.as_str()),
                        ))
                        .execute(tx)?;
                }
            }
            Ok(())
        })?;

        videos::table
            .filter(videos::video_id.eq(video_id))
            .select(Video::as_select())
            .first(conn)
            .map_err(StoreError::from)
    }

    /// Appends an immutable metric sample.
    #[allow(clippy::too_many_arguments)]
    pub fn append_metric(
        &self,
        video_id: i64,
        view_count: i64,
        like_count: i64,
        comment_count: i64,
        save_count: Option<i64>,
        followers_count: i64,
        measured_at: DateTime<Utc>,
    ) -> Result<Metric, StoreError> {
        let conn = &mut self.conn()?;
        let measured_at_s = to_rfc3339_millis(measured_at);
        let created_at_s = to_rfc3339_millis(Utc::now());

        let row = NewMetric {
            video_id,
            view_count,
            like_count,
            comment_count,
            save_count,
            followers_count,
            measured_at: &measured_at_s,
            created_at: &created_at_s,
        };

        let id: i32 = diesel::insert_into(metrics::table)
            .values(&row)
            .returning(metrics::id)
            .get_result(conn)?;

        metrics::table
            .find(id)
            .select(Metric::as_select())
            .first(conn)
            .map_err(StoreError::from)
    }

    /// The schedule row for a video, if one exists.
    pub fn schedule_for_video(&self, video_id: i64) -> Result<Option<MetricSchedule>, StoreError> {
        let conn = &mut self.conn()?;
        metric_schedules::table
            .filter(metric_schedules::video_id.eq(video_id))
            .select(MetricSchedule::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    /// Inserts or updates the one schedule row for a video.
    pub fn upsert_schedule(
        &self,
        video_id: i64,
        next_due_at: DateTime<Utc>,
        last_run_at: Option<DateTime<Utc>>,
        interval_seconds: i32,
        status: &str,
    ) -> Result<MetricSchedule, StoreError> {
        let conn = &mut self.conn()?;
        let now = to_rfc3339_millis(Utc::now());
        let next_due_at_s = to_rfc3339_millis(next_due_at);
        let last_run_at_s = last_run_at.map(to_rfc3339_millis);

        let row = NewMetricSchedule {
            video_id,
            next_due_at: &next_due_at_s,
            last_run_at: last_run_at_s.as_deref(),
            interval_seconds,
            status,
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(metric_schedules::table)
            .values(&row)
            .on_conflict(metric_schedules::video_id)
            .do_update()
            .set((
                metric_schedules::next_due_at.eq(excluded(metric_schedules::next_due_at)),
                metric_schedules::last_run_at.eq(excluded(metric_schedules::last_run_at)),
                metric_schedules::interval_seconds.eq(excluded(metric_schedules::interval_seconds)),
                metric_schedules::status.eq(excluded(metric_schedules::status)),
                metric_schedules::updated_at.eq(excluded(metric_schedules::updated_at)),
            ))
            .execute(conn)?;

        metric_schedules::table
            .filter(metric_schedules::video_id.eq(video_id))
            .select(MetricSchedule::as_select())
            .first(conn)
            .map_err(StoreError::from)
    }

    /// Atomically selects up to `limit` idle, due schedules and leases them
    /// by flipping their status to `running`. Concurrent callers never see
    /// overlapping rows: the select and the lease happen inside one
    /// `BEGIN IMMEDIATE` transaction.
    pub fn claim_due_schedules(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<MetricSchedule>, StoreError> {
        if limit <= 0 {
            return Ok(vec![]);
        }
        let conn = &mut self.conn()?;
        let now_s = to_rfc3339_millis(now);

        let leased: Vec<MetricSchedule> = conn.immediate_transaction(|tx| {
            let candidates: Vec<i32> = metric_schedules::table
                .filter(
                    metric_schedules::status
                        .eq(schedule_status::IDLE)
                        .and(metric_schedules::next_due_at.le(&now_s)),
                )
                .order(metric_schedules::next_due_at.asc())
                .limit(limit)
                .select(metric_schedules::id)
                .load::<i32>(tx)?;

            if candidates.is_empty() {
                return Ok(Vec::new());
            }

            diesel::update(
                metric_schedules::table.filter(
                    metric_schedules::id
                        .eq_any(&candidates)
                        .and(metric_schedules::status.eq(schedule_status::IDLE)),
                ),
            )
            .set((
                metric_schedules::status.eq(schedule_status::RUNNING),
                metric_schedules::updated_at.eq(now_s.as_str()),
            ))
            .execute(tx)?;

            metric_schedules::table
                .filter(metric_schedules::id.eq_any(&candidates))
                .select(MetricSchedule::as_select())
                .load(tx)
        })?;

        Ok(leased)
    }

    /// Returns a leased schedule to the idle (or terminal disabled) state,
    /// advancing its due time.
    pub fn release_schedule(
        &self,
        id: i32,
        next_due_at: DateTime<Utc>,
        last_run_at: Option<DateTime<Utc>>,
        status: &str,
    ) -> Result<(), StoreError> {
        let conn = &mut self.conn()?;
        let now = to_rfc3339_millis(Utc::now());
        let next_due_at_s = to_rfc3339_millis(next_due_at);
        let last_run_at_s = last_run_at.map(to_rfc3339_millis);

        let n = diesel::update(metric_schedules::table.find(id))
            .set((
                metric_schedules::next_due_at.eq(next_due_at_s),
                metric_schedules::last_run_at.eq(last_run_at_s),
                metric_schedules::status.eq(status),
                metric_schedules::updated_at.eq(now),
            ))
            .execute(conn)?;

        if n == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Returns any schedule stuck in `running` past `lease_timeout` back to
    /// `idle`. Run once at startup to recover from a crash between claim and
    /// release.
    pub fn reap_stale_schedules(&self, lease_timeout: Duration) -> Result<usize, StoreError> {
        let conn = &mut self.conn()?;
        let cutoff = to_rfc3339_millis(Utc::now() - lease_timeout);
        let now = to_rfc3339_millis(Utc::now());

        let n = diesel::update(
            metric_schedules::table.filter(
                metric_schedules::status
                    .eq(schedule_status::RUNNING)
                    .and(metric_schedules::updated_at.lt(&cutoff)),
            ),
        )
        .set((
            metric_schedules::status.eq(schedule_status::IDLE),
            metric_schedules::updated_at.eq(now),
        ))
        .execute(conn)?;

        Ok(n)
    }

    /// Upserts this worker's liveness row.
    pub fn upsert_heartbeat(
        &self,
        worker_name: &str,
        pid: i32,
        status: &str,
    ) -> Result<(), StoreError> {
        let conn = &mut self.conn()?;
        let now = to_rfc3339_millis(Utc::now());

        diesel::insert_into(worker_heartbeats::table)
            .values((
                worker_heartbeats::worker_name.eq(worker_name),
                worker_heartbeats::last_heartbeat.eq(&now),
                worker_heartbeats::status.eq(status),
                worker_heartbeats::pid.eq(pid),
                worker_heartbeats::created_at.eq(&now),
                worker_heartbeats::updated_at.eq(&now),
            ))
            .on_conflict(worker_heartbeats::worker_name)
            .do_update()
            .set((
                worker_heartbeats::last_heartbeat.eq(&now),
                worker_heartbeats::status.eq(status),
                worker_heartbeats::pid.eq(pid),
                worker_heartbeats::updated_at.eq(&now),
            ))
            .execute(conn)?;

        Ok(())
    }

    /// Reads a worker's heartbeat row, if any.
    pub fn get_heartbeat(&self, worker_name: &str) -> Result<Option<WorkerHeartbeat>, StoreError> {
        let conn = &mut self.conn()?;
        worker_heartbeats::table
            .filter(worker_heartbeats::worker_name.eq(worker_name))
            .select(WorkerHeartbeat::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    /// Account list paired with each account's video count, for the admin
    /// API's account listing.
    pub fn list_accounts_with_counts(&self) -> Result<Vec<(Account, i64)>, StoreError> {
        let conn = &mut self.conn()?;
        let accounts_list = accounts::table
            .order(accounts::username.asc())
            .select(Account::as_select())
            .load::<Account>(conn)?;

        let mut out = Vec::with_capacity(accounts_list.len());
        for a in accounts_list {
            let count: i64 = videos::table
                .filter(videos::account_id.eq(a.id))
                .count()
                .get_result(conn)?;
            out.push((a, count));
        }
        Ok(out)
    }

    /// The most recently published videos, each paired with its latest
    /// metric row if one has been recorded.
    pub fn list_recent_videos_with_latest_metric(
        &self,
        limit: i64,
    ) -> Result<Vec<(Video, Option<Metric>)>, StoreError> {
        let conn = &mut self.conn()?;
        let recent = videos::table
            .order(videos::published_at.desc())
            .limit(limit)
            .select(Video::as_select())
            .load::<Video>(conn)?;

        let mut out = Vec::with_capacity(recent.len());
        for v in recent {
            let latest = metrics::table
                .filter(metrics::video_id.eq(v.video_id))
                .order(metrics::measured_at.desc())
                .select(Metric::as_select())
                .first::<Metric>(conn)
                .optional()?;
            out.push((v, latest));
        }
        Ok(out)
    }
}
