//! The `reschedule` job: walks every video and, for any
//! whose schedule is currently idle, recomputes `next_due_at` from the
//! age-decaying policy. Rows leased (`status = running`) by a concurrent
//! dispatch-due tick are left untouched.

use chrono::Utc;
use reel_store::Store;
use reel_store::repo::schedule_status;
use reel_store::time::parse_ts_to_utc;

use crate::blocking::store_call;
use crate::error::JobError;

pub async fn run(store: &Store) -> Result<(), JobError> {
    let videos = store_call({
        let store = store.clone();
        move || store.list_videos()
    })
    .await?;

    for video in videos {
        let schedule = store_call({
            let store = store.clone();
            let video_id = video.video_id;
            move || store.schedule_for_video(video_id)
        })
        .await?;

        let Some(schedule) = schedule else { continue };
        if schedule.status != schedule_status::IDLE {
            continue;
        }

        let published_at = parse_ts_to_utc(&video.published_at)
            .map_err(|e| JobError::Framework(format!("bad published_at for video {}: {e}", video.id)))?;
        let last_run_at = schedule
            .last_run_at
            .as_deref()
            .map(parse_ts_to_utc)
            .transpose()
            .map_err(|e| JobError::Framework(format!("bad last_run_at for video {}: {e}", video.id)))?;

        let now = Utc::now();
        let next_due = reel_schedule::next_due(published_at, now);
        let interval_seconds = (next_due - now).num_seconds().max(0) as i32;

        store_call({
            let store = store.clone();
            let video_id = video.video_id;
            move || {
                store.upsert_schedule(
                    video_id,
                    next_due,
                    last_run_at,
                    interval_seconds,
                    schedule_status::IDLE,
                )
            }
        })
        .await?;
    }

    Ok(())
}
