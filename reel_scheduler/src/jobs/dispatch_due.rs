//! The `dispatch-due` job: claims a batch of due schedules
//! under the Store's atomic lease, fetches fresh counts for each, appends a
//! metric row, and advances (or disables) the schedule.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reel_store::Store;
use reel_store::repo::schedule_status;
use reel_store::time::parse_ts_to_utc;
use reel_upstream::{Upstream, UpstreamError};
use tracing::warn;

use crate::blocking::store_call;
use crate::error::JobError;

/// Schedules disabled because their media is gone are pushed this far into
/// the future rather than given a sentinel value, so ordinary `ORDER BY
/// next_due_at` queries still behave.
fn far_future(now: DateTime<Utc>) -> DateTime<Utc> {
    now + ChronoDuration::days(365 * 100)
}

/// Default batch size claimed per tick.
pub const DEFAULT_BATCH_LIMIT: i64 = 25;

pub async fn run(
    store: &Store,
    upstream: &dyn Upstream,
    batch_limit: i64,
    inter_metric_delay: StdDuration,
) -> Result<(), JobError> {
    let now = Utc::now();
    let batch = store_call({
        let store = store.clone();
        move || store.claim_due_schedules(now, batch_limit)
    })
    .await?;

    for schedule in batch {
        let video = store_call({
            let store = store.clone();
            let video_id = schedule.video_id;
            move || store.get_video(video_id)
        })
        .await?;

        let Some(video) = video else {
            warn!(video_id = schedule.video_id, "schedule has no matching video, releasing as idle");
            store_call({
                let store = store.clone();
                let id = schedule.id;
                move || {
                    store.release_schedule(id, Utc::now() + ChronoDuration::minutes(1), None, schedule_status::IDLE)
                }
            })
            .await?;
            continue;
        };

        let published_at = parse_ts_to_utc(&video.published_at)
            .map_err(|e| JobError::Framework(format!("bad published_at for video {}: {e}", video.id)))?;

        match upstream.media_metrics(schedule.video_id).await {
            Ok(counts) => {
                let measured_at = Utc::now();
                store_call({
                    let store = store.clone();
                    let video_id = schedule.video_id;
                    move || {
                        store.append_metric(
                            video_id,
                            counts.view_count,
                            counts.like_count,
                            counts.comment_count,
                            counts.save_count,
                            counts.followers_count,
                            measured_at,
                        )
                    }
                })
                .await?;

                let next_due = reel_schedule::next_due(published_at, measured_at);
                store_call({
                    let store = store.clone();
                    let id = schedule.id;
                    move || store.release_schedule(id, next_due, Some(measured_at), schedule_status::IDLE)
                })
                .await?;
            }
            Err(UpstreamError::NotFound(reason)) => {
                warn!(video_id = schedule.video_id, reason, "media gone, disabling schedule");
                let now = Utc::now();
                store_call({
                    let store = store.clone();
                    let id = schedule.id;
                    move || store.release_schedule(id, far_future(now), Some(now), schedule_status::DISABLED)
                })
                .await?;
            }
            Err(UpstreamError::RateLimit { retry_after }) => {
                let now = Utc::now();
                let next_due = now + ChronoDuration::from_std(retry_after)
                    .unwrap_or_else(|_| ChronoDuration::seconds(30));
                store_call({
                    let store = store.clone();
                    let id = schedule.id;
                    move || store.release_schedule(id, next_due, None, schedule_status::IDLE)
                })
                .await?;
                warn!(video_id = schedule.video_id, ?retry_after, "rate limited, ending this dispatch tick");
                break;
            }
            Err(err) if err.is_retriable() => {
                let next_due = Utc::now() + ChronoDuration::seconds(60);
                store_call({
                    let store = store.clone();
                    let id = schedule.id;
                    move || store.release_schedule(id, next_due, None, schedule_status::IDLE)
                })
                .await?;
            }
            Err(UpstreamError::Auth(reason)) => {
                let next_due = Utc::now() + ChronoDuration::seconds(60);
                store_call({
                    let store = store.clone();
                    let id = schedule.id;
                    move || store.release_schedule(id, next_due, None, schedule_status::IDLE)
                })
                .await?;
                warn!(video_id = schedule.video_id, reason, "auth failed, aborting this dispatch tick");
                return Ok(());
            }
            Err(err) => {
                // Anything else unclassified: treat like a transient
                // failure for this one schedule and keep going, since
                // later schedules in the batch are independent media.
                warn!(video_id = schedule.video_id, %err, "dispatch failed, retrying later");
                let next_due = Utc::now() + ChronoDuration::seconds(60);
                store_call({
                    let store = store.clone();
                    let id = schedule.id;
                    move || store.release_schedule(id, next_due, None, schedule_status::IDLE)
                })
                .await?;
            }
        }

        tokio::time::sleep(inter_metric_delay).await;
    }

    Ok(())
}
