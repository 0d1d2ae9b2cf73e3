//! The `discover` job: for every tracked account, fetch its
//! most recent media, enrich and insert whatever hasn't been seen before,
//! and seed a first metric schedule for each new video.

use std::time::Duration;

use chrono::Utc;
use reel_enricher::Enricher;
use reel_store::Store;
use reel_store::repo::schedule_status;
use reel_upstream::{MediaSummary, Upstream, UpstreamError};
use tracing::{info, warn};

use crate::blocking::store_call;
use crate::error::JobError;

/// Default `REELS_LIMIT` used if the caller doesn't override it; mirrors
/// `WORKER_REELS_LIMIT`'s own default.
pub const DEFAULT_REELS_LIMIT: i64 = 50;

pub async fn run(
    store: &Store,
    upstream: &dyn Upstream,
    enricher: &Enricher,
    reels_limit: i64,
    inter_account_delay: Duration,
) -> Result<(), JobError> {
    let accounts = store_call({
        let store = store.clone();
        move || store.list_accounts()
    })
    .await?;

    for account in accounts {
        let media = match upstream.recent_media(account.id, reels_limit).await {
            Ok(media) => media,
            Err(UpstreamError::NotFound(reason)) => {
                info!(account_id = account.id, reason, "account not found upstream, skipping");
                continue;
            }
            Err(err @ (UpstreamError::Auth(_) | UpstreamError::RateLimit { .. })) => {
                warn!(account_id = account.id, %err, "aborting discover tick");
                return Ok(());
            }
            Err(err) => {
                warn!(account_id = account.id, %err, "skipping account this tick");
                continue;
            }
        };

        refresh_follower_count(store, &account.id, account.profile_url.as_deref(), &account.username, &media)
            .await?;

        for item in &media {
            let existing = store_call({
                let store = store.clone();
                let shortcode = item.shortcode.clone();
                move || store.get_video_by_shortcode(&shortcode)
            })
            .await?;

            if existing.is_some() {
                // Upstream returns newest-first; once we hit a shortcode we
                // already have, assume everything older was processed by a
                // previous tick.
                break;
            }

            let shortcode = item.shortcode.clone();
            let enriched = enricher.enrich(&shortcode, &item.url).await;

            let video = store_call({
                let store = store.clone();
                let item = item.clone();
                let account_id = account.id;
                let audio_file_path =
                    enriched.audio_file_path.as_ref().map(|p| p.to_string_lossy().into_owned());
                let transcription = enriched.transcription.clone();
                move || {
                    store.upsert_video(
                        item.video_id,
                        &item.shortcode,
                        account_id,
                        &item.url,
                        item.audio_url.as_deref(),
                        audio_file_path.as_deref(),
                        transcription.as_deref(),
                        item.caption.as_deref(),
                        item.duration_seconds,
                        item.published_at,
                    )
                }
            })
            .await?;

            let now = Utc::now();
            let next_due = reel_schedule::next_due(item.published_at, now);
            let interval_seconds = (next_due - now).num_seconds().max(0) as i32;

            store_call({
                let store = store.clone();
                let video_id = video.video_id;
                move || {
                    store.upsert_schedule(
                        video_id,
                        next_due,
                        None,
                        interval_seconds,
                        schedule_status::IDLE,
                    )
                }
            })
            .await?;
        }

        tokio::time::sleep(inter_account_delay).await;
    }

    Ok(())
}

/// Accounts are also updated by `discover`: the follower count carried on
/// the newest media item is the freshest signal we have without a
/// dedicated "account info" upstream call.
async fn refresh_follower_count(
    store: &Store,
    account_id: &i64,
    profile_url: Option<&str>,
    username: &str,
    media: &[MediaSummary],
) -> Result<(), JobError> {
    let Some(newest) = media.first() else { return Ok(()) };

    store_call({
        let store = store.clone();
        let account_id = *account_id;
        let username = username.to_string();
        let profile_url = profile_url.map(str::to_string);
        let followers_count = newest.followers_count;
        move || store.upsert_account(account_id, &username, profile_url.as_deref(), followers_count)
    })
    .await?;

    Ok(())
}
