use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use reel_store::repo::heartbeat_status;
use reel_store::time::parse_ts_to_utc;
use reel_upstream::UpstreamError;
use tracing::warn;

use crate::blocking::store_call;
use crate::dto::{
    AccountView, HealthStatus, HealthView, SeedAccount, SeedOutcome, SeedRejection, SeedRequest,
    VideoView,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Default page size for `GET /videos/recent` when `limit` is omitted.
const DEFAULT_RECENT_LIMIT: i64 = 20;

pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<AccountView>>, ApiError> {
    let rows = store_call({
        let store = state.store.clone();
        move || store.list_accounts_with_counts()
    })
    .await?;

    Ok(Json(rows.into_iter().map(|(a, n)| AccountView::from_row(a, n)).collect()))
}

pub async fn list_recent_videos(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<VideoView>>, ApiError> {
    let limit = params
        .get("limit")
        .map(|s| s.parse::<i64>().map_err(|_| ApiError::BadRequest("limit must be an integer".into())))
        .transpose()?
        .unwrap_or(DEFAULT_RECENT_LIMIT);

    if limit <= 0 {
        return Err(ApiError::BadRequest("limit must be positive".into()));
    }

    let rows = store_call({
        let store = state.store.clone();
        move || store.list_recent_videos_with_latest_metric(limit)
    })
    .await?;

    Ok(Json(rows.into_iter().map(|(v, m)| VideoView::from_row(v, m)).collect()))
}

/// `running` within `2x` the heartbeat interval, `stale` within `10x`,
/// otherwise `stopped`.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthView>, ApiError> {
    let heartbeat = store_call({
        let store = state.store.clone();
        let worker_name = state.worker_name.clone();
        move || store.get_heartbeat(&worker_name)
    })
    .await?;

    let Some(heartbeat) = heartbeat else {
        return Ok(Json(HealthView {
            status: HealthStatus::Stopped,
            worker_name: state.worker_name,
            last_heartbeat: None,
        }));
    };

    let status = if heartbeat.status != heartbeat_status::RUNNING {
        HealthStatus::Stopped
    } else {
        match parse_ts_to_utc(&heartbeat.last_heartbeat) {
            Ok(last) => {
                let age = Utc::now().signed_duration_since(last);
                let interval = chrono::Duration::from_std(state.heartbeat_interval)
                    .unwrap_or_else(|_| chrono::Duration::seconds(60));
                if age <= interval * 2 {
                    HealthStatus::Running
                } else if age <= interval * 10 {
                    HealthStatus::Stale
                } else {
                    HealthStatus::Stopped
                }
            }
            Err(err) => {
                warn!(%err, "unparseable last_heartbeat timestamp");
                HealthStatus::Stopped
            }
        }
    };

    Ok(Json(HealthView {
        status,
        worker_name: state.worker_name,
        last_heartbeat: Some(heartbeat.last_heartbeat),
    }))
}

/// Bulk-seeds accounts. Records with a known `user_pk` are inserted
/// directly; records that only carry a `username` are resolved through the
/// Upstream client first. A resolution failure rejects that one record
/// instead of failing the whole batch.
pub async fn seed_accounts(
    State(state): State<AppState>,
    Json(req): Json<SeedRequest>,
) -> Result<Json<SeedOutcome>, ApiError> {
    let mut seeded = Vec::new();
    let mut rejected = Vec::new();

    for SeedAccount { username, user_pk } in req.accounts {
        let resolved = match user_pk {
            Some(pk) => Ok(pk),
            None => state.upstream.resolve_username(&username).await.map_err(|err| match err {
                UpstreamError::NotFound(reason) => reason,
                other => other.to_string(),
            }),
        };

        let user_pk = match resolved {
            Ok(pk) => pk,
            Err(reason) => {
                rejected.push(SeedRejection { username, reason });
                continue;
            }
        };

        let account = store_call({
            let store = state.store.clone();
            let username = username.clone();
            move || store.upsert_account(user_pk, &username, None, 0)
        })
        .await?;

        seeded.push(AccountView::from_row(account, 0));
    }

    Ok(Json(SeedOutcome { seeded, rejected }))
}
