mod common;

use chrono::{Duration, Utc};
use reel_store::StoreError;
use reel_store::repo::schedule_status;

#[test]
fn account_upsert_is_idempotent_on_mutable_fields_only() {
    let (db, store) = common::setup_store();

    store
        .upsert_account(42, "creator", Some("https://example.test/creator"), 100)
        .expect("first upsert");
    let a2 = store
        .upsert_account(42, "creator", Some("https://example.test/creator-new"), 500)
        .expect("second upsert");

    assert_eq!(a2.id, 42);
    assert_eq!(a2.username, "creator");
    assert_eq!(a2.followers_count, 500);
    assert_eq!(a2.profile_url.as_deref(), Some("https://example.test/creator-new"));

    let accounts = store.list_accounts().expect("list");
    assert_eq!(accounts.len(), 1, "conflicting id must not create a duplicate row");
}

#[test]
fn video_upsert_leaves_immutable_fields_alone_and_fills_null_enrichment() {
    let (db, store) = common::setup_store();
    store.upsert_account(1, "a", None, 0).unwrap();

    let published = Utc::now() - Duration::hours(2);
    let v1 = store
        .upsert_video(
            500, "sc1", 1, "https://example.test/v/500", None, None, None, Some("first caption"),
            Some(10), published,
        )
        .expect("insert");
    assert!(v1.audio_file_path.is_none());
    assert!(v1.transcription.is_none());

    // Same video_id again: immutable fields (shortcode, account_id, published_at,
    // caption) are untouched; nullable enrichment fields are filled in.
    let v2 = store
        .upsert_video(
            500,
            "sc1-changed",
            1,
            "https://example.test/v/500",
            Some("https://cdn.example.test/500.mp3"),
            Some("/audio/sc1.mp3"),
            Some("hello there"),
            Some("second caption"),
            Some(99),
            published,
        )
        .expect("retry enrichment");

    assert_eq!(v2.id, v1.id);
    assert_eq!(v2.shortcode, "sc1", "shortcode is immutable once set");
    assert_eq!(v2.caption.as_deref(), Some("first caption"), "caption is immutable");
    assert_eq!(v2.duration_seconds, Some(10));
    assert_eq!(v2.audio_file_path.as_deref(), Some("/audio/sc1.mp3"));
    assert_eq!(v2.transcription.as_deref(), Some("hello there"));

    // A third call must not clobber the now-filled enrichment fields.
    let v3 = store
        .upsert_video(
            500, "sc1-again", 1, "https://example.test/v/500", None, Some("/audio/other.mp3"),
            Some("should not apply"), None, None, published,
        )
        .expect("third call");
    assert_eq!(v3.audio_file_path.as_deref(), Some("/audio/sc1.mp3"));
    assert_eq!(v3.transcription.as_deref(), Some("hello there"));
}

#[test]
fn discover_rerun_with_no_new_media_is_a_noop_on_row_counts() {
    let (db, store) = common::setup_store();
    store.upsert_account(1, "a", None, 0).unwrap();
    let published = Utc::now() - Duration::minutes(10);

    for _ in 0..2 {
        let v = store
            .upsert_video(
                7, "stable", 1, "https://example.test/v/7", None, None, None, None, None,
                published,
            )
            .unwrap();
        store
            .upsert_schedule(
                v.video_id,
                published + Duration::hours(1),
                None,
                3600,
                schedule_status::IDLE,
            )
            .unwrap();
    }

    assert_eq!(common::count(&mut common::connect(&db.path), "videos"), 1);
    assert_eq!(common::count(&mut common::connect(&db.path), "metric_schedules"), 1);
}

#[test]
fn metrics_are_append_only_and_strictly_ordered() {
    let (db, store) = common::setup_store();
    store.upsert_account(1, "a", None, 0).unwrap();
    let v = store
        .upsert_video(7, "sc", 1, "https://example.test/v/7", None, None, None, None, None, Utc::now())
        .unwrap();

    let t0 = Utc::now() - Duration::hours(2);
    let m1 = store
        .append_metric(v.video_id, 100, 10, 1, None, 1000, t0)
        .unwrap();
    let m2 = store
        .append_metric(v.video_id, 200, 20, 2, Some(5), 1000, t0 + Duration::hours(1))
        .unwrap();

    assert_eq!(m1.video_id, v.video_id);
    assert!(m2.measured_at > m1.measured_at);
    assert_eq!(m2.save_count, Some(5));
    assert_eq!(common::count(&mut common::connect(&db.path), "metrics"), 2);
}

#[test]
fn video_id_and_shortcode_uniqueness_is_enforced() {
    let (db, store) = common::setup_store();
    store.upsert_account(1, "a", None, 0).unwrap();

    store
        .upsert_video(7, "same-shortcode", 1, "u", None, None, None, None, None, Utc::now())
        .unwrap();

    // duplicate video_id, different shortcode: conflict target is video_id,
    // so this is treated as a retry, not a new row or an error.
    let again = store.upsert_video(7, "different", 1, "u", None, None, None, None, None, Utc::now());
    assert!(again.is_ok());
    assert_eq!(common::count(&mut common::connect(&db.path), "videos"), 1);
}

#[test]
fn heartbeat_upsert_tracks_latest_status() {
    let (db, store) = common::setup_store();
    store.upsert_heartbeat("reel-worker", 1234, "running").unwrap();
    let hb = store.get_heartbeat("reel-worker").unwrap().expect("heartbeat row");
    assert_eq!(hb.status, "running");
    assert_eq!(hb.pid, 1234);

    store.upsert_heartbeat("reel-worker", 1234, "stopped").unwrap();
    let hb2 = store.get_heartbeat("reel-worker").unwrap().unwrap();
    assert_eq!(hb2.status, "stopped");
    assert_eq!(common::count(&mut common::connect(&db.path), "worker_heartbeats"), 1);
}

#[test]
fn release_on_unknown_schedule_id_is_not_found() {
    let (db, store) = common::setup_store();
    let err = store
        .release_schedule(999_999, Utc::now(), None, schedule_status::IDLE)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}
