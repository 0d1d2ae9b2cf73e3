mod common;

use chrono::{Duration, Utc};
use reel_store::repo::schedule_status;
use std::collections::HashSet;
use std::thread;

fn seed_due_schedules(store: &reel_store::repo::Store, n: i64, account_id: i64) {
    store.upsert_account(account_id, &format!("acct-{account_id}"), None, 0).unwrap();
    let past_due = Utc::now() - Duration::seconds(5);
    for i in 0..n {
        let video_id = account_id * 1000 + i;
        let v = store
            .upsert_video(
                video_id,
                &format!("sc-{video_id}"),
                account_id,
                "https://example.test/v",
                None,
                None,
                None,
                None,
                None,
                past_due,
            )
            .unwrap();
        store
            .upsert_schedule(v.video_id, past_due, None, 3600, schedule_status::IDLE)
            .unwrap();
    }
}

#[test]
fn claim_due_schedules_leases_only_idle_due_rows() {
    let (_db, store) = common::setup_store();
    seed_due_schedules(&store, 3, 1);

    // One schedule not yet due: must never be claimed.
    let future = Utc::now() + Duration::hours(1);
    store.upsert_account(2, "future-owner", None, 0).unwrap();
    let v = store
        .upsert_video(2001, "future", 2, "u", None, None, None, None, None, future)
        .unwrap();
    store
        .upsert_schedule(v.video_id, future, None, 3600, schedule_status::IDLE)
        .unwrap();

    let claimed = store.claim_due_schedules(Utc::now(), 10).unwrap();
    assert_eq!(claimed.len(), 3);
    assert!(claimed.iter().all(|s| s.status == schedule_status::RUNNING));
    assert!(claimed.iter().all(|s| s.video_id != v.video_id));
}

#[test]
fn claim_due_schedules_respects_limit() {
    let (_db, store) = common::setup_store();
    seed_due_schedules(&store, 5, 1);

    let first = store.claim_due_schedules(Utc::now(), 2).unwrap();
    assert_eq!(first.len(), 2);

    let second = store.claim_due_schedules(Utc::now(), 10).unwrap();
    assert_eq!(second.len(), 3, "already-leased rows must not be reclaimed");
}

#[test]
fn concurrent_claims_are_disjoint_and_cover_all_due_rows() {
    let (db, store) = common::setup_store();
    seed_due_schedules(&store, 10, 1);

    let path_a = db.path.clone();
    let path_b = db.path.clone();

    let now = Utc::now();
    let handle_a = thread::spawn(move || {
        let store_a = reel_store::repo::Store::open(&path_a, 5).unwrap();
        store_a.claim_due_schedules(now, 6).unwrap()
    });
    let handle_b = thread::spawn(move || {
        let store_b = reel_store::repo::Store::open(&path_b, 5).unwrap();
        store_b.claim_due_schedules(now, 6).unwrap()
    });

    let batch_a = handle_a.join().unwrap();
    let batch_b = handle_b.join().unwrap();

    let ids_a: HashSet<i32> = batch_a.iter().map(|s| s.id).collect();
    let ids_b: HashSet<i32> = batch_b.iter().map(|s| s.id).collect();

    assert!(ids_a.is_disjoint(&ids_b), "concurrent claims must never overlap");
    assert_eq!(ids_a.len() + ids_b.len(), 10, "every due row must be claimed exactly once");
}

#[test]
fn release_schedule_round_trips_to_idle_with_advanced_due_time() {
    let (_db, store) = common::setup_store();
    seed_due_schedules(&store, 1, 1);

    let claimed = store.claim_due_schedules(Utc::now(), 10).unwrap();
    assert_eq!(claimed.len(), 1);
    let lease = &claimed[0];

    let next_due = Utc::now() + Duration::hours(1);
    store
        .release_schedule(lease.id, next_due, Some(Utc::now()), schedule_status::IDLE)
        .unwrap();

    let refreshed = store.schedule_for_video(lease.video_id).unwrap().unwrap();
    assert_eq!(refreshed.status, schedule_status::IDLE);
    assert!(refreshed.next_due_at > Utc::now().to_rfc3339());
}

#[test]
fn media_gone_disables_schedule_permanently() {
    let (_db, store) = common::setup_store();
    seed_due_schedules(&store, 1, 1);
    let claimed = store.claim_due_schedules(Utc::now(), 10).unwrap();
    let lease = &claimed[0];

    let far_future = Utc::now() + Duration::days(3650);
    store
        .release_schedule(lease.id, far_future, None, schedule_status::DISABLED)
        .unwrap();

    let refreshed = store.schedule_for_video(lease.video_id).unwrap().unwrap();
    assert_eq!(refreshed.status, schedule_status::DISABLED);
}

#[test]
fn reaper_returns_stale_running_leases_to_idle() {
    let (_db, store) = common::setup_store();
    seed_due_schedules(&store, 2, 1);
    let claimed = store.claim_due_schedules(Utc::now(), 10).unwrap();
    assert_eq!(claimed.len(), 2);

    // Not stale yet: a short lease timeout should leave fresh leases alone.
    let reaped_none = store.reap_stale_schedules(Duration::hours(1)).unwrap();
    assert_eq!(reaped_none, 0);

    // Simulate a crash: treat anything claimed "just now" as older than a
    // zero-length timeout, which is always true.
    let reaped = store.reap_stale_schedules(Duration::seconds(-1)).unwrap();
    assert_eq!(reaped, 2);

    for s in &claimed {
        let refreshed = store.schedule_for_video(s.video_id).unwrap().unwrap();
        assert_eq!(refreshed.status, schedule_status::IDLE);
    }
}

#[test]
fn reentrant_claim_after_release_can_pick_the_row_up_again() {
    let (_db, store) = common::setup_store();
    seed_due_schedules(&store, 1, 1);

    let claimed = store.claim_due_schedules(Utc::now(), 10).unwrap();
    let lease = &claimed[0];
    store
        .release_schedule(lease.id, Utc::now() - Duration::seconds(1), None, schedule_status::IDLE)
        .unwrap();

    let claimed_again = store.claim_due_schedules(Utc::now(), 10).unwrap();
    assert_eq!(claimed_again.len(), 1);
    assert_eq!(claimed_again[0].video_id, lease.video_id);
}

#[test]
fn claim_due_schedules_with_zero_limit_returns_empty() {
    let (_db, store) = common::setup_store();
    seed_due_schedules(&store, 3, 1);
    let claimed = store.claim_due_schedules(Utc::now(), 0).unwrap();
    assert!(claimed.is_empty());
}
