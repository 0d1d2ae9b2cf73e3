//! Startup reaper: returns any schedule stuck in
//! `running` past the lease timeout back to `idle`, recovering from a
//! process crash between `claim_due_schedules` and `release_schedule`.
//! Run once at bootstrap, before the scheduler starts ticking.

use std::time::Duration as StdDuration;

use chrono::Duration as ChronoDuration;
use reel_store::{Store, StoreError};

/// The lease timeout is 10x the `dispatch-due` interval.
pub fn lease_timeout(dispatch_due_interval: StdDuration) -> StdDuration {
    dispatch_due_interval * 10
}

/// Reaps stale leases, returning how many rows were recovered.
pub async fn reap_startup(store: &Store, dispatch_due_interval: StdDuration) -> Result<usize, StoreError> {
    let timeout = lease_timeout(dispatch_due_interval);
    let chrono_timeout =
        ChronoDuration::from_std(timeout).unwrap_or_else(|_| ChronoDuration::seconds(600));

    let store = store.clone();
    tokio::task::spawn_blocking(move || store.reap_stale_schedules(chrono_timeout))
        .await
        .expect("reaper task panicked")
}
