//! Per-job reentrancy guard and consecutive-failure cooldown.
//!
//! Each named job (`discover`, `reschedule`, `dispatch-due`, `heartbeat`) is
//! guarded independently: a tick that fires while the previous invocation
//! of the *same* job is still running is skipped, logged at info. Different
//! jobs never contend with each other here; they only ever coordinate
//! through the Store.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::JobError;

/// Ticks beyond which a job is paused for one interval: once consecutive
/// failures for a job exceed this, that job's next tick is skipped and the
/// counter resets.
const FAILURE_PAUSE_THRESHOLD: u32 = 5;

pub struct JobGuard {
    name: &'static str,
    lock: Mutex<()>,
    consecutive_failures: AtomicU32,
}

impl JobGuard {
    pub fn new(name: &'static str) -> Self {
        Self { name, lock: Mutex::new(()), consecutive_failures: AtomicU32::new(0) }
    }

    /// Runs `f` if no other invocation of this job is in flight and the job
    /// isn't in its post-failure cooldown tick; otherwise logs and returns
    /// immediately.
    pub async fn run<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), JobError>>,
    {
        let Ok(_permit) = self.lock.try_lock() else {
            info!(job = self.name, "tick skipped: previous invocation still running");
            return;
        };

        if self.consecutive_failures.load(Ordering::Relaxed) > FAILURE_PAUSE_THRESHOLD {
            warn!(job = self.name, "pausing for one interval after repeated job-level failures");
            self.consecutive_failures.store(0, Ordering::Relaxed);
            return;
        }

        match f().await {
            Ok(()) => self.consecutive_failures.store(0, Ordering::Relaxed),
            Err(err) => {
                let n = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                error!(job = self.name, %err, consecutive_failures = n, "job tick failed");
            }
        }
    }
}
