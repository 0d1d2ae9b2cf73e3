//! Scheduler-specific configuration, derived from [`reel_shared::Cadences`]
//! plus the handful of knobs the jobs themselves need (batch sizes,
//! inter-item delays) that aren't part of the shared worker config.

use std::time::Duration;

use reel_shared::Cadences;

use crate::jobs::{dispatch_due, discover};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub cadences: Cadences,
    pub reels_limit: i64,
    /// Sleep between accounts within one `discover` tick (default: 10s).
    pub inter_account_delay: Duration,
    /// Sleep between schedules within one `dispatch-due` tick (default: 0.5s).
    pub inter_metric_delay: Duration,
    /// Max schedules claimed per `dispatch-due` tick.
    pub dispatch_batch_limit: i64,
    /// Identifies this process's row in `worker_heartbeats`.
    pub worker_name: String,
}

impl SchedulerConfig {
    pub fn new(cadences: Cadences, reels_limit: i64, worker_name: impl Into<String>) -> Self {
        Self {
            cadences,
            reels_limit,
            inter_account_delay: Duration::from_secs(10),
            inter_metric_delay: Duration::from_millis(500),
            dispatch_batch_limit: dispatch_due::DEFAULT_BATCH_LIMIT,
            worker_name: worker_name.into(),
        }
    }
}

/// The default reels-per-account limit, re-exported so callers that want
/// it don't need to hardcode it again.
pub const DEFAULT_REELS_LIMIT: i64 = discover::DEFAULT_REELS_LIMIT;
