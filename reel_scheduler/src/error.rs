//! Errors that can propagate out of a job *tick* (as opposed to the
//! per-item errors every job loop is required to catch and log internally;
//! those never reach this type).

use reel_store::StoreError;

/// A job-level failure: the Store itself was unreachable, or a scheduler
/// framework failure. These propagate to the [`crate::Scheduler`], which
/// counts consecutive failures and pauses the job for one interval once
/// the count exceeds 5.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("scheduler framework error: {0}")]
    Framework(String),
}
