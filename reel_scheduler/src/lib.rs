//! The periodic worker loop: four cadenced jobs driven by
//! `tokio-cron-scheduler`, each reentrancy-guarded and counted toward a
//! per-job failure cooldown.

pub mod blocking;
pub mod config;
pub mod error;
pub mod jobs;
pub mod reaper;
pub mod reentrancy;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use error::JobError;
pub use scheduler::Scheduler;
