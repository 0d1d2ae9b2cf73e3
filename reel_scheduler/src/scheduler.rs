//! Wires the four named ticks (`discover`, `reschedule`, `dispatch-due`,
//! `heartbeat`) onto `tokio-cron-scheduler`'s repeated-interval jobs, each
//! behind its own [`crate::reentrancy::JobGuard`].

use std::sync::Arc;

use reel_enricher::Enricher;
use reel_store::Store;
use reel_upstream::Upstream;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::config::SchedulerConfig;
use crate::error::JobError;
use crate::jobs::{dispatch_due, discover, heartbeat, reschedule};
use crate::reentrancy::JobGuard;

/// Holds everything a tick needs: the Store, the Upstream client, the
/// Enricher, and this process's configuration. Wrapped in `Arc` so every
/// registered job closure can hold its own clone.
pub struct Scheduler {
    store: Store,
    upstream: Arc<dyn Upstream>,
    enricher: Arc<Enricher>,
    config: SchedulerConfig,
    discover_guard: JobGuard,
    reschedule_guard: JobGuard,
    dispatch_due_guard: JobGuard,
    heartbeat_guard: JobGuard,
}

impl Scheduler {
    pub fn new(
        store: Store,
        upstream: Arc<dyn Upstream>,
        enricher: Arc<Enricher>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            upstream,
            enricher,
            config,
            discover_guard: JobGuard::new("discover"),
            reschedule_guard: JobGuard::new("reschedule"),
            dispatch_due_guard: JobGuard::new("dispatch-due"),
            heartbeat_guard: JobGuard::new("heartbeat"),
        }
    }

    async fn run_discover(&self) -> Result<(), JobError> {
        discover::run(
            &self.store,
            self.upstream.as_ref(),
            self.enricher.as_ref(),
            self.config.reels_limit,
            self.config.inter_account_delay,
        )
        .await
    }

    async fn run_reschedule(&self) -> Result<(), JobError> {
        reschedule::run(&self.store).await
    }

    async fn run_dispatch_due(&self) -> Result<(), JobError> {
        dispatch_due::run(
            &self.store,
            self.upstream.as_ref(),
            self.config.dispatch_batch_limit,
            self.config.inter_metric_delay,
        )
        .await
    }

    async fn run_heartbeat(&self) -> Result<(), JobError> {
        heartbeat::run(&self.store, &self.config.worker_name, std::process::id() as i32).await
    }

    /// Runs the startup reaper, then builds and starts the
    /// `tokio-cron-scheduler` instance. The caller owns the returned
    /// [`JobScheduler`] and is responsible for shutting it down.
    pub async fn start(self: Arc<Self>) -> Result<JobScheduler, JobError> {
        crate::reaper::reap_startup(&self.store, self.config.cadences.dispatch_due).await?;

        let mut sched = JobScheduler::new().await.map_err(|e| JobError::Framework(e.to_string()))?;

        let discover = {
            let this = self.clone();
            Job::new_repeated_async(self.config.cadences.discover, move |_uuid, _lock| {
                let this = this.clone();
                Box::pin(async move { this.discover_guard.run(|| this.run_discover()).await })
            })
            .map_err(|e| JobError::Framework(e.to_string()))?
        };

        let reschedule = {
            let this = self.clone();
            Job::new_repeated_async(self.config.cadences.reschedule, move |_uuid, _lock| {
                let this = this.clone();
                Box::pin(async move { this.reschedule_guard.run(|| this.run_reschedule()).await })
            })
            .map_err(|e| JobError::Framework(e.to_string()))?
        };

        let dispatch_due = {
            let this = self.clone();
            Job::new_repeated_async(self.config.cadences.dispatch_due, move |_uuid, _lock| {
                let this = this.clone();
                Box::pin(async move { this.dispatch_due_guard.run(|| this.run_dispatch_due()).await })
            })
            .map_err(|e| JobError::Framework(e.to_string()))?
        };

        let heartbeat = {
            let this = self.clone();
            Job::new_repeated_async(self.config.cadences.heartbeat, move |_uuid, _lock| {
                let this = this.clone();
                Box::pin(async move { this.heartbeat_guard.run(|| this.run_heartbeat()).await })
            })
            .map_err(|e| JobError::Framework(e.to_string()))?
        };

        for job in [discover, reschedule, dispatch_due, heartbeat] {
            sched.add(job).await.map_err(|e| JobError::Framework(e.to_string()))?;
        }

        sched.start().await.map_err(|e| JobError::Framework(e.to_string()))?;
        info!("scheduler started");
        Ok(sched)
    }
}
