//! Bootstrap binary: loads configuration, opens the Store, starts the
//! Admin API and the Scheduler, then waits for a shutdown signal.

use std::sync::Arc;

use anyhow::Context;
use reel_admin_api::{build_router, AppState as AdminState};
use reel_enricher::{Enricher, HttpAudioExtractor, ProcessTranscriber};
use reel_scheduler::{Scheduler, SchedulerConfig};
use reel_shared::config::WorkerConfig;
use reel_shared::logging::init_tracing;
use reel_store::db::migrate;
use reel_store::repo::{heartbeat_status, Store};
use reel_upstream::{Upstream, UpstreamClient};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = run().await {
        error!(%err, "reel-worker exiting on startup failure");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env().context("loading configuration")?;
    init_tracing(&config.log_level);
    info!("reel-worker starting up");

    std::fs::create_dir_all(&config.audio_dir)
        .with_context(|| format!("creating audio dir {}", config.audio_dir.display()))?;

    migrate::run_all(&config.database_url).context("running migrations")?;
    let store = Store::open(&config.database_url, config.database_pool_size)
        .context("opening store")?;

    let upstream_client = UpstreamClient::new(
        config.credentials.clone(),
        config.session_path.clone(),
        config.proxy.clone(),
        config.upstream_request_timeout,
        config.upstream_retry_budget,
    )
    .context("building upstream client")?;
    upstream_client.authenticate().await.context("authenticating with upstream")?;
    let upstream: Arc<dyn reel_upstream::Upstream> = Arc::new(upstream_client);

    let http_client = reqwest::Client::new();
    let enricher = Arc::new(Enricher::new(
        Arc::new(HttpAudioExtractor::new(http_client)),
        Arc::new(ProcessTranscriber::new(transcribe_program(), transcribe_args())),
        config.audio_dir.clone(),
    ));

    let worker_name =
        reel_shared::env::get_env_var_opt("WORKER_NAME").unwrap_or_else(|| "reel-worker".to_string());

    let dispatch_due_interval = config.cadences.dispatch_due;
    let reaped = reel_scheduler::reaper::reap_startup(&store, dispatch_due_interval)
        .await
        .context("startup reaper")?;
    if reaped > 0 {
        info!(reaped, "recovered stale schedule leases from a previous run");
    }

    store
        .upsert_heartbeat(&worker_name, std::process::id() as i32, heartbeat_status::RUNNING)
        .context("sending initial heartbeat")?;

    let admin_bind = reel_shared::env::get_env_var_opt("ADMIN_BIND_ADDR")
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());
    let admin_state = AdminState {
        store: store.clone(),
        upstream: upstream.clone(),
        heartbeat_interval: config.cadences.heartbeat,
        worker_name: worker_name.clone(),
    };
    let admin_router = build_router(admin_state);
    let listener = tokio::net::TcpListener::bind(&admin_bind)
        .await
        .with_context(|| format!("binding admin API to {admin_bind}"))?;
    info!(addr = %admin_bind, "admin API listening");
    let admin_handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, admin_router).await {
            error!(%err, "admin API server exited with an error");
        }
    });

    let scheduler_config = SchedulerConfig::new(config.cadences, config.reels_limit, worker_name.clone());
    let scheduler = Arc::new(Scheduler::new(store.clone(), upstream, enricher, scheduler_config));
    let mut job_scheduler = scheduler.start().await.context("starting scheduler")?;

    shutdown_signal().await;
    info!("shutdown signal received, winding down");

    admin_handle.abort();
    if let Err(err) = job_scheduler.shutdown().await {
        error!(%err, "error shutting down scheduler");
    }

    store
        .upsert_heartbeat(&worker_name, std::process::id() as i32, heartbeat_status::STOPPED)
        .context("sending final heartbeat")?;

    info!("reel-worker shut down cleanly");
    Ok(())
}

fn transcribe_program() -> String {
    reel_shared::env::get_env_var_opt("TRANSCRIBE_PROGRAM").unwrap_or_else(|| "whisper".to_string())
}

fn transcribe_args() -> Vec<String> {
    reel_shared::env::get_env_var_opt("TRANSCRIBE_ARGS")
        .map(|raw| raw.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
