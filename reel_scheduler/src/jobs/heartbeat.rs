//! The `heartbeat` tick: upserts this process's liveness row.

use reel_store::Store;
use reel_store::repo::heartbeat_status;

use crate::blocking::store_call;
use crate::error::JobError;

pub async fn run(store: &Store, worker_name: &str, pid: i32) -> Result<(), JobError> {
    store_call({
        let store = store.clone();
        let worker_name = worker_name.to_string();
        move || store.upsert_heartbeat(&worker_name, pid, heartbeat_status::RUNNING)
    })
    .await?;
    Ok(())
}
