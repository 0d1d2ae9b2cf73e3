//! Runs a blocking [`reel_store`] call on the `tokio` blocking pool, same
//! division of labor as `reel_scheduler::blocking::store_call`, retrying
//! transient Store errors with the same 0.5s/1s/2s backoff ladder.

use reel_store::StoreError;

pub async fn store_call<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnMut() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || reel_store::error::with_retry(f))
        .await
        .expect("store task panicked")
}
