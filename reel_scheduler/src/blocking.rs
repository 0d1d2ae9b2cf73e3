//! Runs a blocking (Diesel) [`reel_store`] call on the `tokio` blocking pool
//! so it never stalls the cooperative scheduling loop.

use reel_store::StoreError;

/// Runs `f` via `tokio::task::spawn_blocking`, retrying on
/// [`StoreError::Transient`] with a bounded 0.5s/1s/2s backoff ladder
/// before giving up. Panics if the blocking task itself
/// panics, the same way `.await`ing a `JoinHandle` in the rest of this
/// crate does: a panicked Store call is a programming error, not a
/// condition a job should try to recover from.
pub async fn store_call<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnMut() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || reel_store::error::with_retry(f))
        .await
        .expect("store task panicked")
}
