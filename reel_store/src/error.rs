//! Error types surfaced by the store.

use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Failures raised by any [`crate::repo`] operation.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A retriable failure: connection drop, lock contention, busy timeout.
    #[error("transient store error: {0}")]
    Transient(String),

    /// A constraint violation that the caller can reasonably absorb (e.g. an
    /// upsert racing another writer).
    #[error("store conflict: {0}")]
    Conflict(String),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,
}

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(
                DatabaseErrorKind::UnableToSendCommand | DatabaseErrorKind::SerializationFailure,
                ref info,
            ) => StoreError::Transient(info.message().to_string()),
            other => StoreError::Transient(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::Error> for StoreError {
    fn from(e: diesel::r2d2::Error) -> Self {
        StoreError::Transient(e.to_string())
    }
}

/// Retries `f` up to 3 times with a 0.5s / 1s / 2s backoff ladder when it
/// returns [`StoreError::Transient`], per the Store's stated retry budget.
/// Any other error, or exhaustion of the budget, is returned immediately.
pub fn with_retry<T>(mut f: impl FnMut() -> Result<T, StoreError>) -> Result<T, StoreError> {
    const BACKOFF: [std::time::Duration; 3] = [
        std::time::Duration::from_millis(500),
        std::time::Duration::from_millis(1000),
        std::time::Duration::from_millis(2000),
    ];

    let mut attempt = 0;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(StoreError::Transient(msg)) => {
                if attempt >= BACKOFF.len() {
                    return Err(StoreError::Transient(msg));
                }
                std::thread::sleep(BACKOFF[attempt]);
                attempt += 1;
            }
            Err(other) => return Err(other),
        }
    }
}
