use thiserror::Error;

/// Failure taxonomy the Upstream Client exposes upward.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Credentials invalid or a challenge was required. Fatal for the
    /// current tick, not for the worker process.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Media was removed or the account is private/not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The upstream asked us to back off; `retry_after` is advisory.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimit { retry_after: std::time::Duration },

    /// A retriable network-level failure (timeout, connection reset, DNS).
    #[error("transient network error: {0}")]
    TransientNetwork(#[from] reqwest::Error),

    /// The upstream responded with an unexpected non-success status
    /// (typically 5xx); worth the same local retry as a network error.
    #[error("upstream server error: {0}")]
    ServerError(String),

    /// Session persistence (read or write of the session blob) failed.
    #[error("session persistence error: {0}")]
    SessionIo(#[from] std::io::Error),
}

impl UpstreamError {
    /// True for errors worth a local retry against the configured budget.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            UpstreamError::TransientNetwork(_) | UpstreamError::ServerError(_)
        )
    }
}
