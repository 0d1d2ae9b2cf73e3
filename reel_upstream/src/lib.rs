//! The Upstream Client component: authenticated access to the upstream
//! platform's four operations, behind a single-concurrency, jittered gate.

pub mod client;
pub mod error;
pub mod models;
pub mod session;

pub use client::{Upstream, UpstreamClient};
pub use error::UpstreamError;
pub use models::{MediaSummary, MetricSnapshot, SessionHandle};
