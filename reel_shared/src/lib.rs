//! Small, dependency-light helpers shared by every crate in the workspace:
//! environment variable access, typed worker configuration, and the
//! process-wide tracing setup.

pub mod config;
pub mod env;
pub mod logging;

pub use config::{Cadences, ConfigError, Credentials, FallbackCredentials, WorkerConfig};
