//! Typed worker configuration, assembled once from the process environment.
//!
//! Environment variables are resolved into a single explicit Rust type at
//! load time rather than read ad hoc throughout the worker: every field
//! here is read via [`crate::env::get_env_var`] / [`crate::env::get_env_var_opt`]
//! so unknown environment keys are silently ignored and required keys fail
//! fast with a named error.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use snafu::prelude::*;
use url::Url;

use crate::env::{MissingEnvVarError, get_env_var, get_env_var_opt};

/// Errors that can occur while assembling a [`WorkerConfig`] from the
/// environment.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[snafu(display("{source}"))]
    MissingVar { source: MissingEnvVarError },

    /// A variable was present but could not be parsed into the expected type.
    #[snafu(display("invalid value for {name}: {message}"))]
    InvalidValue { name: String, message: String },

    /// Neither a session token nor a username/password pair was supplied.
    #[snafu(display(
        "no upstream credentials configured: set SESSION_TOKEN or both USERNAME and PASSWORD"
    ))]
    MissingCredentials,

    /// `PROXY` was set but its scheme isn't one the upstream client supports.
    #[snafu(display(
        "unsupported proxy scheme {scheme:?}: expected http, https, socks5, or socks5h"
    ))]
    UnsupportedProxyScheme { scheme: String },
}

impl From<MissingEnvVarError> for ConfigError {
    fn from(source: MissingEnvVarError) -> Self {
        ConfigError::MissingVar { source }
    }
}

/// Resolved upstream credential mode, precedence decided once at load time
/// (session file, then session token, then username/password) so nothing
/// downstream re-derives it.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Reuse persisted session blob at `session_path` if present there;
    /// fall back to `fallback` otherwise. `session_path` is always set
    /// (defaults to `session.json`) so this variant is always the one
    /// produced by [`WorkerConfig::from_env`]; the distinction between
    /// "mode (a)" and "mode (b)/(c)" is made by the upstream client at
    /// authenticate() time by checking whether the file exists.
    SessionFileOrFallback {
        session_path: PathBuf,
        fallback: Box<FallbackCredentials>,
    },
}

/// The credential mode to use when no persisted session blob is available.
#[derive(Debug, Clone)]
pub enum FallbackCredentials {
    /// Session token plus optional CSRF token (mode b).
    SessionToken {
        token: SecretString,
        csrf_token: Option<String>,
    },
    /// Username and password (mode c).
    UsernamePassword {
        username: String,
        password: SecretString,
    },
}

/// Cadences for the four scheduler ticks. In test mode these compress to
/// 10-30s so integration tests don't wait hours; in production they follow
/// `WORKER_INTERVAL_HOURS` for discover and fixed defaults for the rest.
#[derive(Debug, Clone, Copy)]
pub struct Cadences {
    pub discover: Duration,
    pub reschedule: Duration,
    pub dispatch_due: Duration,
    pub heartbeat: Duration,
}

impl Cadences {
    fn production(discover_hours: u64) -> Self {
        Self {
            discover: Duration::from_secs(discover_hours * 3600),
            reschedule: Duration::from_secs(3600),
            dispatch_due: Duration::from_secs(60),
            heartbeat: Duration::from_secs(30),
        }
    }

    fn test_mode() -> Self {
        Self {
            discover: Duration::from_secs(30),
            reschedule: Duration::from_secs(20),
            dispatch_due: Duration::from_secs(10),
            heartbeat: Duration::from_secs(10),
        }
    }
}

/// Fully resolved worker configuration. Construct via [`WorkerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub database_pool_size: u32,
    pub cadences: Cadences,
    pub reels_limit: i64,
    pub audio_dir: PathBuf,
    pub credentials: Credentials,
    pub proxy: Option<Url>,
    pub session_path: PathBuf,
    pub test_mode: bool,
    pub log_level: String,
    /// Per-call deadline for upstream requests, not independently
    /// configurable via environment.
    pub upstream_request_timeout: Duration,
    /// Local retry budget for transient upstream failures.
    pub upstream_retry_budget: u32,
}

const SUPPORTED_PROXY_SCHEMES: [&str; 4] = ["http", "https", "socks5", "socks5h"];

impl WorkerConfig {
    /// Loads configuration from the process environment. Unknown
    /// environment keys are ignored so this can share an env file with
    /// other services.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = get_env_var("DATABASE_URL")?;

        let database_pool_size = parse_opt_default("DATABASE_POOL_SIZE", 5)?;
        let discover_hours = parse_opt_default("WORKER_INTERVAL_HOURS", 6u64)?;
        let reels_limit = parse_opt_default("WORKER_REELS_LIMIT", 50i64)?;
        let audio_dir = PathBuf::from(get_env_var_opt("AUDIO_DIR").unwrap_or_else(|| "audio".into()));
        let session_path =
            PathBuf::from(get_env_var_opt("SESSION_FILE").unwrap_or_else(|| "session.json".into()));
        let test_mode = parse_opt_default("TEST_MODE", false)?;
        let log_level = get_env_var_opt("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let proxy = match get_env_var_opt("PROXY") {
            Some(raw) => Some(parse_proxy(&raw)?),
            None => None,
        };

        let fallback = load_fallback_credentials()?;
        let credentials = Credentials::SessionFileOrFallback {
            session_path: session_path.clone(),
            fallback: Box::new(fallback),
        };

        let cadences = if test_mode {
            Cadences::test_mode()
        } else {
            Cadences::production(discover_hours)
        };

        Ok(Self {
            database_url,
            database_pool_size,
            cadences,
            reels_limit,
            audio_dir,
            credentials,
            proxy,
            session_path,
            test_mode,
            log_level,
            upstream_request_timeout: Duration::from_secs(30),
            upstream_retry_budget: 3,
        })
    }
}

fn load_fallback_credentials() -> Result<FallbackCredentials, ConfigError> {
    if let Some(token) = get_env_var_opt("SESSION_TOKEN") {
        return Ok(FallbackCredentials::SessionToken {
            token: SecretString::from(token),
            csrf_token: get_env_var_opt("CSRF_TOKEN"),
        });
    }

    let username = get_env_var_opt("USERNAME");
    let password = get_env_var_opt("PASSWORD");
    match (username, password) {
        (Some(username), Some(password)) => Ok(FallbackCredentials::UsernamePassword {
            username,
            password: SecretString::from(password),
        }),
        _ => Err(ConfigError::MissingCredentials),
    }
}

fn parse_proxy(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        name: "PROXY".to_string(),
        message: e.to_string(),
    })?;
    if !SUPPORTED_PROXY_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::UnsupportedProxyScheme {
            scheme: url.scheme().to_string(),
        });
    }
    Ok(url)
}

fn parse_opt_default<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_var_opt(name) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            name: name.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
