//! The Upstream Client: authenticated, proxy-aware, rate-limited access to
//! the upstream platform's four operations.
//!
//! A `reqwest::Client` built once, wrapped in a struct that holds
//! `secrecy::SecretString` credentials so they never show up in `Debug`
//! output. Every call is funneled through a single-concurrency gate plus a
//! jittered inter-call delay, since the upstream platform dislikes
//! parallel authenticated requests from one identity.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use rand::Rng;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use reel_shared::config::{Credentials, FallbackCredentials};

use crate::error::UpstreamError;
use crate::models::{MediaSummary, MetricSnapshot, SessionHandle};
use crate::session::{SessionBlob, load_session, save_session};

const DEFAULT_BASE_URL: &str = "https://upstream.example.platform/api/v1";
const RETRY_DELAYS: [Duration; 3] =
    [Duration::from_millis(500), Duration::from_secs(1), Duration::from_secs(2)];

type CallLimiter = DefaultDirectRateLimiter;

/// The capability set the rest of the worker depends on, as a trait so the
/// Scheduler can be tested against a fake.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn authenticate(&self) -> Result<SessionHandle, UpstreamError>;
    async fn resolve_username(&self, username: &str) -> Result<i64, UpstreamError>;
    async fn recent_media(&self, user_pk: i64, limit: i64) -> Result<Vec<MediaSummary>, UpstreamError>;
    async fn media_metrics(&self, video_id: i64) -> Result<MetricSnapshot, UpstreamError>;
}

pub struct UpstreamClient {
    http: Client,
    base_url: String,
    session_path: PathBuf,
    credentials: Credentials,
    retry_budget: u32,
    gate: Mutex<()>,
    limiter: CallLimiter,
    token: RwLock<Option<SecretString>>,
    csrf_token: RwLock<Option<String>>,
}

impl UpstreamClient {
    /// Builds a client from its configuration: an optional proxy, the
    /// session blob path, the credential mode, a per-call timeout, and a
    /// local retry budget for transient failures.
    pub fn new(
        credentials: Credentials,
        session_path: PathBuf,
        proxy: Option<url::Url>,
        request_timeout: Duration,
        retry_budget: u32,
    ) -> Result<Self, UpstreamError> {
        let mut builder = Client::builder().cookie_store(true).timeout(request_timeout);
        if let Some(proxy_url) = proxy {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())?;
            builder = builder.proxy(proxy);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            session_path,
            credentials,
            retry_budget,
            gate: Mutex::new(()),
            limiter: RateLimiter::direct(Quota::per_second(nonzero!(1u32))),
            token: RwLock::new(None),
            csrf_token: RwLock::new(None),
        })
    }

    /// Points this client at a different base URL. Used by tests to target
    /// a local `wiremock` server instead of the real platform.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Serializes one call through the single-concurrency gate, waits on
    /// the rate limiter, runs it, then sleeps a jittered 0.5-2.0s before
    /// releasing the gate for the next caller.
    async fn call<T, Fut>(&self, fut: Fut) -> Result<T, UpstreamError>
    where
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let _permit = self.gate.lock().await;
        self.limiter.until_ready().await;

        let result = fut.await;

        let jitter_ms = rand::thread_rng().gen_range(500..=2000);
        tokio::time::sleep(Duration::from_millis(jitter_ms)).await;

        result
    }

    /// Retries `f` up to `retry_budget` times on retriable errors, using the
    /// same 0.5s/1s/2s backoff ladder the Store's retry helper uses.
    async fn with_retry<T, F, Fut>(&self, mut f: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt = 0usize;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retriable() && attempt < self.retry_budget as usize => {
                    warn!(attempt, error = %e, "retrying upstream call");
                    let delay = RETRY_DELAYS[attempt.min(RETRY_DELAYS.len() - 1)];
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn require_token(&self) -> Result<SecretString, UpstreamError> {
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| UpstreamError::Auth("authenticate() was never called".to_string()))
    }

    async fn classify_error(response: reqwest::Response) -> UpstreamError {
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                UpstreamError::Auth(response.text().await.unwrap_or_default())
            }
            StatusCode::NOT_FOUND => {
                UpstreamError::NotFound(response.text().await.unwrap_or_default())
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(Duration::from_secs(30));
                UpstreamError::RateLimit { retry_after }
            }
            other => UpstreamError::ServerError(format!(
                "unexpected status {other}: {}",
                response.text().await.unwrap_or_default()
            )),
        }
    }

    async fn do_login(&self, username: &str, password: &SecretString) -> Result<SessionHandle, UpstreamError> {
        #[derive(serde::Serialize)]
        struct LoginRequest<'a> {
            username: &'a str,
            password: &'a str,
        }
        #[derive(Deserialize)]
        struct LoginResponse {
            session_token: String,
            csrf_token: Option<String>,
        }

        let url = format!("{}/accounts/login/", self.base_url);
        let body = LoginRequest { username, password: password.expose_secret() };

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::classify_error(response).await);
        }
        let decoded: LoginResponse = response.json().await?;

        *self.token.write().await = Some(SecretString::from(decoded.session_token.clone()));
        *self.csrf_token.write().await = decoded.csrf_token.clone();

        save_session(
            &self.session_path,
            &SessionBlob { token: decoded.session_token, csrf_token: decoded.csrf_token.clone() },
        )?;

        Ok(SessionHandle { csrf_token: decoded.csrf_token })
    }

    async fn fetch_recent_media_once(
        &self,
        user_pk: i64,
        limit: i64,
    ) -> Result<Vec<MediaSummary>, UpstreamError> {
        #[derive(Deserialize)]
        struct MediaFeedResponse {
            items: Vec<MediaSummary>,
        }

        let token = self.require_token().await?;
        let url = format!("{}/feed/user/{}/", self.base_url, user_pk);

        let response = self
            .http
            .get(&url)
            .query(&[("count", limit.to_string())])
            .header("X-Session-Token", token.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_error(response).await);
        }
        let decoded: MediaFeedResponse = response.json().await?;
        Ok(decoded.items)
    }

    async fn fetch_media_metrics_once(&self, video_id: i64) -> Result<MetricSnapshot, UpstreamError> {
        let token = self.require_token().await?;
        let url = format!("{}/media/{}/info/", self.base_url, video_id);

        let response = self
            .http
            .get(&url)
            .header("X-Session-Token", token.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_error(response).await);
        }
        Ok(response.json::<MetricSnapshot>().await?)
    }

    async fn resolve_username_once(&self, username: &str) -> Result<i64, UpstreamError> {
        #[derive(Deserialize)]
        struct UsernameInfoResponse {
            user_pk: i64,
        }

        let token = self.require_token().await?;
        let url = format!("{}/users/{}/usernameinfo/", self.base_url, username);

        let response = self
            .http
            .get(&url)
            .header("X-Session-Token", token.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_error(response).await);
        }
        let decoded: UsernameInfoResponse = response.json().await?;
        Ok(decoded.user_pk)
    }
}

#[async_trait]
impl Upstream for UpstreamClient {
    /// Mode precedence: a persisted session blob wins if present, then a
    /// configured session token, then username+password.
    #[instrument(skip(self))]
    async fn authenticate(&self) -> Result<SessionHandle, UpstreamError> {
        if let Some(blob) = load_session(&self.session_path)? {
            debug!("reusing persisted session");
            *self.token.write().await = Some(SecretString::from(blob.token));
            *self.csrf_token.write().await = blob.csrf_token.clone();
            return Ok(SessionHandle { csrf_token: blob.csrf_token });
        }

        let Credentials::SessionFileOrFallback { fallback, .. } = &self.credentials;
        match fallback.as_ref() {
            FallbackCredentials::SessionToken { token, csrf_token } => {
                *self.token.write().await = Some(token.clone());
                *self.csrf_token.write().await = csrf_token.clone();
                save_session(
                    &self.session_path,
                    &SessionBlob {
                        token: token.expose_secret().to_string(),
                        csrf_token: csrf_token.clone(),
                    },
                )?;
                Ok(SessionHandle { csrf_token: csrf_token.clone() })
            }
            FallbackCredentials::UsernamePassword { username, password } => {
                self.call(self.with_retry(|| self.do_login(username, password))).await
            }
        }
    }

    #[instrument(skip(self))]
    async fn resolve_username(&self, username: &str) -> Result<i64, UpstreamError> {
        self.call(self.with_retry(|| self.resolve_username_once(username))).await
    }

    #[instrument(skip(self))]
    async fn recent_media(&self, user_pk: i64, limit: i64) -> Result<Vec<MediaSummary>, UpstreamError> {
        self.call(self.with_retry(|| self.fetch_recent_media_once(user_pk, limit))).await
    }

    #[instrument(skip(self))]
    async fn media_metrics(&self, video_id: i64) -> Result<MetricSnapshot, UpstreamError> {
        self.call(self.with_retry(|| self.fetch_media_metrics_once(video_id))).await
    }
}
