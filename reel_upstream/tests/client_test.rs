use std::path::PathBuf;
use std::time::Duration;

use reel_shared::config::{Credentials, FallbackCredentials};
use reel_upstream::{Upstream, UpstreamClient, UpstreamError};
use secrecy::SecretString;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_token_credentials() -> Credentials {
    Credentials::SessionFileOrFallback {
        session_path: PathBuf::from("unused.json"),
        fallback: Box::new(FallbackCredentials::SessionToken {
            token: SecretString::from("preset-token".to_string()),
            csrf_token: Some("preset-csrf".to_string()),
        }),
    }
}

fn username_password_credentials() -> Credentials {
    Credentials::SessionFileOrFallback {
        session_path: PathBuf::from("unused.json"),
        fallback: Box::new(FallbackCredentials::UsernamePassword {
            username: "alice".to_string(),
            password: SecretString::from("hunter2".to_string()),
        }),
    }
}

async fn authed_client(server: &MockServer, session_path: PathBuf) -> UpstreamClient {
    let client = UpstreamClient::new(
        session_token_credentials(),
        session_path,
        None,
        Duration::from_secs(5),
        2,
    )
    .unwrap()
    .with_base_url(server.uri());

    client.authenticate().await.unwrap();
    client
}

#[tokio::test]
async fn authenticate_with_session_token_persists_blob_for_next_run() {
    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");

    let client = UpstreamClient::new(
        session_token_credentials(),
        session_path.clone(),
        None,
        Duration::from_secs(5),
        0,
    )
    .unwrap();

    client.authenticate().await.unwrap();
    assert!(session_path.exists(), "session token mode should persist a blob");
}

#[tokio::test]
async fn authenticate_reuses_persisted_session_before_checking_fallback() {
    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    reel_upstream::session::save_session(
        &session_path,
        &reel_upstream::session::SessionBlob {
            token: "persisted-token".to_string(),
            csrf_token: None,
        },
    )
    .unwrap();

    // Credentials point at username/password, which would fail against no
    // server at all; since a session file already exists, it must win.
    let client = UpstreamClient::new(
        username_password_credentials(),
        session_path,
        None,
        Duration::from_secs(5),
        0,
    )
    .unwrap();

    let handle = client.authenticate().await.unwrap();
    assert!(handle.csrf_token.is_none());
}

#[tokio::test]
async fn authenticate_with_username_password_calls_login_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_token": "fresh-token",
            "csrf_token": "fresh-csrf"
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");

    let client = UpstreamClient::new(
        username_password_credentials(),
        session_path.clone(),
        None,
        Duration::from_secs(5),
        0,
    )
    .unwrap()
    .with_base_url(server.uri());

    let handle = client.authenticate().await.unwrap();
    assert_eq!(handle.csrf_token.as_deref(), Some("fresh-csrf"));
    assert!(session_path.exists());
}

#[tokio::test]
async fn recent_media_returns_parsed_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/user/42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "video_id": 1001,
                "shortcode": "abc123",
                "url": "https://example.test/v/1001",
                "caption": "hello",
                "duration_seconds": 30,
                "published_at": "2026-07-20T10:00:00Z",
                "audio_url": "https://example.test/a/1001.aac",
                "view_count": 100,
                "like_count": 10,
                "comment_count": 1,
                "followers_count": 5000
            }]
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let client = authed_client(&server, dir.path().join("session.json")).await;

    let media = client.recent_media(42, 50).await.unwrap();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].shortcode, "abc123");
    assert_eq!(media[0].view_count, 100);
}

#[tokio::test]
async fn recent_media_not_found_maps_to_not_found_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/user/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("account is private"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let client = authed_client(&server, dir.path().join("session.json")).await;

    let err = client.recent_media(99, 50).await.unwrap_err();
    assert!(matches!(err, UpstreamError::NotFound(_)));
}

#[tokio::test]
async fn media_metrics_rate_limited_surfaces_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/7/info/"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "42")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let client = authed_client(&server, dir.path().join("session.json")).await;

    let err = client.media_metrics(7).await.unwrap_err();
    match err {
        UpstreamError::RateLimit { retry_after } => assert_eq!(retry_after, Duration::from_secs(42)),
        other => panic!("expected RateLimit, got {other:?}"),
    }
}

#[tokio::test]
async fn resolve_username_returns_user_pk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/creator/usernameinfo/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user_pk": 555 })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let client = authed_client(&server, dir.path().join("session.json")).await;

    let user_pk = client.resolve_username("creator").await.unwrap();
    assert_eq!(user_pk, 555);
}

#[tokio::test(start_paused = true)]
async fn transient_server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/7/info/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/7/info/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "view_count": 1,
            "like_count": 1,
            "comment_count": 1,
            "save_count": null,
            "followers_count": 1
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let client = authed_client(&server, dir.path().join("session.json")).await;

    let result = client.media_metrics(7).await;
    assert!(result.is_ok(), "retry budget should absorb one transient 5xx: {result:?}");
}
