//! Session lifecycle against a mock API server.

mod common;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{Harness, mount_login, mount_logout};
use tokenward_core::error::AuthError;
use tokenward_core::{Error, LoginCredentials, PersistencePolicy, Registration, StorageBackend};
use tokenward_http::SessionStatus;

fn alice() -> LoginCredentials {
    LoginCredentials::new("alice", "secret123")
}

#[tokio::test]
async fn login_durable_persists_to_durable_only() {
    let h = Harness::start().await;
    mount_login(&h.server, "A1", "R1").await;
    h.seed_ephemeral("stale-access", "stale-refresh");

    let snapshot = h
        .session
        .login(&alice(), PersistencePolicy::Durable)
        .await
        .unwrap();

    assert_eq!(snapshot.status, SessionStatus::Authenticated);
    assert_eq!(snapshot.persistence, Some(PersistencePolicy::Durable));
    assert_eq!(snapshot.user.unwrap().username(), Some("alice"));

    assert_eq!(h.durable.get("accessToken").unwrap().as_deref(), Some("A1"));
    assert_eq!(h.durable.get("refreshToken").unwrap().as_deref(), Some("R1"));
    assert!(h.durable.get("user").unwrap().is_some());
    assert!(h.ephemeral.is_empty());
}

#[tokio::test]
async fn login_ephemeral_clears_previous_durable_copy() {
    let h = Harness::start().await;
    mount_login(&h.server, "A1", "R1").await;
    h.seed_durable("old-access", "old-refresh");

    h.session
        .login(&alice(), PersistencePolicy::Ephemeral)
        .await
        .unwrap();

    assert_eq!(h.session.persistence(), Some(PersistencePolicy::Ephemeral));
    assert_eq!(h.ephemeral.get("accessToken").unwrap().as_deref(), Some("A1"));
    assert_eq!(h.ephemeral.get("refreshToken").unwrap().as_deref(), Some("R1"));
    assert!(h.durable.is_empty());
}

#[tokio::test]
async fn login_failure_leaves_session_anonymous() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials"
        })))
        .mount(&h.server)
        .await;
    mount_logout(&h.server, 200).await;
    h.seed_durable("A0", "R0");
    h.session.restore();

    let err = h
        .session
        .login(&LoginCredentials::new("alice", "wrong"), PersistencePolicy::Durable)
        .await
        .unwrap_err();

    match err {
        Error::Auth(AuthError::AuthenticationFailed { message }) => {
            assert!(message.contains("No active account"));
        }
        other => panic!("expected authentication failure, got {other:?}"),
    }
    assert_eq!(h.session.status(), SessionStatus::Anonymous);
    assert!(h.session.access_token().is_none());
    assert!(h.both_backends_empty());
}

#[tokio::test]
async fn login_with_malformed_response_fails() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&h.server)
        .await;

    let err = h
        .session
        .login(&alice(), PersistencePolicy::Durable)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Auth(AuthError::AuthenticationFailed { .. })
    ));
    assert!(!h.session.is_authenticated());
    assert!(h.both_backends_empty());
}

#[tokio::test]
async fn logout_clears_state_even_when_server_fails() {
    let h = Harness::start().await;
    mount_login(&h.server, "A1", "R1").await;
    mount_logout(&h.server, 500).await;

    h.session
        .login(&alice(), PersistencePolicy::Durable)
        .await
        .unwrap();
    h.session.logout().await;

    assert_eq!(h.session.status(), SessionStatus::Anonymous);
    assert!(h.session.current_user().is_none());
    assert!(h.session.persistence().is_none());
    assert!(h.both_backends_empty());

    let requests = h.server.received_requests().await.unwrap();
    let logout = requests
        .iter()
        .find(|r| r.url.path() == "/auth/logout")
        .expect("logout was sent");
    assert_eq!(
        logout.headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer A1"
    );
}

#[tokio::test]
async fn logout_when_anonymous_still_notifies_server() {
    let h = Harness::start().await;
    mount_logout(&h.server, 401).await;

    h.session.logout().await;

    assert_eq!(h.session.status(), SessionStatus::Anonymous);
    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/auth/logout");
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn restore_with_empty_storage_stays_anonymous() {
    let h = Harness::start().await;

    assert_eq!(h.session.restore(), SessionStatus::Anonymous);
    assert!(!h.session.is_authenticated());
    assert!(h.session.access_token().is_none());
}

#[tokio::test]
async fn restore_trusts_stored_tokens_without_network() {
    let h = Harness::start().await;
    h.seed_durable("A1", "R1");
    h.durable
        .set("user", r#"{"id":1,"username":"alice"}"#)
        .unwrap();

    assert_eq!(h.session.restore(), SessionStatus::Authenticated);
    assert_eq!(h.session.access_token().unwrap().as_str(), "A1");
    assert_eq!(h.session.persistence(), Some(PersistencePolicy::Durable));
    assert_eq!(h.session.current_user().unwrap().username(), Some("alice"));

    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn restore_prefers_ephemeral_copy() {
    let h = Harness::start().await;
    h.seed_ephemeral("E1", "ER1");
    h.seed_durable("D1", "DR1");

    h.session.restore();

    assert_eq!(h.session.access_token().unwrap().as_str(), "E1");
    assert_eq!(h.session.persistence(), Some(PersistencePolicy::Ephemeral));
}

#[tokio::test]
async fn restore_ignores_corrupt_profile() {
    let h = Harness::start().await;
    h.seed_durable("A1", "R1");
    h.durable.set("user", "{not json").unwrap();

    assert_eq!(h.session.restore(), SessionStatus::Authenticated);
    assert!(h.session.current_user().is_none());
}

#[tokio::test]
async fn fetch_profile_unwraps_envelope_and_persists() {
    let h = Harness::start().await;
    mount_login(&h.server, "A1", "R1").await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": {"id": 1, "username": "alice", "email": "new@example.com", "bio": "hi"}
        })))
        .mount(&h.server)
        .await;

    h.session
        .login(&alice(), PersistencePolicy::Durable)
        .await
        .unwrap();
    let profile = h.session.fetch_profile().await.unwrap();

    assert_eq!(profile.email(), Some("new@example.com"));
    assert_eq!(h.session.current_user(), Some(profile));

    let stored = h.durable.get("user").unwrap().unwrap();
    assert!(stored.contains("new@example.com"));
    assert!(h.ephemeral.get("user").unwrap().is_none());
}

#[tokio::test]
async fn fetch_profile_failure_keeps_session() {
    let h = Harness::start().await;
    h.seed_durable("A1", "R1");
    h.session.restore();
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let err = h.session.fetch_profile().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(h.session.status(), SessionStatus::Authenticated);
    assert!(!h.durable.is_empty());
}

#[tokio::test]
async fn register_posts_all_fields() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "pw123456",
            "password_confirm": "pw123456",
            "captcha": "482913"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"message": "registered"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let registration = Registration::new("bob", "bob@example.com", "pw123456", "pw123456")
        .unwrap()
        .with_captcha("482913");
    let response = h.session.register(&registration).await.unwrap();

    assert_eq!(response["message"], "registered");
    assert_eq!(h.session.status(), SessionStatus::Anonymous);
    assert!(h.both_backends_empty());
}

#[tokio::test]
async fn register_rejection_surfaces_api_error() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "username already taken"
        })))
        .mount(&h.server)
        .await;

    let registration =
        Registration::new("bob", "bob@example.com", "pw123456", "pw123456").unwrap();
    let err = h.session.register(&registration).await.unwrap_err();

    match err {
        Error::Api(api) => {
            assert_eq!(api.status, 400);
            assert_eq!(api.error.as_deref(), Some("username already taken"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn request_captcha_posts_email() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/captcha"))
        .and(body_json(json!({"email": "bob@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sent": true})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.session.request_captcha("bob@example.com").await.unwrap();
}
