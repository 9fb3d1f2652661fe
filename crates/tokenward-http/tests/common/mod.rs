//! Shared fixtures for the mock API tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tokenward_core::{ApiUrl, CredentialStore, StorageBackend};
use tokenward_http::{ApiClient, AuthSession, ClientConfig};
use tokenward_store::MemoryBackend;

/// A session against a mock server, with handles on both backends.
pub struct Harness {
    pub server: MockServer,
    pub session: AuthSession,
    pub ephemeral: Arc<MemoryBackend>,
    pub durable: Arc<MemoryBackend>,
}

impl Harness {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let ephemeral = Arc::new(MemoryBackend::new());
        let durable = Arc::new(MemoryBackend::new());

        let api = ApiUrl::new(server.uri()).unwrap();
        let client = ApiClient::new(ClientConfig::new(api)).unwrap();
        let store = CredentialStore::new(ephemeral.clone(), durable.clone());
        let session = AuthSession::new(client, store);

        Self {
            server,
            session,
            ephemeral,
            durable,
        }
    }

    /// Seed the durable backend as a previous "remember me" login would have.
    pub fn seed_durable(&self, access: &str, refresh: &str) {
        self.durable.set("accessToken", access).unwrap();
        self.durable.set("refreshToken", refresh).unwrap();
    }

    pub fn seed_ephemeral(&self, access: &str, refresh: &str) {
        self.ephemeral.set("accessToken", access).unwrap();
        self.ephemeral.set("refreshToken", refresh).unwrap();
    }

    pub fn both_backends_empty(&self) -> bool {
        self.ephemeral.is_empty() && self.durable.is_empty()
    }

    pub async fn request_count(&self, url_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == url_path)
            .count()
    }
}

pub fn login_body(access: &str, refresh: &str) -> Value {
    json!({
        "access": access,
        "refresh": refresh,
        "user": {"id": 1, "username": "alice", "email": "alice@example.com"}
    })
}

pub async fn mount_login(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(access, refresh)))
        .mount(server)
        .await;
}

pub async fn mount_logout(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Refresh endpoint exchanging `refresh` for `new_access`, expected `times` times.
pub async fn mount_refresh(server: &MockServer, refresh: &str, new_access: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/token/refresh"))
        .and(body_json(json!({"refreshToken": refresh})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": new_access})))
        .expect(times)
        .mount(server)
        .await;
}

/// A protected resource answering 401 to `rejected` and 200 to `accepted`.
pub async fn mount_protected(server: &MockServer, url_path: &str, rejected: &str, accepted: &str) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .and(header("authorization", format!("Bearer {}", rejected).as_str()))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(url_path))
        .and(header("authorization", format!("Bearer {}", accepted).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": [1, 2, 3]})))
        .mount(server)
        .await;
}
