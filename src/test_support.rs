//! Fixtures shared by unit tests.

use crate::auth::middleware::AppState;
use crate::config::Config;
use crate::models::{StoredPost, StoredUser};
use crate::storage::{AccountStore, MemoryStore, PostStore, StoreError, UpdateOutcome};
use async_trait::async_trait;
use std::sync::Arc;

pub(crate) const TEST_SECRET: &str = "test-signing-key-test-signing-key-0123";

/// Config with cheap Argon2 cost and no external dependencies.
pub(crate) fn test_config() -> Config {
    Config {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_secs: 3600,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        max_body_bytes: 65_536,
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        cookie_secure: false,
    }
}

/// State over a fresh in-memory store.
pub(crate) fn test_state() -> AppState {
    AppState::new(test_config(), Arc::new(MemoryStore::new())).unwrap()
}

/// Backend detail that must never reach a client.
pub(crate) const BACKEND_FAILURE: &str = "connection refused by 10.0.0.5:6379";

/// Store whose every operation fails as an unreachable backend would.
pub(crate) struct FailingStore;

fn backend_down<T>() -> Result<T, StoreError> {
    Err(StoreError::Backend(BACKEND_FAILURE.to_string()))
}

#[async_trait]
impl AccountStore for FailingStore {
    async fn create_user(&self, _user: &StoredUser) -> Result<(), StoreError> {
        backend_down()
    }

    async fn get_user(&self, _id: &str) -> Result<Option<StoredUser>, StoreError> {
        backend_down()
    }

    async fn get_user_by_email(&self, _email: &str) -> Result<Option<StoredUser>, StoreError> {
        backend_down()
    }
}

#[async_trait]
impl PostStore for FailingStore {
    async fn create_post(&self, _post: &StoredPost) -> Result<(), StoreError> {
        backend_down()
    }

    async fn get_post(&self, _id: &str) -> Result<Option<StoredPost>, StoreError> {
        backend_down()
    }

    async fn list_posts(&self) -> Result<Vec<StoredPost>, StoreError> {
        backend_down()
    }

    async fn list_user_posts(&self, _owner_id: &str) -> Result<Vec<StoredPost>, StoreError> {
        backend_down()
    }

    async fn update_post(
        &self,
        _expected: &StoredPost,
        _post: &StoredPost,
    ) -> Result<UpdateOutcome, StoreError> {
        backend_down()
    }

    async fn delete_post(&self, _id: &str) -> Result<Option<StoredPost>, StoreError> {
        backend_down()
    }
}

/// State over a store that is always down.
pub(crate) fn failing_state() -> AppState {
    AppState::new(test_config(), Arc::new(FailingStore)).unwrap()
}

/// Response parts a router test cares about.
pub(crate) struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: serde_json::Value,
}

/// Drive `app` with one request. `token` travels in the session cookie.
pub(crate) async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> TestResponse {
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    TestResponse {
        status,
        headers,
        body,
    }
}
