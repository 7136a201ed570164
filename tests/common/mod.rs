#![allow(dead_code)]

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use campus_portal::{
    AppConfig, AppState, InMemoryRepository, MockNotifier, NotificationDispatcher, RepositoryState,
    TokenIssuer, create_router,
    models::{CredentialRecord, Profile, Role},
    notifier::NotifierState,
    repository::{CredentialRepository, RepositoryError},
    security::hash_secret,
};
use chrono::{DateTime, Utc};
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "right";

// Hashing is the slow part of every fixture; do it once per test binary.
static SECRET_HASH: LazyLock<String> = LazyLock::new(|| hash_secret(SECRET).expect("hash fixture secret"));

// --- Fixtures ---

pub fn record(email: &str, role: Role, name: &str) -> CredentialRecord {
    CredentialRecord {
        id: Uuid::new_v4(),
        institutional_email: email.to_string(),
        secret_hash: SECRET_HASH.clone(),
        role,
        name: name.to_string(),
        personal_email: None,
        phone: None,
    }
}

pub struct Directory {
    pub admin: CredentialRecord,
    pub teacher: CredentialRecord,
    pub student: CredentialRecord,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            admin: record("admin@u.edu", Role::Administrator, "Ada Admin"),
            teacher: record("teacher@u.edu", Role::Teacher, "Tomas Teacher"),
            student: record("a@u.edu", Role::Student, "Sofia Student"),
        }
    }

    pub fn repository(&self) -> RepositoryState {
        Arc::new(InMemoryRepository::with_records([
            self.admin.clone(),
            self.teacher.clone(),
            self.student.clone(),
        ]))
    }
}

/// Repository whose every call fails as if the database were down.
pub struct BrokenRepo;

#[async_trait]
impl CredentialRepository for BrokenRepo {
    async fn find_credential_by_identifier(
        &self,
        _identifier: &str,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
    async fn find_profile(&self, _id: Uuid) -> Result<Option<Profile>, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
    async fn list_profiles(&self, _role: Option<Role>) -> Result<Vec<Profile>, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
}

// --- App Construction ---

pub fn test_config() -> AppConfig {
    AppConfig::default()
}

/// Builds the full router over `repo`. Must be called inside a tokio runtime because the
/// notification worker is spawned here.
pub fn build_app(repo: RepositoryState, notifier: MockNotifier) -> (Router, AppState) {
    let config = test_config();
    let notifier: NotifierState = Arc::new(notifier);
    let notifications =
        NotificationDispatcher::spawn(notifier, config.notify_timeout, config.notify_queue_capacity);
    let state = AppState::new(config, repo, notifications);
    (create_router(state.clone()), state)
}

/// A token for `record` signed with the test secret, issued at `now`.
pub fn token_at(record: &CredentialRecord, now: DateTime<Utc>) -> String {
    let config = test_config();
    TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl_secs)
        .issue_at(record, now)
        .expect("issue test token")
        .token
}

pub fn token_for(record: &CredentialRecord) -> String {
    token_at(record, Utc::now())
}

// --- Request Helpers ---

pub fn login_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn bearer_get(uri: &str, token: &str) -> Request<Body> {
    get(uri, Some(&format!("Bearer {token}")))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.bytes).expect("response body is JSON")
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    TestResponse { status, bytes }
}
