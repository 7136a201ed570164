mod common;

use std::{sync::Arc, time::Duration};

use axum::http::StatusCode;
use campus_portal::{
    InMemoryRepository, MockNotifier,
    models::{LoginResponse, Role},
    notifier::{DispatchSnapshot, LoginNotice, NotificationDispatcher},
};
use chrono::Utc;
use common::{BrokenRepo, Directory, SECRET, build_app, login_request, record, send};

fn body(identifier: &str, secret: &str) -> String {
    serde_json::json!({ "identifier": identifier, "secret": secret }).to_string()
}

async fn wait_for(dispatcher: &NotificationDispatcher, done: impl Fn(DispatchSnapshot) -> bool) -> DispatchSnapshot {
    for _ in 0..200 {
        let stats = dispatcher.stats();
        if done(stats) {
            return stats;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    dispatcher.stats()
}

// --- Successful Login ---

#[tokio::test]
async fn test_login_success_returns_token_and_profile() {
    let dir = Directory::new();
    let (app, state) = build_app(dir.repository(), MockNotifier::new());

    let res = send(&app, login_request(&body("a@u.edu", SECRET))).await;
    assert_eq!(res.status, StatusCode::OK);

    let login: LoginResponse = serde_json::from_slice(&res.bytes).unwrap();
    assert!(login.success);
    assert!(!login.token.is_empty());
    assert!(login.expires_at > Utc::now());
    assert_eq!(login.profile, dir.student.profile());

    // The issued token decodes to the stored identity and role.
    let principal = state.validator.validate(&login.token).unwrap();
    assert_eq!(principal.id, dir.student.id);
    assert_eq!(principal.role, Role::Student);
    assert_eq!(principal.expires_at, login.expires_at);
}

#[tokio::test]
async fn test_login_response_is_camel_case_and_has_no_secret() {
    let dir = Directory::new();
    let (app, _) = build_app(dir.repository(), MockNotifier::new());

    let res = send(&app, login_request(&body("teacher@u.edu", SECRET))).await;
    assert_eq!(res.status, StatusCode::OK);

    let json = res.json();
    assert!(json.get("expiresAt").is_some());
    assert_eq!(json["profile"]["role"], "teacher");
    let raw = String::from_utf8(res.bytes).unwrap();
    assert!(!raw.contains("argon2"));
    assert!(!raw.contains(SECRET));
}

#[tokio::test]
async fn test_login_identifier_is_case_insensitive() {
    let dir = Directory::new();
    let (app, _) = build_app(dir.repository(), MockNotifier::new());

    let res = send(&app, login_request(&body("  A@U.EDU ", SECRET))).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_accepts_legacy_field_names() {
    let dir = Directory::new();
    let (app, _) = build_app(dir.repository(), MockNotifier::new());

    let legacy = serde_json::json!({ "CorreoInstitucional": "admin@u.edu", "Password": SECRET });
    let res = send(&app, login_request(&legacy.to_string())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["profile"]["role"], "administrator");
}

// --- Rejected Credentials ---

#[tokio::test]
async fn test_wrong_secret_and_unknown_identifier_are_indistinguishable() {
    let dir = Directory::new();
    let (app, _) = build_app(dir.repository(), MockNotifier::new());

    let wrong_secret = send(&app, login_request(&body("a@u.edu", "wrong"))).await;
    let unknown = send(&app, login_request(&body("nobody@u.edu", "x"))).await;

    assert_eq!(wrong_secret.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_secret.bytes, unknown.bytes);
    assert_eq!(wrong_secret.json()["success"], false);
    assert_eq!(wrong_secret.json()["error"], "invalid credentials");
}

#[tokio::test]
async fn test_failed_login_sends_no_notice() {
    let dir = Directory::new();
    let notifier = MockNotifier::new();
    let (app, state) = build_app(dir.repository(), notifier.clone());

    let res = send(&app, login_request(&body("a@u.edu", "wrong"))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(notifier.sent().await.is_empty());
    assert_eq!(state.login.notifications().stats(), DispatchSnapshot::default());
}

// --- Malformed Requests ---

#[tokio::test]
async fn test_missing_or_blank_fields_are_bad_requests() {
    let dir = Directory::new();
    let (app, _) = build_app(dir.repository(), MockNotifier::new());

    for payload in [
        r#"{}"#.to_string(),
        r#"{"identifier":"a@u.edu"}"#.to_string(),
        r#"{"secret":"right"}"#.to_string(),
        body("", SECRET),
        body("   ", SECRET),
        body("a@u.edu", ""),
    ] {
        let res = send(&app, login_request(&payload)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "payload: {payload}");
        assert_eq!(res.json()["success"], false);
    }
}

#[tokio::test]
async fn test_invalid_json_is_a_bad_request() {
    let dir = Directory::new();
    let (app, _) = build_app(dir.repository(), MockNotifier::new());

    let res = send(&app, login_request("{not json")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["success"], false);
}

// --- Store Faults ---

#[tokio::test]
async fn test_store_outage_is_a_generic_server_error() {
    let (app, _) = build_app(Arc::new(BrokenRepo), MockNotifier::new());

    let res = send(&app, login_request(&body("a@u.edu", SECRET))).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);

    let json = res.json();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "internal server error");
    let raw = String::from_utf8(res.bytes).unwrap();
    assert!(!raw.contains("pool"));
}

#[tokio::test]
async fn test_unreadable_stored_hash_is_rejected_as_bad_credentials() {
    let mut broken = record("legacy@u.edu", Role::Student, "Legacy Row");
    broken.secret_hash = "plain-text-password".to_string();
    let repo = Arc::new(InMemoryRepository::with_records([broken]));
    let (app, _) = build_app(repo, MockNotifier::new());

    let res = send(&app, login_request(&body("legacy@u.edu", "plain-text-password"))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// --- Login Notices ---

#[tokio::test]
async fn test_successful_login_enqueues_notice() {
    let dir = Directory::new();
    let notifier = MockNotifier::new();
    let (app, state) = build_app(dir.repository(), notifier.clone());

    let res = send(&app, login_request(&body("a@u.edu", SECRET))).await;
    assert_eq!(res.status, StatusCode::OK);

    let stats = wait_for(state.login.notifications(), |s| s.delivered == 1).await;
    assert_eq!(stats.delivered, 1);
    assert_eq!(
        notifier.sent().await,
        vec![LoginNotice {
            identifier: "a@u.edu".to_string(),
            display_name: "Sofia Student".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_failing_notifier_does_not_affect_login() {
    let dir = Directory::new();
    let (app, state) = build_app(dir.repository(), MockNotifier::new_failing());

    let res = send(&app, login_request(&body("a@u.edu", SECRET))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["success"], true);

    let stats = wait_for(state.login.notifications(), |s| s.failed == 1).await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.delivered, 0);
}

#[tokio::test]
async fn test_stalled_notifier_does_not_delay_login() {
    let dir = Directory::new();
    let (app, _) = build_app(dir.repository(), MockNotifier::new_stalled(Duration::from_secs(30)));

    let res = tokio::time::timeout(
        Duration::from_secs(10),
        send(&app, login_request(&body("a@u.edu", SECRET))),
    )
    .await
    .expect("login must not wait on the notifier");
    assert_eq!(res.status, StatusCode::OK);
}
