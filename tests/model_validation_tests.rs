use campus_portal::{
    Principal,
    models::{CredentialRecord, ErrorBody, LoginRequest, Role},
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

// --- Role ---

#[test]
fn test_role_wire_format_is_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Administrator).unwrap(), r#""administrator""#);
    assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), r#""teacher""#);
    assert_eq!(serde_json::from_str::<Role>(r#""student""#).unwrap(), Role::Student);
    assert!(serde_json::from_str::<Role>(r#""janitor""#).is_err());
}

#[test]
fn test_role_parses_stored_labels() {
    let cases = [
        ("Administrativo", Role::Administrator),
        ("ADMIN", Role::Administrator),
        ("Docente", Role::Teacher),
        ("teacher", Role::Teacher),
        (" Estudiante ", Role::Student),
        ("Student", Role::Student),
    ];
    for (label, expected) in cases {
        assert_eq!(label.parse::<Role>().unwrap(), expected, "label: {label}");
    }
    assert!("".parse::<Role>().is_err());
    assert!("superuser".parse::<Role>().is_err());
}

#[test]
fn test_role_display_round_trips_through_from_str() {
    for role in Role::ALL {
        assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
    }
}

#[test]
fn test_stored_labels_agree_with_parser() {
    // The directory query filters on these labels; each must parse back to its own role.
    for role in Role::ALL {
        assert_eq!(role.stored_labels()[0], role.as_str());
        for label in role.stored_labels() {
            assert_eq!(label.parse::<Role>().unwrap(), role, "label: {label}");
            assert_eq!(label.to_uppercase().parse::<Role>().unwrap(), role);
        }
    }
}

// --- Login Payload ---

#[test]
fn test_login_request_missing_fields_deserialize_as_none() {
    let request: LoginRequest = serde_json::from_str("{}").unwrap();
    assert!(request.identifier.is_none());
    assert!(request.secret.is_none());
}

#[test]
fn test_login_request_accepts_legacy_names() {
    let request: LoginRequest =
        serde_json::from_str(r#"{"CorreoInstitucional":"a@u.edu","Password":"right"}"#).unwrap();
    assert_eq!(request.identifier.as_deref(), Some("a@u.edu"));
    assert_eq!(request.secret.as_deref(), Some("right"));
}

#[test]
fn test_secrets_never_reach_debug_output() {
    let request = LoginRequest {
        identifier: Some("a@u.edu".to_string()),
        secret: Some("hunter2".to_string()),
    };
    assert!(!format!("{request:?}").contains("hunter2"));

    let record = CredentialRecord {
        id: Uuid::new_v4(),
        institutional_email: "a@u.edu".to_string(),
        secret_hash: "$argon2id$v=19$secret-material".to_string(),
        role: Role::Student,
        name: "A".to_string(),
        personal_email: None,
        phone: None,
    };
    assert!(!format!("{record:?}").contains("secret-material"));
}

#[test]
fn test_profile_has_no_secret_field() {
    let record = CredentialRecord {
        id: Uuid::new_v4(),
        institutional_email: "t@u.edu".to_string(),
        secret_hash: "$argon2id$v=19$secret-material".to_string(),
        role: Role::Teacher,
        name: "T".to_string(),
        personal_email: Some("t@home.example".to_string()),
        phone: None,
    };
    let json = serde_json::to_value(record.profile()).unwrap();
    assert_eq!(json["role"], "teacher");
    assert_eq!(json["personal_email"], "t@home.example");
    assert!(json.get("secret_hash").is_none());
}

// --- Envelopes ---

#[test]
fn test_error_body_shape() {
    let body = ErrorBody {
        success: false,
        error: "invalid credentials".to_string(),
    };
    assert_eq!(
        serde_json::to_value(body).unwrap(),
        serde_json::json!({ "success": false, "error": "invalid credentials" })
    );
}

#[test]
fn test_principal_serializes_role_and_times() {
    let principal = Principal {
        id: Uuid::nil(),
        role: Role::Administrator,
        issued_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        expires_at: Utc.timestamp_opt(1_700_003_600, 0).unwrap(),
    };
    let json = serde_json::to_value(&principal).unwrap();
    assert_eq!(json["role"], "administrator");
    assert_eq!(json["expires_at"], "2023-11-14T23:13:20Z");
}
