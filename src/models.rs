use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Roles ---

/// Role
///
/// The closed set of roles recognised by the authorization layer. Serialized in lowercase
/// on the wire and inside token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Administrator,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Every lowercase label a stored row may carry for this role, canonical first.
    /// Rows written by the previous system still use the Spanish labels.
    pub fn stored_labels(&self) -> &'static [&'static str] {
        match self {
            Role::Administrator => &["administrator", "admin", "administrativo"],
            Role::Teacher => &["teacher", "docente"],
            Role::Student => &["student", "estudiante"],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored role label is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role label '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts the canonical labels plus the labels still present in legacy rows
    /// (`Administrativo`, `Docente`, `Estudiante`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.stored_labels().contains(&label.as_str()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

// --- Credential Records ---

/// CredentialRecord
///
/// A user's persisted identity, secret and role, as returned by the persistence layer.
/// Read-only to the authentication core. `secret_hash` is a salted Argon2id PHC string.
#[derive(Clone)]
pub struct CredentialRecord {
    pub id: Uuid,
    // The login identifier.
    pub institutional_email: String,
    pub secret_hash: String,
    pub role: Role,
    pub name: String,
    pub personal_email: Option<String>,
    pub phone: Option<String>,
}

impl CredentialRecord {
    /// The non-secret view of this record, safe to return to clients.
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.name.clone(),
            institutional_email: self.institutional_email.clone(),
            personal_email: self.personal_email.clone(),
            phone: self.phone.clone(),
            role: self.role,
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("institutional_email", &self.institutional_email)
            .field("secret_hash", &"<redacted>")
            .field("role", &self.role)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Profile
///
/// Output schema for user data (login response, directory routes). Never carries the secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub institutional_email: String,
    pub personal_email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

// --- Request Payloads ---

/// LoginRequest
///
/// Input payload for `POST /auth/login`. Both fields are optional at the type level so a
/// missing field is reported as a 400 by the orchestrator rather than a deserialization
/// rejection. The legacy front-end field names are accepted as aliases.
#[derive(Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default, alias = "CorreoInstitucional")]
    #[schema(example = "a@u.edu")]
    pub identifier: Option<String>,
    #[serde(default, alias = "Password")]
    pub secret: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// DirectoryFilter
///
/// Query parameters for `GET /admin/users`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct DirectoryFilter {
    /// Restrict the listing to a single role.
    pub role: Option<Role>,
}

// --- Response Payloads ---

/// LoginResponse
///
/// Output of a successful login. `expiresAt` lets the client schedule a re-login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

/// ErrorBody
///
/// The uniform failure envelope used by every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}
