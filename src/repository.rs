use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CredentialRecord, Profile, Role};

/// RepositoryError
///
/// Persistence faults. None of these are about credential correctness; the login
/// orchestrator maps every one of them to a 500.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("lookup timed out")]
    Timeout,
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// CredentialRepository Trait
///
/// The lookup contract the authentication core depends on. The core never issues raw
/// queries; it only asks for a credential record by identifier.
///
/// **Send + Sync + async_trait** are required so `Arc<dyn CredentialRepository>` can be
/// shared across Axum's task boundaries.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Case-insensitive lookup by institutional e-mail. `Ok(None)` means no such account.
    async fn find_credential_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, RepositoryError>;

    // --- Directory (role-scoped routes) ---
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, RepositoryError>;
    async fn list_profiles(&self, role: Option<Role>) -> Result<Vec<Profile>, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn CredentialRepository>;

/// Raw `users` row. The role column is free text in older databases, so it is parsed
/// into [`Role`] after loading.
#[derive(Debug, FromRow)]
struct CredentialRow {
    id: Uuid,
    institutional_email: String,
    secret_hash: String,
    role: String,
    name: String,
    personal_email: Option<String>,
    phone: Option<String>,
}

impl TryFrom<CredentialRow> for CredentialRecord {
    type Error = RepositoryError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| RepositoryError::InvalidRecord(format!("user {}: {e}", row.id)))?;
        Ok(CredentialRecord {
            id: row.id,
            institutional_email: row.institutional_email,
            secret_hash: row.secret_hash,
            role,
            name: row.name,
            personal_email: row.personal_email,
            phone: row.phone,
        })
    }
}

/// PostgresRepository
///
/// The concrete implementation of `CredentialRepository`, backed by the `users` table.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_USERS: &str = r#"
    SELECT id, institutional_email, secret_hash, role, name, personal_email, phone
    FROM users
"#;

#[async_trait]
impl CredentialRepository for PostgresRepository {
    async fn find_credential_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        let query = format!("{SELECT_USERS} WHERE LOWER(institutional_email) = LOWER($1)");
        let row = sqlx::query_as::<_, CredentialRow>(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CredentialRecord::try_from).transpose()
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, RepositoryError> {
        let query = format!("{SELECT_USERS} WHERE id = $1");
        let row = sqlx::query_as::<_, CredentialRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row
            .map(CredentialRecord::try_from)
            .transpose()?
            .map(|record| record.profile()))
    }

    /// list_profiles
    ///
    /// The role filter runs in SQL against every label `Role::from_str` accepts, so legacy
    /// rows (`Docente`, ...) are listed the same way the login path reads them. The
    /// listing is unpaginated: a single campus directory is a few thousand rows.
    async fn list_profiles(&self, role: Option<Role>) -> Result<Vec<Profile>, RepositoryError> {
        let rows = match role {
            Some(role) => {
                let labels: Vec<String> = role.stored_labels().iter().map(|l| l.to_string()).collect();
                let query = format!("{SELECT_USERS} WHERE LOWER(TRIM(role)) = ANY($1) ORDER BY name ASC");
                sqlx::query_as::<_, CredentialRow>(&query)
                    .bind(labels)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!("{SELECT_USERS} ORDER BY name ASC");
                sqlx::query_as::<_, CredentialRow>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut profiles = Vec::with_capacity(rows.len());
        for row in rows {
            match CredentialRecord::try_from(row) {
                Ok(record) if role.is_none_or(|r| r == record.role) => profiles.push(record.profile()),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping unreadable user row: {e}"),
            }
        }
        Ok(profiles)
    }
}

/// InMemoryRepository
///
/// A map-backed implementation used by tests and local experiments. Keys are the
/// lowercased institutional e-mail.
#[derive(Default)]
pub struct InMemoryRepository {
    records: HashMap<String, CredentialRecord>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        let mut repo = Self::new();
        for record in records {
            repo.insert(record);
        }
        repo
    }

    pub fn insert(&mut self, record: CredentialRecord) {
        self.records
            .insert(record.institutional_email.to_lowercase(), record);
    }
}

#[async_trait]
impl CredentialRepository for InMemoryRepository {
    async fn find_credential_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        Ok(self.records.get(&identifier.to_lowercase()).cloned())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .records
            .values()
            .find(|record| record.id == id)
            .map(CredentialRecord::profile))
    }

    async fn list_profiles(&self, role: Option<Role>) -> Result<Vec<Profile>, RepositoryError> {
        let mut profiles: Vec<Profile> = self
            .records
            .values()
            .filter(|record| role.is_none_or(|r| r == record.role))
            .map(CredentialRecord::profile)
            .collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }
}
