use std::time::Duration;

use thiserror::Error;

use crate::{
    models::CredentialRecord,
    repository::{RepositoryError, RepositoryState},
    security::{self, SecretCheck},
};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no account for identifier")]
    NotFound,
    #[error("secret does not match")]
    InvalidSecret,
    #[error(transparent)]
    Store(#[from] RepositoryError),
    #[error("verification task failed: {0}")]
    Task(String),
}

/// CredentialVerifier
///
/// Checks an identifier/secret pair against the stored record. An unknown identifier
/// still pays for a full Argon2 verification, so response time does not reveal whether
/// an account exists.
#[derive(Clone)]
pub struct CredentialVerifier {
    repo: RepositoryState,
    lookup_timeout: Duration,
}

impl CredentialVerifier {
    /// `lookup_timeout` bounds the repository call only; hashing is not counted against it.
    pub fn new(repo: RepositoryState, lookup_timeout: Duration) -> Self {
        Self { repo, lookup_timeout }
    }

    /// verify
    ///
    /// Looks up `identifier` and checks `secret` against the stored hash. Returns the
    /// record on a match. `NotFound` and `InvalidSecret` are both credential failures and
    /// must reach the client as the same response; `Store` and `Task` are faults.
    pub async fn verify(&self, identifier: &str, secret: &str) -> Result<CredentialRecord, CredentialError> {
        let lookup = self.repo.find_credential_by_identifier(identifier);
        let found = tokio::time::timeout(self.lookup_timeout, lookup)
            .await
            .map_err(|_| RepositoryError::Timeout)??;

        let secret = secret.to_owned();
        let Some(record) = found else {
            run_blocking(move || security::verify_against_dummy(&secret)).await?;
            return Err(CredentialError::NotFound);
        };

        let stored = record.secret_hash.clone();
        match run_blocking(move || security::verify_secret(&stored, &secret)).await? {
            SecretCheck::Match => Ok(record),
            SecretCheck::Mismatch => Err(CredentialError::InvalidSecret),
            SecretCheck::UnreadableHash => {
                tracing::error!(user_id = %record.id, "stored secret is not an Argon2 PHC string; rehash required");
                Err(CredentialError::InvalidSecret)
            }
        }
    }
}

// Argon2 is CPU-bound; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, CredentialError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CredentialError::Task(e.to_string()))
}
