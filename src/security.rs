use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

/// A well-formed Argon2id PHC string with the default cost parameters and an unguessable
/// digest. Verifying any secret against it costs the same as verifying against a real
/// stored hash, and never succeeds.
pub(crate) const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$mKNQygmTLn1FTmlcX/XuwA$irJu3a9RXqWF6o9yazEHhfgBULmG3h/HBEFwhk7qfNQ";

#[derive(Debug, Error)]
pub enum HashError {
    #[error("salt generation failed: {0}")]
    Salt(String),
    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Outcome of checking a secret against a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretCheck {
    Match,
    Mismatch,
    // The stored value is not a PHC string (e.g. a legacy plaintext column).
    UnreadableHash,
}

/// hash_secret
///
/// Produces the salted Argon2id PHC string stored in the credentials table.
pub fn hash_secret(secret: &str) -> Result<String, HashError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| HashError::Salt(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| HashError::Salt(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| HashError::Hash(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// verify_secret
///
/// Checks `secret` against a stored PHC string. The digest comparison inside
/// `PasswordVerifier` is constant-time. A stored value that does not parse still costs
/// one full verification (against [`DUMMY_HASH`]), so a legacy row answers in the same
/// time as any other account.
pub fn verify_secret(stored: &str, secret: &str) -> SecretCheck {
    let Ok(parsed) = PasswordHash::new(stored) else {
        verify_against_dummy(secret);
        return SecretCheck::UnreadableHash;
    };
    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => SecretCheck::Match,
        Err(_) => SecretCheck::Mismatch,
    }
}

/// Burns the same work as a real verification for identifiers that have no record.
pub(crate) fn verify_against_dummy(secret: &str) {
    if let Ok(dummy) = PasswordHash::new(DUMMY_HASH) {
        let _ = Argon2::default().verify_password(secret.as_bytes(), &dummy);
    }
}
