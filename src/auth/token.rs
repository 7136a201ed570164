use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Principal;
use crate::models::{CredentialRecord, Role};

const BEARER: &str = "Bearer";

/// Failures of the token issuer and the token validator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("no authorization header")]
    MissingCredential,
    #[error("authorization header is not of the form 'Bearer <token>'")]
    MalformedCredential,
    #[error("token signature is invalid or the token has expired")]
    InvalidOrExpiredCredential,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Claims
///
/// The signed payload of a session token. A point-in-time snapshot of the credential
/// record: a role change only shows up in tokens minted after the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    pub role: Role,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the epoch. Valid while `now <= exp`.
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// TokenIssuer
///
/// Mints HS256 session tokens. The secret is injected by the caller and never read from
/// ambient state.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    /// Tokens expire `ttl_secs` after issuance.
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Issues a token for `record`, valid from now.
    pub fn issue(&self, record: &CredentialRecord) -> Result<IssuedToken, TokenError> {
        self.issue_at(record, Utc::now())
    }

    /// issue_at
    ///
    /// Issues a token as if the clock read `now`. The claims carry the record's id and role
    /// at this instant; `exp` is `now + ttl`. Fails only if the expiry is out of range or
    /// signing itself fails.
    pub fn issue_at(&self, record: &CredentialRecord, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let exp = iat
            .checked_add(self.ttl_secs)
            .ok_or_else(|| TokenError::Signing("expiry overflows".to_string()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;

        let claims = Claims {
            sub: record.id,
            role: record.role,
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }
}

/// TokenValidator
///
/// Verifies signature and expiry. Pure function of the token, the injected secret and the
/// clock: no I/O, safe to run inline on every request.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    /// Accepts only HS256 tokens signed with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against an explicit clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Validates against the current time.
    pub fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// validate_at
    ///
    /// Checks signature, algorithm and expiry as of `now`. Every failure collapses into
    /// [`TokenError::InvalidOrExpiredCredential`]; the underlying reason is logged at debug.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "token rejected");
                TokenError::InvalidOrExpiredCredential
            })?
            .claims;

        if now.timestamp() > claims.exp {
            tracing::debug!("token rejected: expired");
            return Err(TokenError::InvalidOrExpiredCredential);
        }

        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::InvalidOrExpiredCredential)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::InvalidOrExpiredCredential)?;

        Ok(Principal {
            id: claims.sub,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}

/// parse_authorization
///
/// Extracts the token from an `Authorization: Bearer <token>` header. The scheme is
/// matched case-insensitively; anything other than exactly two parts is malformed.
pub fn parse_authorization(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(TokenError::MissingCredential)?
        .to_str()
        .map_err(|_| TokenError::MalformedCredential)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(BEARER) => Ok(token),
        _ => Err(TokenError::MalformedCredential),
    }
}
