//! Authentication and role-based authorization.
//!
//! Protected request flow: `require_auth` (token validator) → `role_gate` (optional,
//! one or more) → handler. The login route bypasses both and goes through
//! [`LoginService`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::ApiError, models::Role};

pub mod credentials;
pub mod gate;
pub mod login;
pub mod token;

pub use credentials::{CredentialError, CredentialVerifier};
pub use gate::{GateError, RoleGate, role_gate};
pub use login::LoginService;
pub use token::{Claims, IssuedToken, TokenError, TokenIssuer, TokenValidator, parse_authorization};

/// Principal
///
/// The decoded identity of a request that passed the token validator. Lives in the
/// request's extensions for the duration of that request only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    #[ts(type = "string")]
    pub issued_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// Principal Extractor
///
/// Handlers take `Principal` as an argument to read the caller's identity. It does not
/// authenticate anything itself: it only reads what `require_auth` stored. Used on a route
/// that is not behind `require_auth`, it fails with a 500 instead of letting the request
/// through.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "principal requested on an unauthenticated route");
            GateError::MissingPrincipal.into()
        })
    }
}

/// require_auth
///
/// The token validator as middleware. Rejects with 401 when the bearer header is missing,
/// malformed, badly signed or expired; otherwise stores the [`Principal`] and forwards the
/// request.
pub async fn require_auth(
    State(validator): State<TokenValidator>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = match parse_authorization(request.headers()).and_then(|token| validator.validate(token)) {
        Ok(principal) => principal,
        Err(e) => {
            tracing::debug!(uri = %request.uri(), "authentication failed: {e}");
            return Err(e.into());
        }
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
