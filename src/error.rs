//! Client-facing error boundary.
//!
//! Component errors (`CredentialError`, `TokenError`, `GateError`, ...) carry detail for the
//! logs. They are converted into [`ApiError`] at the HTTP edge, and that conversion is where
//! detail is dropped: responses only ever contain a fixed message per variant.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    auth::{GateError, TokenError},
    models::ErrorBody,
};

pub const INVALID_CREDENTIALS: &str = "invalid credentials";
pub const LOGIN_FIELDS_REQUIRED: &str = "identifier and secret are required";

/// Errors returned to HTTP clients.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed login payload.
    #[error("bad request: {0}")]
    BadRequest(&'static str),

    /// Bad credentials or a missing, malformed, invalid or expired token.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Authenticated, but the role is not allowed on this route.
    #[error("forbidden")]
    Forbidden,

    /// Directory lookup for a record that does not exist.
    #[error("not found")]
    NotFound,

    /// Unexpected fault. The cause has already been logged where it happened.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            Self::BadRequest(msg) | Self::Unauthorized(msg) => *msg,
            Self::Forbidden => "insufficient permissions",
            Self::NotFound => "not found",
            Self::Internal => "internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingCredential => Self::Unauthorized("authentication token required"),
            TokenError::MalformedCredential => Self::Unauthorized("malformed authorization header"),
            TokenError::InvalidOrExpiredCredential => Self::Unauthorized("invalid or expired token"),
            TokenError::Signing(_) => Self::Internal,
        }
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Forbidden => Self::Forbidden,
            GateError::MissingPrincipal => Self::Internal,
        }
    }
}
