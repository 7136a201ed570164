use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are **unauthenticated**. The login route is the only way to obtain a
/// session token, so it must never sit behind the token validator.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(handlers::health))
        // POST /auth/login
        // Credential verification and token issuance.
        .route("/auth/login", post(handlers::login))
}
