use crate::{
    AppState,
    auth::{RoleGate, role_gate},
    handlers,
    models::Role,
};
use axum::{Router, middleware, routing::get};

/// Student Router Module
///
/// Routes for students only. Nested under `/student`.
pub fn student_routes() -> Router<AppState> {
    Router::new()
        // GET /student/profile
        .route("/profile", get(handlers::get_student_profile))
        .route_layer(middleware::from_fn_with_state(RoleGate::only(Role::Student), role_gate))
}
