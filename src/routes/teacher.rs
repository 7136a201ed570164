use crate::{
    AppState,
    auth::{RoleGate, role_gate},
    handlers,
    models::Role,
};
use axum::{Router, middleware, routing::get};

/// Teacher Router Module
///
/// Routes for teachers only. Nested under `/teacher`.
pub fn teacher_routes() -> Router<AppState> {
    Router::new()
        // GET /teacher/students
        .route("/students", get(handlers::list_students))
        .route_layer(middleware::from_fn_with_state(RoleGate::only(Role::Teacher), role_gate))
}
