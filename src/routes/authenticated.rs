use crate::{
    AppState,
    auth::{RoleGate, role_gate},
    handlers,
    models::Role,
};
use axum::{Router, middleware, routing::get};

/// Authenticated Router Module
///
/// Routes for any caller holding a valid token. Individual routes may still narrow the
/// audience with a composed gate.
pub fn authenticated_routes() -> Router<AppState> {
    let staff = RoleGate::only(Role::Teacher) | RoleGate::only(Role::Administrator);

    Router::<AppState>::new()
        // GET /directory/students
        // Student listing for staff (teachers and administrators).
        .route(
            "/directory/students",
            get(handlers::list_students).route_layer(middleware::from_fn_with_state(staff, role_gate)),
        )
        // GET /me
        // The caller's decoded token claims.
        .route("/me", get(handlers::get_me))
}
