use crate::{
    AppState,
    auth::{RoleGate, role_gate},
    handlers,
    models::Role,
};
use axum::{Router, middleware, routing::get};

/// Admin Router Module
///
/// User directory management, restricted to administrators. Nested under `/admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users?role=teacher
        .route("/users", get(handlers::list_users))
        // GET /admin/users/{id}
        .route("/users/{id}", get(handlers::get_user))
        .route_layer(middleware::from_fn_with_state(
            RoleGate::only(Role::Administrator),
            role_gate,
        ))
}
