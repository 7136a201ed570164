/// Router Module Index
///
/// Routing is split by access level. Every router except `public` is mounted behind the
/// `require_auth` layer in `create_router`; the role-restricted ones additionally carry
/// their own `role_gate` layer, applied inside authentication.

/// Routes reachable without a token (health, login).
pub mod public;

/// Routes for any authenticated role.
pub mod authenticated;

/// Routes restricted to the Administrator role.
pub mod admin;

/// Routes restricted to the Teacher role.
pub mod teacher;

/// Routes restricted to the Student role.
pub mod student;
