use std::ops::BitOr;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use super::Principal;
use crate::{error::ApiError, models::Role};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// The gate ran without a principal: the token validator was not wired in front of it.
    #[error("role gate invoked without an authenticated principal")]
    MissingPrincipal,
    #[error("role not permitted")]
    Forbidden,
}

/// RoleGate
///
/// The set of roles allowed through. Gates compose with [`RoleGate::or`] (or `|`) into
/// "any of" gates; composition is set union, so grouping and order never change the
/// decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    allowed: u8,
}

const fn bit(role: Role) -> u8 {
    match role {
        Role::Administrator => 1 << 0,
        Role::Teacher => 1 << 1,
        Role::Student => 1 << 2,
    }
}

impl RoleGate {
    /// A gate admitting exactly one role.
    pub const fn only(role: Role) -> Self {
        Self { allowed: bit(role) }
    }

    /// any_of
    ///
    /// A gate admitting every listed role. An empty list yields a gate that admits nobody.
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        roles
            .into_iter()
            .fold(Self { allowed: 0 }, |gate, role| gate.or(Self::only(role)))
    }

    /// Union of two gates. Same as `self | other`.
    pub const fn or(self, other: RoleGate) -> Self {
        Self {
            allowed: self.allowed | other.allowed,
        }
    }

    /// Whether `role` is in the admitted set.
    pub const fn permits(&self, role: Role) -> bool {
        self.allowed & bit(role) != 0
    }

    /// authorize
    ///
    /// The gate decision. `None` means the token validator never ran for this request,
    /// which is a wiring fault rather than a client error.
    pub fn authorize(&self, principal: Option<&Principal>) -> Result<(), GateError> {
        let principal = principal.ok_or(GateError::MissingPrincipal)?;
        if self.permits(principal.role) {
            Ok(())
        } else {
            Err(GateError::Forbidden)
        }
    }
}

impl BitOr for RoleGate {
    type Output = RoleGate;

    fn bitor(self, rhs: RoleGate) -> RoleGate {
        self.or(rhs)
    }
}

/// role_gate
///
/// Middleware form of [`RoleGate::authorize`]. Attach it with
/// `middleware::from_fn_with_state(gate, role_gate)` *inside* the `require_auth` layer.
/// The request is passed through unmodified on success.
pub async fn role_gate(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match gate.authorize(request.extensions().get::<Principal>()) {
        Ok(()) => Ok(next.run(request).await),
        Err(GateError::MissingPrincipal) => {
            tracing::error!(uri = %request.uri(), "role gate reached without authentication; check router wiring");
            Err(GateError::MissingPrincipal.into())
        }
        Err(GateError::Forbidden) => {
            if let Some(principal) = request.extensions().get::<Principal>() {
                tracing::info!(user_id = %principal.id, role = %principal.role, uri = %request.uri(), "role gate denied request");
            }
            Err(GateError::Forbidden.into())
        }
    }
}
