//! Route authorization decisions.
//!
//! [`evaluate`] is a pure function over the session and the loading flags of
//! its two inputs; callers re-run it whenever either input changes.

use care_types::{Role, RoleResponse, Session};

use crate::cache::{QueryState, QueryStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    /// Any signed-in user
    Authenticated,
    Admin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    CheckingSession,
    Authorized,
    RedirectToLogin,
    RedirectToHome,
}

impl GateDecision {
    /// Where a redirecting decision sends the user. The login page gets the
    /// requested path back as `from`.
    pub fn redirect_path(&self, requested: &str) -> Option<String> {
        match self {
            GateDecision::RedirectToLogin => Some(format!("/login?from={requested}")),
            GateDecision::RedirectToHome => Some("/".to_string()),
            GateDecision::CheckingSession | GateDecision::Authorized => None,
        }
    }
}

pub fn evaluate(
    access: RouteAccess,
    session: &Session,
    identity_loading: bool,
    role_loading: bool,
) -> GateDecision {
    // Holding here avoids redirecting before the role has arrived.
    if identity_loading || role_loading {
        return GateDecision::CheckingSession;
    }
    if session.identity.is_none() {
        return GateDecision::RedirectToLogin;
    }
    match access {
        RouteAccess::Authenticated => GateDecision::Authorized,
        RouteAccess::Admin if session.role == Some(Role::Admin) => GateDecision::Authorized,
        RouteAccess::Admin => GateDecision::RedirectToHome,
    }
}

/// Whether the role read for a known identity has yet to settle.
///
/// An `Idle` entry counts as pending: the read is enabled but has not started.
pub fn role_pending(has_identity: bool, role: &QueryState) -> bool {
    has_identity && matches!(role.status, QueryStatus::Idle | QueryStatus::Loading)
}

/// Role carried by a `/users/role/{email}` cache entry. Errors and malformed
/// payloads yield `None`, which the gate treats like a missing role.
pub fn role_from_state(role: &QueryState) -> Option<Role> {
    role.decode::<RoleResponse>().data.and_then(|r| r.role)
}
