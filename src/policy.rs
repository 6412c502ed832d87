//! The routing policy shared by every guard.
//!
//! The edge guard and the role gate both answer through [`resolve`], so the
//! network-side and in-application decisions cannot drift apart.

use crate::role::{DecodedRole, Role, decode_role};

/// Where anonymous and unroutable callers are sent.
pub const LOGIN_PATH: &str = "/login";

/// Area
///
/// One entry of the ProtectedAreaTable. Prefixes are disjoint: no path can
/// start with two of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Admin,
    OfficeAdmin,
    ShowroomAccount,
}

/// The ProtectedAreaTable.
pub const PROTECTED_AREAS: [Area; 3] = [Area::Admin, Area::OfficeAdmin, Area::ShowroomAccount];

impl Area {
    pub fn prefix(&self) -> &'static str {
        match self {
            Area::Admin => "/admin",
            Area::OfficeAdmin => "/office-admin",
            Area::ShowroomAccount => "/showroom-account",
        }
    }

    pub fn required_role(&self) -> Role {
        match self {
            Area::Admin => Role::Admin,
            Area::OfficeAdmin => Role::OfficeAdmin,
            Area::ShowroomAccount => Role::Showroom,
        }
    }

    /// The area whose home a role lands on.
    pub fn home_of(role: Role) -> Area {
        match role {
            Role::Admin => Area::Admin,
            Role::OfficeAdmin => Area::OfficeAdmin,
            Role::Showroom => Area::ShowroomAccount,
        }
    }

    /// area_for
    ///
    /// Looks a request path up in the ProtectedAreaTable. Matching is an exact,
    /// case-sensitive prefix test.
    pub fn area_for(path: &str) -> Option<Area> {
        PROTECTED_AREAS
            .into_iter()
            .find(|area| path.starts_with(area.prefix()))
    }
}

/// Action
///
/// The outcome of every guard decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Continue,
    RedirectTo(String),
}

impl Action {
    pub fn login() -> Self {
        Action::RedirectTo(LOGIN_PATH.to_string())
    }
}

/// GuardState
///
/// The state a credential puts the caller in. Derived fresh from the credential
/// on every evaluation; guards hold no state of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No credential at all.
    Anonymous,
    Authenticated(Role),
    /// A credential is present, but its role is unrecognized or unreadable.
    AuthenticatedUnknownRole,
}

impl GuardState {
    /// from_credential
    ///
    /// An empty credential counts as no credential.
    pub fn from_credential(credential: Option<&str>) -> Self {
        let Some(token) = credential.filter(|t| !t.is_empty()) else {
            return GuardState::Anonymous;
        };

        match decode_role(Some(token)) {
            Some(DecodedRole::Canonical(role)) => GuardState::Authenticated(role),
            Some(DecodedRole::Unrecognized(_)) | None => GuardState::AuthenticatedUnknownRole,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            GuardState::Authenticated(role) => Some(*role),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GuardState::Anonymous => "anonymous",
            GuardState::Authenticated(_) => "authenticated",
            GuardState::AuthenticatedUnknownRole => "unknown_role",
        }
    }
}

/// resolve
///
/// Decides whether a caller in `state` may enter a guarded area admitting the
/// roles accepted by `allowed`.
///
/// * a permitted role continues;
/// * any other canonical role is sent to its own home;
/// * anonymous and unknown-role callers are sent to login.
pub fn resolve(state: GuardState, allowed: impl Fn(Role) -> bool) -> Action {
    match state {
        GuardState::Authenticated(role) if allowed(role) => Action::Continue,
        GuardState::Authenticated(role) => Action::RedirectTo(role.home().to_string()),
        GuardState::Anonymous | GuardState::AuthenticatedUnknownRole => Action::login(),
    }
}

/// presence_check
///
/// The client-side check: only the presence of a credential matters. A caller
/// already on the login page is never redirected again.
pub fn presence_check(credential: Option<&str>, current_path: &str) -> Action {
    let present = credential.is_some_and(|t| !t.is_empty());
    if present || current_path == LOGIN_PATH {
        Action::Continue
    } else {
        Action::login()
    }
}
