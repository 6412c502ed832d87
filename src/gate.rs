use std::collections::BTreeSet;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    environment::{ClientContext, ClientEvent, Subscription, Visibility},
    policy::{Action, GuardState, resolve},
    role::Role,
};

/// Gated
///
/// The two terminal rendering states of a gated subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    Allowed(T),
    /// Navigation has been (or must be) issued; the subtree is not rendered.
    Redirecting(String),
}

/// RoleGate
///
/// A component-local check wrapping a subtree with the roles allowed to see it.
/// It runs independently of the edge guard but answers through the same policy,
/// so both layers always redirect a given caller to the same place.
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: BTreeSet<Role>,
}

impl RoleGate {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// evaluate
    ///
    /// An allowed role continues. Another canonical role goes to its own home.
    /// A missing credential, or one whose role cannot be routed, goes to login.
    pub fn evaluate(&self, credential: Option<&str>) -> Action {
        let state = GuardState::from_credential(credential);
        resolve(state, |role| self.allowed.contains(&role))
    }

    pub fn allow<T>(&self, subtree: T, credential: Option<&str>) -> Gated<T> {
        match self.evaluate(credential) {
            Action::Continue => Gated::Allowed(subtree),
            Action::RedirectTo(target) => Gated::Redirecting(target),
        }
    }

    /// mount
    ///
    /// Evaluates against the client-visible credential now, and again whenever
    /// the Client Guard would recheck (the tab becoming visible, or a change to
    /// the credential's storage entry), navigating away whenever the caller is
    /// no longer allowed.
    pub fn mount(self, ctx: ClientContext) -> MountedRoleGate {
        enforce(&self, &ctx);

        let gate = self.clone();
        let watched = ctx.clone();
        let subscription = ctx.events.subscribe(move |event| {
            let visible = *event == ClientEvent::VisibilityChanged(Visibility::Visible);
            if visible || watched.touches_credential(event) {
                enforce(&gate, &watched);
            }
        });

        MountedRoleGate {
            gate: self,
            ctx,
            _subscription: subscription,
        }
    }
}

/// MountedRoleGate
///
/// A gate attached to a live subtree.
pub struct MountedRoleGate {
    gate: RoleGate,
    ctx: ClientContext,
    _subscription: Subscription,
}

impl MountedRoleGate {
    /// Renders against the credential as it is right now.
    pub fn render<T>(&self, subtree: T) -> Gated<T> {
        self.gate.allow(subtree, self.ctx.credential().as_deref())
    }

    pub fn unmount(self) {}
}

fn enforce(gate: &RoleGate, ctx: &ClientContext) {
    let Action::RedirectTo(target) = gate.evaluate(ctx.credential().as_deref()) else {
        return;
    };

    // Another guard may already have navigated there.
    let current = ctx.navigator.current_path();
    if current != target {
        tracing::info!(path = %current, %target, "role gate: redirect");
        ctx.navigator.replace(&target);
    }
}

/// AreaGate
///
/// Server-side state for [`require_roles`]: the gate plus the cookie to read.
#[derive(Debug, Clone)]
pub struct AreaGate {
    pub gate: RoleGate,
    pub token_cookie: String,
}

impl AreaGate {
    pub fn new(allowed: impl IntoIterator<Item = Role>, token_cookie: impl Into<String>) -> Self {
        Self {
            gate: RoleGate::new(allowed),
            token_cookie: token_cookie.into(),
        }
    }
}

/// require_roles
///
/// Route-layer middleware applying a [`RoleGate`] to an area's sub-router.
/// Sits behind the edge guard; a caller the edge let through is never turned
/// away here, and anything else gets the same `307` the edge would give.
pub async fn require_roles(
    State(area): State<AreaGate>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let token = jar.get(&area.token_cookie).map(|c| c.value());

    match area.gate.evaluate(token) {
        Action::Continue => next.run(request).await,
        Action::RedirectTo(target) => {
            tracing::warn!(
                path = %request.uri().path(),
                %target,
                "role gate rejected a request the edge guard let through"
            );
            Redirect::temporary(&target).into_response()
        }
    }
}
