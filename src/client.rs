use crate::{
    environment::{ClientContext, ClientEvent, Subscription, Visibility},
    policy::{Action, presence_check},
};

/// ClientGuard
///
/// Watches a mounted subtree for its credential disappearing after the page has
/// loaded: storage cleared in another tab, or a token that expired while the tab
/// was hidden. Only presence matters here; which roles may see the subtree is the
/// [`RoleGate`](crate::gate::RoleGate)'s business.
pub struct ClientGuard;

impl ClientGuard {
    /// mount
    ///
    /// Checks immediately, then keeps checking whenever the tab becomes visible or
    /// the credential's storage entry changes, until the returned guard is
    /// unmounted.
    pub fn mount(ctx: ClientContext) -> MountedClientGuard {
        check(&ctx);

        let watched = ctx.clone();
        let on_visible = ctx.events.subscribe(move |event| {
            if *event == ClientEvent::VisibilityChanged(Visibility::Visible) {
                check(&watched);
            }
        });

        let watched = ctx.clone();
        let on_storage = ctx.events.subscribe(move |event| {
            if watched.touches_credential(event) {
                check(&watched);
            }
        });

        tracing::debug!(path = %ctx.navigator.current_path(), "client guard mounted");

        MountedClientGuard {
            ctx,
            _subscriptions: [on_visible, on_storage],
        }
    }
}

/// MountedClientGuard
///
/// Lives exactly as long as the guarded subtree. Dropping it deregisters both
/// listeners before `drop` returns.
pub struct MountedClientGuard {
    ctx: ClientContext,
    _subscriptions: [Subscription; 2],
}

impl MountedClientGuard {
    /// Re-runs the check after the subtree's route changed.
    pub fn route_changed(&self) {
        check(&self.ctx);
    }

    pub fn unmount(self) {
        tracing::debug!("client guard unmounted");
    }
}

fn check(ctx: &ClientContext) {
    let current = ctx.navigator.current_path();
    let credential = ctx.credential();

    if let Action::RedirectTo(target) = presence_check(credential.as_deref(), &current) {
        tracing::info!(path = %current, %target, "credential gone, leaving guarded page");
        ctx.navigator.replace(&target);
    }
}
