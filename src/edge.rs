use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    AppState,
    policy::{Action, Area, GuardState, resolve},
};

/// evaluate
///
/// The first-load decision, taken before any page renders.
///
/// Unprotected paths always continue, whatever the credential. A protected path
/// continues only when the cookie's role is exactly the area's required role;
/// otherwise the caller goes to their own role home, or to login when there is
/// no cookie or its role cannot be routed.
///
/// Pure in `(path, cookie_token)`: no session, no cache, no I/O.
pub fn evaluate(path: &str, cookie_token: Option<&str>) -> Action {
    match Area::area_for(path) {
        Some(area) => enter(area, GuardState::from_credential(cookie_token)),
        None => Action::Continue,
    }
}

/// Decision for a caller in `state` entering a protected area.
fn enter(area: Area, state: GuardState) -> Action {
    resolve(state, |role| role == area.required_role())
}

/// edge_guard
///
/// Middleware applied to every inbound navigation. Reads the credential cookie
/// named in `AppConfig::token_cookie`, decides exactly as [`evaluate`] does
/// (decoding the cookie once, and only on protected paths), and either passes the
/// request on or answers with a `307` to the bare target path. The original
/// query string is not carried over.
pub async fn edge_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let token = jar.get(&state.config.token_cookie).map(|c| c.value());

    let Some(area) = Area::area_for(&path) else {
        tracing::debug!(%path, "edge guard: unprotected, continue");
        return next.run(request).await;
    };

    let guard_state = GuardState::from_credential(token);
    match enter(area, guard_state) {
        Action::Continue => {
            tracing::debug!(%path, guard_state = guard_state.label(), "edge guard: continue");
            next.run(request).await
        }
        Action::RedirectTo(target) => {
            tracing::info!(
                %path,
                %target,
                guard_state = guard_state.label(),
                "edge guard: redirect"
            );
            Redirect::temporary(&target).into_response()
        }
    }
}
