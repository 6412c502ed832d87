use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use portal_guard::{
    Action, AppConfig, ClientGuard, Gated, Role, RoleGate, evaluate,
    environment::{
        ClientContext, ClientEvent, ClientEvents, MemoryHistory, MemoryStorage, Visibility,
    },
    gate::{AreaGate, require_roles},
    policy::PROTECTED_AREAS,
};
use serde_json::json;
use tower::ServiceExt;

// --- Helper Functions ---

fn token_with_role(role: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let body = URL_SAFE_NO_PAD.encode(json!({ "role": role }).to_string());
    format!("{header}.{body}.sig")
}

fn context(
    storage: &Arc<MemoryStorage>,
    history: &Arc<MemoryHistory>,
    events: &ClientEvents,
) -> ClientContext {
    ClientContext::from_config(
        &AppConfig::default(),
        storage.clone(),
        history.clone(),
        events.clone(),
    )
}

// --- Pure checks ---

#[test]
fn test_allowed_role_renders_subtree() {
    let gate = RoleGate::new([Role::Admin, Role::OfficeAdmin]);
    let token = token_with_role("office");

    assert_eq!(gate.allow("dashboard", Some(&token)), Gated::Allowed("dashboard"));
}

#[test]
fn test_wrong_area_role_goes_home_and_others_to_login() {
    let gate = RoleGate::new([Role::Admin]);

    assert_eq!(
        gate.allow((), Some(&token_with_role("showroom"))),
        Gated::Redirecting("/showroom-account".to_string())
    );
    assert_eq!(
        gate.allow((), Some(&token_with_role("superuser"))),
        Gated::Redirecting("/login".to_string())
    );
    assert_eq!(gate.allow((), None), Gated::Redirecting("/login".to_string()));
    assert_eq!(
        gate.allow((), Some("!!broken!!")),
        Gated::Redirecting("/login".to_string())
    );
}

#[test]
fn test_empty_allow_list_admits_nobody() {
    let gate = RoleGate::new(Vec::<Role>::new());
    for role in Role::ALL {
        assert_eq!(
            gate.evaluate(Some(&token_with_role(role.as_str()))),
            Action::RedirectTo(role.home().to_string())
        );
    }
}

#[test]
fn test_gate_agrees_with_edge_for_every_area() {
    let tokens: Vec<Option<String>> = Role::ALL
        .iter()
        .map(|r| Some(token_with_role(r.as_str())))
        .chain([None, Some(token_with_role("superuser")), Some("x".to_string())])
        .collect();

    for area in PROTECTED_AREAS {
        let gate = RoleGate::new([area.required_role()]);
        for token in &tokens {
            assert_eq!(
                gate.evaluate(token.as_deref()),
                evaluate(area.prefix(), token.as_deref()),
                "{} with {token:?}",
                area.prefix()
            );
        }
    }
}

// --- Mounted gate ---

#[test]
fn test_mounted_gate_follows_credential_changes() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", &token_with_role("admin"));
    let history = Arc::new(MemoryHistory::new("/admin"));
    let events = ClientEvents::new();

    let gate = RoleGate::new([Role::Admin]).mount(context(&storage, &history, &events));
    assert_eq!(gate.render("reports"), Gated::Allowed("reports"));
    assert!(history.replacements().is_empty());

    // Another tab switched accounts.
    storage.set("token", &token_with_role("showroom"));
    events.emit(&ClientEvent::StorageChanged {
        key: Some("token".to_string()),
    });

    assert_eq!(
        gate.render("reports"),
        Gated::Redirecting("/showroom-account".to_string())
    );
    assert_eq!(history.replacements(), vec!["/showroom-account".to_string()]);

    gate.unmount();
    assert_eq!(events.listener_count(), 0);
}

#[test]
fn test_mounted_gate_rechecks_when_tab_becomes_visible() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", &token_with_role("admin"));
    let history = Arc::new(MemoryHistory::new("/admin"));
    let events = ClientEvents::new();

    let _guard = ClientGuard::mount(context(&storage, &history, &events));
    let _gate = RoleGate::new([Role::Admin]).mount(context(&storage, &history, &events));

    // Swapped while hidden, without a storage notification reaching this tab.
    storage.set("token", &token_with_role("showroom"));
    events.emit(&ClientEvent::VisibilityChanged(Visibility::Hidden));
    assert!(history.replacements().is_empty());

    events.emit(&ClientEvent::VisibilityChanged(Visibility::Visible));
    assert_eq!(history.replacements(), vec!["/showroom-account".to_string()]);
}

#[test]
fn test_mounting_without_access_redirects_immediately() {
    let storage = Arc::new(MemoryStorage::new());
    let history = Arc::new(MemoryHistory::new("/office-admin"));
    let events = ClientEvents::new();

    let gate = RoleGate::new([Role::OfficeAdmin]).mount(context(&storage, &history, &events));
    assert_eq!(gate.render(()), Gated::Redirecting("/login".to_string()));
    assert_eq!(history.replacements(), vec!["/login".to_string()]);
}

#[test]
fn test_gate_and_client_guard_issue_a_single_redirect_together() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", &token_with_role("showroom"));
    let history = Arc::new(MemoryHistory::new("/showroom-account"));
    let events = ClientEvents::new();

    let _guard = ClientGuard::mount(context(&storage, &history, &events));
    let _gate = RoleGate::new([Role::Showroom]).mount(context(&storage, &history, &events));

    storage.remove("token");
    events.emit(&ClientEvent::StorageChanged {
        key: Some("token".to_string()),
    });

    assert_eq!(history.replacements(), vec!["/login".to_string()]);
}

// --- Server-side gate ---

fn gated_router() -> Router {
    Router::new()
        .route("/office-admin", get(|| async { "office" }))
        .route_layer(middleware::from_fn_with_state(
            AreaGate::new([Role::OfficeAdmin], "token"),
            require_roles,
        ))
}

fn request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/office-admin");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_server_gate_passes_allowed_role() {
    let token = token_with_role("officeadmin");
    let response = gated_router().oneshot(request(Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_server_gate_redirects_like_the_edge() {
    let token = token_with_role("admin");
    let response = gated_router().oneshot(request(Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/admin");

    let response = gated_router().oneshot(request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}
