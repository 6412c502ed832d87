use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// The guard core: decoding, shared policy, and the three decision points.
pub mod role;
pub mod policy;
pub mod edge;
pub mod environment;
pub mod client;
pub mod gate;
pub mod menu;

// The HTTP host around the edge guard.
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
use routes::{areas, public};

// --- Public Re-exports ---

pub use client::{ClientGuard, MountedClientGuard};
pub use config::AppConfig;
pub use edge::evaluate;
pub use gate::{Gated, RoleGate};
pub use policy::{Action, Area, GuardState, LOGIN_PATH};
pub use role::{DecodedRole, Role, decode_role};

/// ApiDoc
///
/// OpenAPI document for the host, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::evaluate_navigation, handlers::login_page, handlers::admin_area,
        handlers::office_admin_area, handlers::showroom_area
    ),
    components(
        schemas(models::EvaluationResponse, models::ActionKind, models::AreaLanding)
    ),
    tags(
        (name = "portal-guard", description = "Role-gated navigation guard")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state for every request. The guards themselves keep no
/// state; only configuration lives here.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routes and wraps all of them in the edge guard, so every
/// navigation is decided before any handler runs.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(areas::area_routes(&state.config))
        // Outermost application layer: runs for every route, matched or not.
        .layer(middleware::from_fn_with_state(state.clone(), edge::edge_guard))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the request ID so every guard log line
/// for one navigation can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
