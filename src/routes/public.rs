use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints outside every protected prefix. The edge guard lets these through
/// regardless of the credential.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /login
        // Where anonymous and unroutable callers end up.
        .route("/login", get(handlers::login_page))
        // GET /guard/evaluate?path=...
        // The edge decision for a path, for edges running outside this process.
        .route("/guard/evaluate", get(handlers::evaluate_navigation))
}
