use crate::{
    AppConfig, AppState,
    gate::{self, AreaGate},
    handlers,
    policy::Area,
};
use axum::{
    Router, middleware,
    routing::{MethodRouter, get},
};

/// Area Router Module
///
/// One sub-router per protected area, each answering both the bare prefix and
/// anything below it. Every sub-router is wrapped in a server-side role gate
/// admitting only the area's required role, as a second check behind the edge.
pub fn area_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .merge(area_router(Area::Admin, get(handlers::admin_area), config))
        .merge(area_router(
            Area::OfficeAdmin,
            get(handlers::office_admin_area),
            config,
        ))
        .merge(area_router(
            Area::ShowroomAccount,
            get(handlers::showroom_area),
            config,
        ))
}

fn area_router(
    area: Area,
    handler: MethodRouter<AppState>,
    config: &AppConfig,
) -> Router<AppState> {
    let prefix = area.prefix();
    let gate = AreaGate::new([area.required_role()], config.token_cookie.clone());

    Router::new()
        .route(prefix, handler.clone())
        .route(&format!("{prefix}/{{*rest}}"), handler)
        .route_layer(middleware::from_fn_with_state(gate, gate::require_roles))
}
