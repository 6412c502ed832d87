use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::CookieJar;

use crate::{
    AppConfig,
    edge,
    models::{AreaLanding, EvaluateQuery, EvaluationResponse},
    policy::{Area, GuardState},
};

// --- Handlers ---

/// evaluate_navigation
///
/// [Public Route] Returns the edge decision for `path`, using the credential cookie
/// sent with this request. Never redirects itself.
#[utoipa::path(
    get,
    path = "/guard/evaluate",
    params(EvaluateQuery),
    responses((status = 200, description = "Edge decision", body = EvaluationResponse))
)]
pub async fn evaluate_navigation(
    State(config): State<AppConfig>,
    jar: CookieJar,
    Query(query): Query<EvaluateQuery>,
) -> Json<EvaluationResponse> {
    let token = jar.get(&config.token_cookie).map(|c| c.value());
    let action = edge::evaluate(&query.path, token);

    Json(EvaluationResponse::new(
        action,
        GuardState::from_credential(token),
    ))
}

/// login_page
///
/// [Public Route] The destination of every anonymous redirect.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login landing", body = AreaLanding))
)]
pub async fn login_page() -> Json<AreaLanding> {
    Json(AreaLanding {
        area: "login".to_string(),
        role: None,
    })
}

/// admin_area
///
/// [Admin Area] Reached only with an `admin` credential.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin area", body = AreaLanding),
        (status = 307, description = "Redirected to login or the caller's home")
    )
)]
pub async fn admin_area(State(config): State<AppConfig>, jar: CookieJar) -> Json<AreaLanding> {
    landing(Area::Admin, &config, &jar)
}

/// office_admin_area
///
/// [Office Admin Area] Reached only with an `officeAdmin` credential.
#[utoipa::path(
    get,
    path = "/office-admin",
    responses(
        (status = 200, description = "Office admin area", body = AreaLanding),
        (status = 307, description = "Redirected to login or the caller's home")
    )
)]
pub async fn office_admin_area(
    State(config): State<AppConfig>,
    jar: CookieJar,
) -> Json<AreaLanding> {
    landing(Area::OfficeAdmin, &config, &jar)
}

/// showroom_area
///
/// [Showroom Area] Reached only with a `showroom` credential.
#[utoipa::path(
    get,
    path = "/showroom-account",
    responses(
        (status = 200, description = "Showroom account area", body = AreaLanding),
        (status = 307, description = "Redirected to login or the caller's home")
    )
)]
pub async fn showroom_area(State(config): State<AppConfig>, jar: CookieJar) -> Json<AreaLanding> {
    landing(Area::ShowroomAccount, &config, &jar)
}

fn landing(area: Area, config: &AppConfig, jar: &CookieJar) -> Json<AreaLanding> {
    let token = jar.get(&config.token_cookie).map(|c| c.value());
    let role = GuardState::from_credential(token).role();

    Json(AreaLanding {
        area: area.prefix().trim_start_matches('/').to_string(),
        role: role.map(|r| r.as_str().to_string()),
    })
}
