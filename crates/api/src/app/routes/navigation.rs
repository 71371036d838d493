//! Navigation endpoints: the caller's menu and per-page guard decisions.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use medgate_auth::AuthState;
use medgate_navigation::{filter_routes, guard_page, resolve_landing_page, PageAccess};

use crate::app::{errors, services::AppServices};
use crate::authz;
use crate::context::{CallerContext, TenantContext};

#[derive(Debug, Deserialize)]
pub struct GuardQuery {
    pub path: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_navigation))
        .route("/guard", get(guard))
}

/// GET /navigation - the caller's filtered menu and landing page
pub async fn get_navigation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    let identity = match authz::resolve_caller(&services, &tenant, &caller).await {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };

    let landing = if identity.is_patient() {
        None
    } else {
        resolve_landing_page(services.routes(), identity.permission_slugs()).map(str::to_string)
    };
    let sections = filter_routes(services.routes(), &AuthState::SignedIn(identity));

    (StatusCode::OK, Json(serde_json::json!({
        "sections": sections,
        "landing": landing,
    })))
        .into_response()
}

/// GET /navigation/guard?path=X - may the caller render the page at X?
pub async fn guard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<GuardQuery>,
) -> axum::response::Response {
    let identity = match authz::resolve_caller(&services, &tenant, &caller).await {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };
    let state = AuthState::SignedIn(identity);

    match guard_page(services.routes(), &query.path, &state) {
        PageAccess::Granted(page) => (StatusCode::OK, Json(serde_json::json!({
            "path": page.path,
            "granted": true,
        })))
            .into_response(),
        PageAccess::Denied { page, explanation } => (StatusCode::OK, Json(serde_json::json!({
            "path": page.path,
            "granted": false,
            "explanation": explanation,
        })))
            .into_response(),
        PageAccess::SignInRequired => {
            errors::json_error(StatusCode::UNAUTHORIZED, "sign_in_required", "sign in first")
        }
        PageAccess::NotFound => errors::json_error(StatusCode::NOT_FOUND, "not_found", "no such page"),
    }
}
