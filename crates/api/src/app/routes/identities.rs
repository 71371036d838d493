//! Identity → role assignment endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use medgate_auth::KnownSlug;
use medgate_core::{IdentityId, RoleId};
use medgate_infra::directory::AssignRole;
use medgate_infra::IdentityDirectory;

use crate::app::{errors, routes::parse_id, services::AppServices};
use crate::authz;
use crate::context::{CallerContext, TenantContext};

pub fn router() -> Router {
    Router::new().route("/:id/role", get(get_identity_role).put(assign_identity_role))
}

/// GET /identities/:id/role
///
/// Any identity may read its own role (the console needs it to sign in);
/// reading someone else's requires `view-roles`.
pub async fn get_identity_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: IdentityId = match parse_id(&id, "identity") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if id != caller.identity_id() {
        if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ViewRoles).await {
            return denied;
        }
    }

    match services.directory(tenant.tenant_id()).role_of(id).await {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// PUT /identities/:id/role
pub async fn assign_identity_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<AssignRole>,
) -> axum::response::Response {
    let id: IdentityId = match parse_id(&id, "identity") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ManageRoles).await {
        return denied;
    }

    let role_id: RoleId = body.role_id;
    match services.directory(tenant.tenant_id()).assign_role(id, role_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}
