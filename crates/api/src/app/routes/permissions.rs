//! Permission catalog endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use medgate_auth::KnownSlug;
use medgate_core::PermissionId;
use medgate_infra::directory::{NewPermission, PermissionUpdate};
use medgate_infra::{PermissionQuery, PermissionsApi};

use crate::app::{errors, routes::parse_id, services::AppServices};
use crate::authz;
use crate::context::{CallerContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_permissions).post(create_permission))
        .route("/:id", patch(update_permission).delete(delete_permission))
}

/// GET /permissions?module=&keyword=&page=&per_page=
pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<PermissionQuery>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ViewRoles).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).list_permissions(&query).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// POST /permissions
pub async fn create_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<NewPermission>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ManagePermissions).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).create_permission(body).await {
        Ok(permission) => (StatusCode::CREATED, Json(permission)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// PATCH /permissions/:id
pub async fn update_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<PermissionUpdate>,
) -> axum::response::Response {
    let id: PermissionId = match parse_id(&id, "permission") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ManagePermissions).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).update_permission(id, body).await {
        Ok(permission) => (StatusCode::OK, Json(permission)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// DELETE /permissions/:id
pub async fn delete_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PermissionId = match parse_id(&id, "permission") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ManagePermissions).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).delete_permission(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}
