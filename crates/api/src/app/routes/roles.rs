//! Role registry endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use medgate_auth::KnownSlug;
use medgate_core::RoleId;
use medgate_infra::directory::{AssignPermissions, NewRole, RoleUpdate};
use medgate_infra::{RoleQuery, RolesApi};

use crate::app::{errors, routes::parse_id, services::AppServices};
use crate::authz;
use crate::context::{CallerContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).patch(update_role).delete(delete_role))
        .route("/:id/permissions", put(assign_permissions))
}

/// GET /roles?keyword=&page=&per_page=
pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<RoleQuery>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ViewRoles).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).list_roles(&query).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// GET /roles/:id
pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RoleId = match parse_id(&id, "role") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ViewRoles).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).get_role(id).await {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// POST /roles
pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<NewRole>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ManageRoles).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).create_role(body).await {
        Ok(role) => (StatusCode::CREATED, Json(role)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// PATCH /roles/:id
pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<RoleUpdate>,
) -> axum::response::Response {
    let id: RoleId = match parse_id(&id, "role") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ManageRoles).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).update_role(id, body).await {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// DELETE /roles/:id
pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RoleId = match parse_id(&id, "role") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ManageRoles).await {
        return denied;
    }

    match services.directory(tenant.tenant_id()).delete_role(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// PUT /roles/:id/permissions - replace the role's permission set
pub async fn assign_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<AssignPermissions>,
) -> axum::response::Response {
    let id: RoleId = match parse_id(&id, "role") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = authz::require(&services, &tenant, &caller, KnownSlug::ManageRoles).await {
        return denied;
    }

    match services
        .directory(tenant.tenant_id())
        .assign_permissions(id, body.permission_ids)
        .await
    {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}
