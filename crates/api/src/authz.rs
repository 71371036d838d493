//! API-side authorization guard for registry endpoints.
//!
//! The caller's role is read from the tenant's registry on every request,
//! so permission edits take effect immediately.

use axum::http::StatusCode;
use axum::response::Response;

use medgate_auth::{Identity, KnownSlug, authorize};
use medgate_infra::{DirectoryError, IdentityDirectory};

use crate::app::errors::{directory_error_to_response, json_error};
use crate::app::services::AppServices;
use crate::context::{CallerContext, TenantContext};

/// Resolve the caller into an [`Identity`] within the request's tenant.
///
/// A caller without a role assignment is forbidden rather than "not found".
pub async fn resolve_caller(
    services: &AppServices,
    tenant: &TenantContext,
    caller: &CallerContext,
) -> Result<Identity, Response> {
    let directory = services.directory(tenant.tenant_id());
    match directory.role_of(caller.identity_id()).await {
        Ok(role) => Ok(Identity::new(caller.identity_id(), tenant.tenant_id(), role)),
        Err(DirectoryError::NotFound(_)) => Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "identity holds no role in this tenant",
        )),
        Err(e) => Err(directory_error_to_response(e)),
    }
}

/// Check the caller holds `required` before a handler touches the registry.
pub async fn require(
    services: &AppServices,
    tenant: &TenantContext,
    caller: &CallerContext,
    required: KnownSlug,
) -> Result<Identity, Response> {
    let identity = resolve_caller(services, tenant, caller).await?;

    if let Err(e) = authorize(&identity, &required.slug()) {
        tracing::warn!(
            tenant_id = %tenant.tenant_id(),
            identity_id = %caller.identity_id(),
            required = %required,
            error = %e,
            "request denied"
        );
        return Err(json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()));
    }

    Ok(identity)
}
