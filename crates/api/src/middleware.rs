use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use medgate_core::{IdentityId, TenantId};
use medgate_infra::http::{IDENTITY_HEADER, TENANT_HEADER};

use crate::app::errors::json_error;
use crate::context::{CallerContext, TenantContext};

/// Lift the gateway's tenant/identity headers into request extensions.
pub async fn context_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let tenant_id: TenantId = header_id(req.headers(), TENANT_HEADER)?;
    let identity_id: IdentityId = header_id(req.headers(), IDENTITY_HEADER)?;

    req.extensions_mut().insert(TenantContext::new(tenant_id));
    req.extensions_mut().insert(CallerContext::new(identity_id));

    Ok(next.run(req).await)
}

fn header_id<T: std::str::FromStr>(headers: &HeaderMap, name: &'static str) -> Result<T, Response> {
    let value = headers
        .get(name)
        .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "missing_context", format!("{name} header is required")))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{name} is not a valid id")))
}
