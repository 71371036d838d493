use std::str::FromStr;

use axum::{http::StatusCode, response::Response, Router};

use crate::app::errors;

pub mod identities;
pub mod navigation;
pub mod permissions;
pub mod roles;
pub mod system;

/// Router for all tenant-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/permissions", permissions::router())
        .nest("/roles", roles::router())
        .nest("/identities", identities::router())
        .nest("/navigation", navigation::router())
}

/// Parse an id path segment, answering 400 with a JSON body when malformed.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &'static str) -> Result<T, Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
