use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use medgate_infra::DirectoryError;

pub fn directory_error_to_response(err: DirectoryError) -> axum::response::Response {
    match err {
        DirectoryError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DirectoryError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DirectoryError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DirectoryError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        DirectoryError::Unavailable(msg) => {
            tracing::error!(error = %msg, "registry unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
