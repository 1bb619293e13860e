use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use grantgate_auth::DenialKind;

/// Authorization refusal. Carries no internal detail.
pub fn denial_response(kind: DenialKind) -> axum::response::Response {
    if kind.requires_authentication() {
        json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
    } else {
        json_error(StatusCode::FORBIDDEN, "forbidden", "permission denied")
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
