use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use grantgate_auth::PrincipalContext;

use crate::app::{dto::WhoAmIResponse, errors};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> Response {
    let Some(principal) = principal.principal() else {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        );
    };

    Json(WhoAmIResponse {
        user_id: principal.user_id.get(),
        roles: principal.roles.iter().map(|r| r.as_str().to_string()).collect(),
    })
    .into_response()
}
