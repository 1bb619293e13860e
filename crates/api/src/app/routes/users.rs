use axum::{
    Json, Router,
    extract::{Extension, Path},
    routing::get,
};

use grantgate_auth::{PolicyRegistry, RegistryError};

use crate::app::dto::UserResponse;
use crate::authz::{self, CAN_VIEW_USERS};
use crate::context::RequestSnapshot;

pub fn router(registry: &PolicyRegistry) -> Result<Router, RegistryError> {
    authz::protect(
        Router::new().route("/:user_id", get(get_user)),
        registry,
        CAN_VIEW_USERS,
    )
}

/// `can_edit` comes from the request snapshot; no extra store round trip.
async fn get_user(
    Path(user_id): Path<i64>,
    Extension(snapshot): Extension<RequestSnapshot>,
) -> Json<UserResponse> {
    Json(UserResponse {
        user_id,
        can_edit: snapshot.contains_key(authz::USER_EDIT),
    })
}
