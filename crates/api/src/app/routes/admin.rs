//! Administrative inspection of policies and user grants.
//!
//! Every route here is behind `CanAccessAdmin`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use grantgate_auth::{PermissionKey, PolicyRegistry, RegistryError};
use grantgate_core::UserId;

use crate::app::{
    dto::{ActivePermissionsResponse, PermissionCheckResponse, PolicyResponse},
    errors,
    services::AppServices,
};
use crate::authz::{self, CAN_ACCESS_ADMIN};

pub fn router(registry: &PolicyRegistry) -> Result<Router, RegistryError> {
    let routes = Router::new()
        .route("/policies", get(list_policies))
        .route("/users/:user_id/permissions", get(user_permissions))
        .route(
            "/users/:user_id/permissions/:permission",
            get(check_user_permission),
        );

    authz::protect(routes, registry, CAN_ACCESS_ADMIN)
}

async fn list_policies(
    Extension(services): Extension<Arc<AppServices>>,
) -> Json<Vec<PolicyResponse>> {
    Json(
        services
            .registry
            .policies()
            .map(|p| PolicyResponse::from_policy(p, &services.catalog))
            .collect(),
    )
}

async fn user_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
) -> Json<ActivePermissionsResponse> {
    let active = services
        .permissions
        .list_active_permissions(UserId::new(user_id))
        .await;

    Json(ActivePermissionsResponse {
        user_id,
        permissions: active.iter().map(|p| p.to_string()).collect(),
    })
}

async fn check_user_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, permission)): Path<(i64, String)>,
) -> Response {
    let permission = match PermissionKey::new(permission) {
        Ok(key) => key,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_permission", e.to_string());
        }
    };

    let granted = services
        .permissions
        .check_permission(UserId::new(user_id), &permission)
        .await;

    Json(PermissionCheckResponse {
        user_id,
        permission: permission.to_string(),
        granted,
    })
    .into_response()
}
