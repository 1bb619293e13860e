//! Policy declarations for every protected operation.
//!
//! Each permission key is bound to one named policy here, at startup; routes
//! name the policy they require through [`protect`].

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use grantgate_auth::{
    AuthorizationGate, Category, Decision, PermissionCatalog, PermissionDefinition, PermissionKey,
    PolicyRegistry, RegistryError,
};

use crate::app::errors;
use crate::context::principal_of;

pub const CAN_VIEW_USERS: &str = "CanViewUsers";
pub const CAN_EDIT_USERS: &str = "CanEditUsers";
pub const CAN_EDIT_COURSES: &str = "CanEditCourses";
pub const CAN_ACCESS_ADMIN: &str = "CanAccessAdmin";

pub const USER_VIEW: &str = "USER.VIEW";
pub const USER_EDIT: &str = "USER.EDIT";
pub const COURSE_EDIT: &str = "COURSE.EDIT";
pub const ADMIN_ACCESS: &str = "ADMIN.ACCESS";

/// `(policy name, permission key)`, one row per protected capability.
pub const POLICIES: &[(&str, &str)] = &[
    (CAN_VIEW_USERS, USER_VIEW),
    (CAN_EDIT_USERS, USER_EDIT),
    (CAN_EDIT_COURSES, COURSE_EDIT),
    (CAN_ACCESS_ADMIN, ADMIN_ACCESS),
];

/// Display metadata for the declared permissions.
pub fn catalog() -> Result<PermissionCatalog, RegistryError> {
    let rows: [(&'static str, &'static str, &'static str); 4] = [
        (USER_VIEW, "Users", "View user profiles"),
        (USER_EDIT, "Users", "Edit user profiles"),
        (COURSE_EDIT, "Courses", "Edit course details"),
        (ADMIN_ACCESS, "Administration", "Inspect grants and policies"),
    ];

    let mut catalog = PermissionCatalog::new();
    for (key, category, description) in rows {
        catalog.insert(
            PermissionDefinition::new(PermissionKey::new(key)?)
                .with_category(Category::new(category))
                .with_description(description),
        );
    }
    Ok(catalog)
}

/// Require `policy` for every route in `router`.
///
/// An unknown policy name fails at startup rather than leaving the routes
/// open.
pub fn protect(
    router: Router,
    registry: &PolicyRegistry,
    policy: &str,
) -> Result<Router, RegistryError> {
    let gate = registry.require(policy)?;
    Ok(router.route_layer(axum::middleware::from_fn_with_state(gate, enforce_policy)))
}

/// Gate the request on one policy.
pub async fn enforce_policy(
    State(gate): State<Arc<AuthorizationGate>>,
    req: Request,
    next: Next,
) -> Response {
    let principal = principal_of(req.extensions());
    match gate.evaluate(&principal).await {
        Decision::Granted => next.run(req).await,
        Decision::Denied(kind) => errors::denial_response(kind),
    }
}
