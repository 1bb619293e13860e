use axum::{Router, routing::get};

use grantgate_auth::RegistryError;

use crate::app::services::AppServices;

pub mod admin;
pub mod courses;
pub mod me;
pub mod system;
pub mod users;

/// Router for every endpoint behind identity resolution.
///
/// Fails if a route names a policy the registry does not know.
pub fn router(services: &AppServices) -> Result<Router, RegistryError> {
    Ok(Router::new()
        .route("/whoami", get(system::whoami))
        .route("/me/permissions", get(me::permissions))
        .nest("/users", users::router(&services.registry)?)
        .nest("/courses", courses::router(&services.registry)?)
        .nest("/admin", admin::router(&services.registry)?))
}
