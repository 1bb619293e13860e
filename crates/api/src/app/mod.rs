//! HTTP application wiring.
//!
//! - `services.rs`: grant store selection and authorization services
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: response shapes
//! - `errors.rs`: uniform error bodies

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use grantgate_auth::RegistryError;
use grantgate_infra::GrantGateConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (used by `main.rs`).
pub async fn build_app(config: &GrantGateConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_router(config, services)?)
}

/// Router over already-wired services.
///
/// Request flow for everything but `/health`: identity resolution, then the
/// per-request snapshot load, then the route's policy gate, then the handler.
pub fn build_router(
    config: &GrantGateConfig,
    services: services::AppServices,
) -> Result<Router, RegistryError> {
    let identity = middleware::IdentityState::hs256(&config.jwt_secret, config.claims.clone());
    let snapshots = services.snapshots.clone();
    let services = Arc::new(services);

    let authenticated = routes::router(&services)?
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            snapshots,
            middleware::snapshot_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            identity,
            middleware::identity_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(authenticated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use grantgate_infra::InMemoryGrantStore;
    use tower::ServiceExt;

    fn router() -> Router {
        let config = GrantGateConfig::from_lookup(|_| None).unwrap();
        let services = services::services_with_store(&config, InMemoryGrantStore::arc()).unwrap();
        build_router(&config, services).unwrap()
    }

    async fn status(path: &str) -> StatusCode {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        router().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_needs_no_identity() {
        assert_eq!(status("/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn anonymous_callers_are_unauthenticated_on_protected_routes() {
        assert_eq!(status("/whoami").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status("/users/1").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status("/admin/policies").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        assert_eq!(status("/nope").await, StatusCode::NOT_FOUND);
    }
}
