//! Service wiring: grant store, permission service, policies, snapshots.

use std::sync::Arc;

use grantgate_auth::{
    GrantStore, PermissionCatalog, PermissionService, PolicyRegistry, PrivilegedRoles,
    RegistryError, SnapshotLoader,
};
use grantgate_infra::{GrantGateConfig, InMemoryGrantStore, PostgresGrantStore};

use crate::authz;

/// Everything request handlers share. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub permissions: Arc<PermissionService>,
    pub registry: PolicyRegistry,
    pub snapshots: SnapshotLoader,
    pub catalog: PermissionCatalog,
}

/// Pick the grant store from configuration and wire the services on it.
pub async fn build_services(config: &GrantGateConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn GrantStore> = match config.database_url.as_deref() {
        Some(url) => {
            tracing::info!("using postgres grant store");
            Arc::new(PostgresGrantStore::connect(url, config.store_timeout).await?)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using empty in-memory grant store");
            InMemoryGrantStore::arc()
        }
    };

    Ok(services_with_store(config, store)?)
}

pub fn services_with_store(
    config: &GrantGateConfig,
    store: Arc<dyn GrantStore>,
) -> Result<AppServices, RegistryError> {
    let permissions = Arc::new(PermissionService::new(store).with_timeout(config.store_timeout));
    let catalog = authz::catalog()?;
    let registry = PolicyRegistry::from_table(permissions.clone(), authz::POLICIES)?;
    let snapshots = SnapshotLoader::new(permissions.clone()).with_privileged_roles(
        PrivilegedRoles::new(config.privileged_roles.iter().cloned(), catalog.clone()),
    );

    Ok(AppServices {
        permissions,
        registry,
        snapshots,
        catalog,
    })
}
