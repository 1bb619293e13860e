//! `grantgate-auth`: fail-closed permission authorization.
//!
//! Decides per request whether a principal may perform a named operation,
//! from grant records read through [`GrantStore`]. Decoupled from HTTP and
//! from any concrete storage.

pub mod claims;
pub mod error;
pub mod gate;
pub mod grant;
pub mod permissions;
pub mod principal;
pub mod registry;
pub mod roles;
pub mod service;
pub mod snapshot;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::{ClaimMapping, Claims};
pub use error::AuthzError;
pub use gate::{AUDIT_TARGET, AuthorizationGate, Decision, DenialKind, GateState, Policy};
pub use grant::Grant;
pub use permissions::{Category, PermissionCatalog, PermissionDefinition, PermissionKey};
pub use principal::{Principal, PrincipalContext};
pub use registry::{PolicyRegistry, RegistryError};
pub use roles::Role;
pub use service::{DEFAULT_STORE_TIMEOUT, PermissionService};
pub use snapshot::{PermissionSnapshot, PrivilegedRoles, RequestPermissions, SnapshotLoader};
pub use store::{GrantStore, StoreError};
