//! Per-request permission cache.
//!
//! A [`PermissionSnapshot`] is computed once when a request enters and never
//! re-queried or mutated afterwards. It lives only as long as the request
//! that created it.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;

use grantgate_core::UserId;

use crate::{
    PermissionCatalog, PermissionKey, PermissionService, Principal, PrincipalContext, Role,
};

/// Immutable set of a user's active permissions plus their role claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSnapshot {
    user_id: Option<UserId>,
    roles: Vec<Role>,
    permissions: BTreeSet<PermissionKey>,
    privileged: bool,
}

impl PermissionSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn permissions(&self) -> &BTreeSet<PermissionKey> {
        &self.permissions
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn contains(&self, permission: &PermissionKey) -> bool {
        self.permissions.contains(permission)
    }

    /// Membership by raw key; an invalid key is simply absent.
    pub fn contains_key(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == permission)
    }

    /// Any permission whose `CATEGORY.` prefix equals `category`.
    pub fn has_any_in_category(&self, category: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p.category_prefix() == category)
    }

    /// Any permission whose final `.ACTION` segment equals `action`.
    pub fn has_any_action(&self, action: &str) -> bool {
        self.permissions.iter().any(|p| p.action() == action)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    /// Whether the role claim matched a configured privileged role.
    pub fn is_privileged(&self) -> bool {
        self.privileged
    }
}

/// Roles whose members always receive every catalog permission.
#[derive(Debug, Clone, Default)]
pub struct PrivilegedRoles {
    roles: HashSet<Role>,
    catalog: PermissionCatalog,
}

impl PrivilegedRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>, catalog: PermissionCatalog) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            catalog,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn matches(&self, principal: &Principal) -> bool {
        self.roles.iter().any(|r| principal.has_role(r.as_str()))
    }

    fn expansion(&self) -> impl Iterator<Item = PermissionKey> + '_ {
        self.catalog.keys().cloned()
    }
}

/// Builds snapshots from [`PermissionService`]; shared across requests.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    service: Arc<PermissionService>,
    privileged: PrivilegedRoles,
}

impl SnapshotLoader {
    pub fn new(service: Arc<PermissionService>) -> Self {
        Self {
            service,
            privileged: PrivilegedRoles::none(),
        }
    }

    pub fn with_privileged_roles(mut self, privileged: PrivilegedRoles) -> Self {
        self.privileged = privileged;
        self
    }

    /// One `list_active_permissions` call for an authenticated principal,
    /// none otherwise.
    pub async fn load_snapshot(&self, principal: &PrincipalContext) -> PermissionSnapshot {
        let principal = match principal {
            PrincipalContext::Authenticated(p) => p,
            PrincipalContext::Anonymous => return PermissionSnapshot::empty(),
            PrincipalContext::Unresolved(err) => {
                tracing::warn!(error = %err, "identity unresolved; using empty permission snapshot");
                return PermissionSnapshot::empty();
            }
        };

        let mut permissions = self.service.list_active_permissions(principal.user_id).await;
        let privileged = self.privileged.matches(principal);
        if privileged {
            permissions.extend(self.privileged.expansion());
        }

        tracing::debug!(
            user_id = %principal.user_id,
            permission_count = permissions.len(),
            privileged,
            "permission snapshot loaded"
        );

        PermissionSnapshot {
            user_id: Some(principal.user_id),
            roles: principal.roles.clone(),
            permissions,
            privileged,
        }
    }
}

/// The snapshot slot owned by a single request.
///
/// Starts empty; the first [`load`](Self::load) fills it and every later
/// load returns the same snapshot without touching the store.
#[derive(Debug, Default)]
pub struct RequestPermissions {
    cell: OnceCell<PermissionSnapshot>,
}

impl RequestPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(
        &self,
        loader: &SnapshotLoader,
        principal: &PrincipalContext,
    ) -> &PermissionSnapshot {
        self.cell
            .get_or_init(|| loader.load_snapshot(principal))
            .await
    }

    pub fn snapshot(&self) -> Option<&PermissionSnapshot> {
        self.cell.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// `false` until the snapshot has been loaded.
    pub fn contains(&self, permission: &PermissionKey) -> bool {
        self.snapshot().is_some_and(|s| s.contains(permission))
    }
}
