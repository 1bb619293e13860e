use std::sync::Arc;

use axum::http::Extensions;

use grantgate_auth::{PermissionSnapshot, PrincipalContext, RequestPermissions};

/// Principal placed on the request by the identity middleware.
///
/// A request that never passed through it is anonymous.
pub fn principal_of(extensions: &Extensions) -> PrincipalContext {
    extensions
        .get::<PrincipalContext>()
        .cloned()
        .unwrap_or_default()
}

/// Per-request permission snapshot (request extension).
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot(Arc<RequestPermissions>);

impl RequestSnapshot {
    pub fn new(permissions: Arc<RequestPermissions>) -> Self {
        Self(permissions)
    }

    /// `false` for unloaded snapshots and malformed keys.
    pub fn contains_key(&self, permission: &str) -> bool {
        self.0.snapshot().is_some_and(|s| s.contains_key(permission))
    }

    /// The loaded snapshot, or an empty one if loading never happened.
    pub fn snapshot(&self) -> PermissionSnapshot {
        self.0.snapshot().cloned().unwrap_or_default()
    }
}
