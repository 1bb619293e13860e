//! The single authority for "is permission P active for user U".

use std::any::Any;
use std::collections::BTreeSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use grantgate_core::{Clock, SystemClock, UserId};

use crate::grant::{active_permissions, is_permission_active};
use crate::{AuthzError, GrantStore, PermissionKey, StoreError};

/// Upper bound on a single grant-store round-trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Fail-closed permission queries over a [`GrantStore`].
///
/// Both queries swallow every fault, including a panicking adapter: it is
/// logged at error level and the answer degrades to "not granted". The service holds no mutable state, so
/// one instance is shared by every request.
#[derive(Clone)]
pub struct PermissionService {
    store: Arc<dyn GrantStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl PermissionService {
    pub fn new(store: Arc<dyn GrantStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True iff an active grant exists for the pair.
    pub async fn check_permission(&self, user_id: UserId, permission: &PermissionKey) -> bool {
        match self.try_check_permission(user_id, permission).await {
            Ok(active) => active,
            Err(err) => {
                tracing::error!(
                    user_id = %user_id,
                    permission = %permission,
                    error = %err,
                    "permission check failed; denying"
                );
                false
            }
        }
    }

    /// Every key with an active grant for `user_id`; empty on any fault.
    pub async fn list_active_permissions(&self, user_id: UserId) -> BTreeSet<PermissionKey> {
        match self.try_list_active_permissions(user_id).await {
            Ok(active) => active,
            Err(err) => {
                tracing::error!(
                    user_id = %user_id,
                    error = %err,
                    "listing active permissions failed; returning none"
                );
                BTreeSet::new()
            }
        }
    }

    async fn try_check_permission(
        &self,
        user_id: UserId,
        permission: &PermissionKey,
    ) -> Result<bool, AuthzError> {
        let rows = self
            .bounded(self.store.grants_for_pair(user_id, permission))
            .await?;
        // Rows for anyone else never count, whatever the adapter returned.
        let own = rows.iter().filter(|g| g.user_id == user_id);
        Ok(is_permission_active(own, permission, self.clock.now()))
    }

    async fn try_list_active_permissions(
        &self,
        user_id: UserId,
    ) -> Result<BTreeSet<PermissionKey>, AuthzError> {
        let rows = self.bounded(self.store.grants_for_user(user_id)).await?;
        let active = active_permissions(rows.iter().filter(|g| g.user_id == user_id), self.clock.now());
        Ok(active)
    }

    async fn bounded<T, F>(&self, query: F) -> Result<T, AuthzError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let outcome = AssertUnwindSafe(tokio::time::timeout(self.timeout, query))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => result.map_err(AuthzError::from),
            Err(payload) => Err(AuthzError::Unexpected(format!(
                "grant store panicked: {}",
                panic_message(payload.as_ref())
            ))),
            Ok(Err(_elapsed)) => {
                let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                Err(StoreError::Timeout(millis).into())
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl core::fmt::Debug for PermissionService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PermissionService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
