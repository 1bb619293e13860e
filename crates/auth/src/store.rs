//! Grant-store collaborator contract.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use grantgate_core::UserId;

use crate::{AuthzError, Grant, PermissionKey};

/// Grant store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("grant store unavailable: {0}")]
    Unavailable(String),

    #[error("grant store did not answer within {0} ms")]
    Timeout(u64),

    #[error("malformed grant row: {0}")]
    MalformedRow(String),

    #[error("grant store error: {0}")]
    Other(String),
}

impl From<StoreError> for AuthzError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(_) | StoreError::Timeout(_) => {
                AuthzError::StoreUnavailable(value.to_string())
            }
            StoreError::MalformedRow(_) | StoreError::Other(_) => {
                AuthzError::Unexpected(value.to_string())
            }
        }
    }
}

/// Read-only access to grant records.
///
/// The core never writes grants; an external administrative workflow owns
/// them. Implementations must be safe under unbounded concurrent reads and
/// must release any connection they acquire on every exit path.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Every grant row for `user_id`, active or not.
    async fn grants_for_user(&self, user_id: UserId) -> Result<Vec<Grant>, StoreError>;

    /// Grant rows for a single (user, permission) pair.
    async fn grants_for_pair(
        &self,
        user_id: UserId,
        permission: &PermissionKey,
    ) -> Result<Vec<Grant>, StoreError> {
        let rows = self.grants_for_user(user_id).await?;
        Ok(rows
            .into_iter()
            .filter(|g| g.user_id == user_id && &g.permission == permission)
            .collect())
    }
}

#[async_trait]
impl<S> GrantStore for Arc<S>
where
    S: GrantStore + ?Sized,
{
    async fn grants_for_user(&self, user_id: UserId) -> Result<Vec<Grant>, StoreError> {
        (**self).grants_for_user(user_id).await
    }

    async fn grants_for_pair(
        &self,
        user_id: UserId,
        permission: &PermissionKey,
    ) -> Result<Vec<Grant>, StoreError> {
        (**self).grants_for_pair(user_id, permission).await
    }
}
