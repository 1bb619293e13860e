use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use async_trait::async_trait;

use grantgate_auth::{Grant, GrantStore, PermissionKey, StoreError};
use grantgate_core::UserId;

/// In-memory grant store.
///
/// Intended for tests/dev. The mutators stand in for the external grant
/// administration workflow; the authorization core only reads.
#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    grants: RwLock<HashMap<UserId, Vec<Grant>>>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn with_grants(grants: impl IntoIterator<Item = Grant>) -> Self {
        let store = Self::new();
        for grant in grants {
            store.insert(grant);
        }
        store
    }

    pub fn insert(&self, grant: Grant) {
        self.write_rows()
            .entry(grant.user_id)
            .or_default()
            .push(grant);
    }

    /// Drop every row for the pair. Returns how many were removed.
    pub fn remove(&self, user_id: UserId, permission: &PermissionKey) -> usize {
        let mut grants = self.write_rows();
        let Some(rows) = grants.get_mut(&user_id) else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|g| &g.permission != permission);
        before - rows.len()
    }

    /// Writers recover a poisoned lock; readers keep failing closed on it.
    fn write_rows(&self) -> RwLockWriteGuard<'_, HashMap<UserId, Vec<Grant>>> {
        self.grants.write().unwrap_or_else(|poisoned| {
            tracing::warn!("grant map lock poisoned; recovering for write");
            PoisonError::into_inner(poisoned)
        })
    }

    fn read_rows<F>(&self, user_id: UserId, keep: F) -> Result<Vec<Grant>, StoreError>
    where
        F: Fn(&Grant) -> bool,
    {
        let grants = self
            .grants
            .read()
            .map_err(|_| StoreError::Other("lock poisoned".to_string()))?;

        Ok(grants
            .get(&user_id)
            .map(|rows| rows.iter().filter(|g| keep(*g)).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn grants_for_user(&self, user_id: UserId) -> Result<Vec<Grant>, StoreError> {
        self.read_rows(user_id, |_| true)
    }

    async fn grants_for_pair(
        &self,
        user_id: UserId,
        permission: &PermissionKey,
    ) -> Result<Vec<Grant>, StoreError> {
        self.read_rows(user_id, |g| &g.permission == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn key(s: &'static str) -> PermissionKey {
        PermissionKey::new(s).unwrap()
    }

    fn grant(user: i64, perm: &'static str) -> Grant {
        Grant::allow(UserId::new(user), key(perm), "registrar", Utc::now() - Duration::days(1))
    }

    #[tokio::test]
    async fn returns_rows_per_user() {
        let store = InMemoryGrantStore::with_grants([
            grant(7, "USER.VIEW"),
            grant(7, "COURSE.EDIT"),
            grant(9, "USER.VIEW"),
        ]);

        let rows = store.grants_for_user(UserId::new(7)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(store.grants_for_user(UserId::new(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pair_query_keeps_duplicate_rows() {
        let store = InMemoryGrantStore::with_grants([
            grant(7, "USER.VIEW").withheld(),
            grant(7, "USER.VIEW"),
            grant(7, "COURSE.EDIT"),
        ]);

        let rows = store
            .grants_for_pair(UserId::new(7), &key("USER.VIEW"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|g| g.permission == key("USER.VIEW")));
    }

    fn poison(store: &InMemoryGrantStore) {
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = store.grants.write().unwrap();
                    panic!("writer died");
                })
                .join();
        });
        assert!(store.grants.is_poisoned());
    }

    #[tokio::test]
    async fn writes_survive_a_poisoned_lock() {
        let store = InMemoryGrantStore::with_grants([grant(7, "USER.VIEW")]);
        poison(&store);

        store.insert(grant(7, "COURSE.EDIT"));
        {
            let rows = store.grants.read().unwrap_or_else(PoisonError::into_inner);
            assert_eq!(rows[&UserId::new(7)].len(), 2);
        }
        assert_eq!(store.remove(UserId::new(7), &key("USER.VIEW")), 1);

        assert!(matches!(
            store.grants_for_user(UserId::new(7)).await,
            Err(StoreError::Other(_))
        ));
    }

    #[tokio::test]
    async fn remove_drops_all_rows_for_the_pair() {
        let store = InMemoryGrantStore::with_grants([grant(7, "USER.VIEW"), grant(7, "USER.VIEW")]);
        assert_eq!(store.remove(UserId::new(7), &key("USER.VIEW")), 2);
        assert_eq!(store.remove(UserId::new(8), &key("USER.VIEW")), 0);
        assert!(store.grants_for_user(UserId::new(7)).await.unwrap().is_empty());
    }
}
