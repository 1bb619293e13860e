//! Postgres-backed grant store.
//!
//! Reads the `permissions` / `user_permissions` tables described in
//! `migrations/0001_permission_grants.sql`.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |---|---|
//! | `PoolTimedOut`, `PoolClosed`, `Io`, `Tls` | `Unavailable` |
//! | `ColumnDecode`, `ColumnNotFound`, `Decode`, `TypeNotFound` | `MalformedRow` |
//! | anything else | `Other` |
//!
//! A row whose `permission_key` fails validation is also `MalformedRow`.
//!
//! Every query borrows a pooled connection for its own duration only; the
//! connection goes back to the pool when the query future completes or is
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use grantgate_auth::{Category, Grant, GrantStore, PermissionKey, StoreError};
use grantgate_core::UserId;

const SELECT_GRANTS: &str = r#"
    SELECT
        up.user_id,
        p.permission_key,
        p.category,
        up.assigned_date,
        up.assigned_by,
        up.is_grant,
        up.expiration_date
    FROM user_permissions up
    JOIN permissions p ON p.permission_id = up.permission_id
    WHERE up.user_id = $1
"#;

/// Postgres-backed, read-only grant store.
///
/// `Send + Sync`; clone freely, clones share the pool.
#[derive(Debug, Clone)]
pub struct PostgresGrantStore {
    pool: Arc<PgPool>,
}

impl PostgresGrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    ///
    /// `acquire_timeout` bounds how long a query waits for a free connection.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    async fn fetch(
        &self,
        operation: &'static str,
        user_id: UserId,
        permission: Option<&PermissionKey>,
    ) -> Result<Vec<Grant>, StoreError> {
        let rows = match permission {
            Some(permission) => {
                let sql = format!("{SELECT_GRANTS} AND p.permission_key = $2");
                sqlx::query(&sql)
                    .bind(user_id.get())
                    .bind(permission.as_str())
                    .fetch_all(&*self.pool)
                    .await
            }
            None => {
                sqlx::query(SELECT_GRANTS)
                    .bind(user_id.get())
                    .fetch_all(&*self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error(operation, e))?;

        rows.iter().map(grant_from_row).collect()
    }
}

#[async_trait]
impl GrantStore for PostgresGrantStore {
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn grants_for_user(&self, user_id: UserId) -> Result<Vec<Grant>, StoreError> {
        self.fetch("grants_for_user", user_id, None).await
    }

    #[instrument(skip(self), fields(user_id = %user_id, permission = %permission), err)]
    async fn grants_for_pair(
        &self,
        user_id: UserId,
        permission: &PermissionKey,
    ) -> Result<Vec<Grant>, StoreError> {
        self.fetch("grants_for_pair", user_id, Some(permission)).await
    }
}

fn grant_from_row(row: &PgRow) -> Result<Grant, StoreError> {
    let decoded = GrantRow::decode(row).map_err(|e| map_sqlx_error("decode_grant", e))?;
    decoded.try_into()
}

#[derive(Debug)]
struct GrantRow {
    user_id: i64,
    permission_key: String,
    category: String,
    assigned_date: DateTime<Utc>,
    assigned_by: String,
    is_grant: bool,
    expiration_date: Option<DateTime<Utc>>,
}

impl GrantRow {
    fn decode(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            permission_key: row.try_get("permission_key")?,
            category: row.try_get("category")?,
            assigned_date: row.try_get("assigned_date")?,
            assigned_by: row.try_get("assigned_by")?,
            is_grant: row.try_get("is_grant")?,
            expiration_date: row.try_get("expiration_date")?,
        })
    }
}

impl TryFrom<GrantRow> for Grant {
    type Error = StoreError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let permission = PermissionKey::new(row.permission_key)
            .map_err(|e| StoreError::MalformedRow(e.to_string()))?;

        Ok(Grant {
            user_id: UserId::new(row.user_id),
            permission,
            category: Category::new(row.category),
            is_grant: row.is_grant,
            assigned_by: row.assigned_by,
            assigned_date: row.assigned_date,
            expiration_date: row.expiration_date,
        })
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}: {err}"))
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            StoreError::Unavailable(format!("connection failed in {operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => {
            StoreError::MalformedRow(format!("{operation}: {err}"))
        }
        _ => StoreError::Other(format!("sqlx error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str) -> GrantRow {
        GrantRow {
            user_id: 7,
            permission_key: key.to_string(),
            category: "Users".to_string(),
            assigned_date: Utc::now(),
            assigned_by: "registrar".to_string(),
            is_grant: true,
            expiration_date: None,
        }
    }

    #[test]
    fn converts_valid_rows() {
        let grant = Grant::try_from(row("USER.VIEW")).unwrap();
        assert_eq!(grant.user_id, UserId::new(7));
        assert_eq!(grant.permission.as_str(), "USER.VIEW");
        assert_eq!(grant.category.as_str(), "Users");
    }

    #[test]
    fn invalid_key_is_a_malformed_row() {
        assert!(matches!(
            Grant::try_from(row("USER VIEW")),
            Err(StoreError::MalformedRow(_))
        ));
    }

    #[test]
    fn pool_faults_are_unavailable() {
        assert!(matches!(
            map_sqlx_error("grants_for_user", sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("grants_for_user", sqlx::Error::ColumnNotFound("is_grant".into())),
            StoreError::MalformedRow(_)
        ));
        assert!(matches!(
            map_sqlx_error("grants_for_user", sqlx::Error::RowNotFound),
            StoreError::Other(_)
        ));
    }
}
