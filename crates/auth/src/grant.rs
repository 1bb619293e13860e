//! Grant records and the active-grant evaluation rule.
//!
//! A grant is *active* iff `is_grant` is set and its expiration is absent or
//! strictly after `now`. When several rows exist for the same
//! (user, permission) pair the permission is active if any one of them is.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use grantgate_core::UserId;

use crate::{Category, PermissionKey};

/// One (user, permission) authorization record, as the grant store returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub user_id: UserId,
    pub permission: PermissionKey,
    pub category: Category,
    pub is_grant: bool,
    pub assigned_by: String,
    pub assigned_date: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
}

impl Grant {
    /// A non-expiring positive grant; the category defaults to the key prefix.
    pub fn allow(
        user_id: UserId,
        permission: PermissionKey,
        assigned_by: impl Into<String>,
        assigned_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            category: Category::from_key(&permission),
            permission,
            is_grant: true,
            assigned_by: assigned_by.into(),
            assigned_date,
            expiration_date: None,
        }
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expiration_date = Some(at);
        self
    }

    /// Same record with `is_grant` cleared.
    pub fn withheld(mut self) -> Self {
        self.is_grant = false;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|exp| exp <= now)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_grant && !self.is_expired(now)
    }
}

/// Keys with at least one active grant among `grants`.
pub fn active_permissions<'a>(
    grants: impl IntoIterator<Item = &'a Grant>,
    now: DateTime<Utc>,
) -> BTreeSet<PermissionKey> {
    grants
        .into_iter()
        .filter(|g| g.is_active(now))
        .map(|g| g.permission.clone())
        .collect()
}

/// Whether `permission` has at least one active grant among `grants`.
///
/// Rows for other keys are ignored, so an over-returning store cannot widen
/// access.
pub fn is_permission_active<'a>(
    grants: impl IntoIterator<Item = &'a Grant>,
    permission: &PermissionKey,
    now: DateTime<Utc>,
) -> bool {
    grants
        .into_iter()
        .any(|g| &g.permission == permission && g.is_active(now))
}
