//! Request/response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use grantgate_auth::{PermissionCatalog, PermissionSnapshot, Policy};

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: i64,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub user_id: Option<i64>,
    pub permissions: Vec<String>,
    pub categories: BTreeMap<String, Vec<String>>,
    pub privileged: bool,
}

impl SnapshotResponse {
    pub fn from_snapshot(snapshot: &PermissionSnapshot, catalog: &PermissionCatalog) -> Self {
        Self {
            user_id: snapshot.user_id().map(|u| u.get()),
            permissions: snapshot.permissions().iter().map(|p| p.to_string()).collect(),
            categories: catalog.group_by_category(snapshot.permissions()),
            privileged: snapshot.is_privileged(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub name: String,
    pub permission: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl PolicyResponse {
    pub fn from_policy(policy: &Policy, catalog: &PermissionCatalog) -> Self {
        let definition = catalog.get(policy.permission());
        Self {
            name: policy.name().to_string(),
            permission: policy.permission().to_string(),
            category: definition.map(|d| d.category.to_string()),
            description: definition.and_then(|d| d.description.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivePermissionsResponse {
    pub user_id: i64,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PermissionCheckResponse {
    pub user_id: i64,
    pub permission: String,
    pub granted: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub can_edit: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub course_id: i64,
    pub title: String,
    pub updated_by: i64,
}
