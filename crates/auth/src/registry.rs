//! Startup-built mapping from policy name / permission key to gate.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use grantgate_core::CoreError;

use crate::{AuthorizationGate, PermissionKey, PermissionService, Policy};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("policy '{0}' is already registered")]
    DuplicatePolicy(String),

    #[error("permission '{permission}' is already bound to policy '{policy}'")]
    PermissionAlreadyBound { permission: String, policy: String },

    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),

    #[error(transparent)]
    InvalidPermission(#[from] CoreError),
}

/// Registry of every policy the host protects operations with.
///
/// Names and keys are bound 1:1; each binding owns one shared gate.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    service: Arc<PermissionService>,
    gates: BTreeMap<String, Arc<AuthorizationGate>>,
    by_permission: HashMap<PermissionKey, String>,
}

impl PolicyRegistry {
    pub fn new(service: Arc<PermissionService>) -> Self {
        Self {
            service,
            gates: BTreeMap::new(),
            by_permission: HashMap::new(),
        }
    }

    /// Build a registry from `(policy name, permission key)` rows.
    pub fn from_table(
        service: Arc<PermissionService>,
        table: &[(&str, &str)],
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(service);
        for (name, key) in table {
            let permission: PermissionKey = key.parse()?;
            registry.register(*name, permission)?;
        }
        Ok(registry)
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        permission: PermissionKey,
    ) -> Result<Arc<AuthorizationGate>, RegistryError> {
        let name = name.into();
        if self.gates.contains_key(&name) {
            return Err(RegistryError::DuplicatePolicy(name));
        }
        if let Some(existing) = self.by_permission.get(&permission) {
            return Err(RegistryError::PermissionAlreadyBound {
                permission: permission.to_string(),
                policy: existing.clone(),
            });
        }

        let gate = Arc::new(AuthorizationGate::new(
            Policy::new(name.clone(), permission.clone()),
            self.service.clone(),
        ));
        self.by_permission.insert(permission, name.clone());
        self.gates.insert(name, gate.clone());
        Ok(gate)
    }

    pub fn gate(&self, name: &str) -> Option<Arc<AuthorizationGate>> {
        self.gates.get(name).cloned()
    }

    /// Like [`gate`](Self::gate) but an unknown name is an error, for startup
    /// wiring where a typo must not leave an operation unprotected.
    pub fn require(&self, name: &str) -> Result<Arc<AuthorizationGate>, RegistryError> {
        self.gate(name)
            .ok_or_else(|| RegistryError::UnknownPolicy(name.to_string()))
    }

    pub fn gate_for(&self, permission: &PermissionKey) -> Option<Arc<AuthorizationGate>> {
        self.by_permission
            .get(permission)
            .and_then(|name| self.gate(name))
    }

    /// Registered policies, sorted by name.
    pub fn policies(&self) -> impl Iterator<Item = &Policy> {
        self.gates.values().map(|g| g.policy())
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedStore, key};

    fn service() -> Arc<PermissionService> {
        Arc::new(PermissionService::new(ScriptedStore::with_grants(vec![])))
    }

    #[test]
    fn builds_from_table() {
        let registry = PolicyRegistry::from_table(
            service(),
            &[("CanViewUsers", "USER.VIEW"), ("CanEditCourses", "COURSE.EDIT")],
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        let gate = registry.require("CanViewUsers").unwrap();
        assert_eq!(gate.policy().permission(), &key("USER.VIEW"));

        let by_key = registry.gate_for(&key("COURSE.EDIT")).unwrap();
        assert_eq!(by_key.policy().name(), "CanEditCourses");

        let names: Vec<_> = registry.policies().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["CanEditCourses", "CanViewUsers"]);
    }

    #[test]
    fn same_name_returns_the_same_gate() {
        let registry = PolicyRegistry::from_table(service(), &[("CanViewUsers", "USER.VIEW")]).unwrap();
        let a = registry.gate("CanViewUsers").unwrap();
        let b = registry.gate("CanViewUsers").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn rejects_duplicate_names_and_rebound_keys() {
        let mut registry = PolicyRegistry::new(service());
        registry.register("CanViewUsers", key("USER.VIEW")).unwrap();

        assert_eq!(
            registry.register("CanViewUsers", key("USER.EDIT")).unwrap_err(),
            RegistryError::DuplicatePolicy("CanViewUsers".into())
        );
        assert!(matches!(
            registry.register("CanSeeUsers", key("USER.VIEW")),
            Err(RegistryError::PermissionAlreadyBound { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_invalid_keys_and_unknown_names() {
        assert!(matches!(
            PolicyRegistry::from_table(service(), &[("Broken", "not a key")]),
            Err(RegistryError::InvalidPermission(_))
        ));

        let registry = PolicyRegistry::new(service());
        assert_eq!(
            registry.require("Nope").unwrap_err(),
            RegistryError::UnknownPolicy("Nope".into())
        );
    }
}
