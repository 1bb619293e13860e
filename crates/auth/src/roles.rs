use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role name taken from the identity claims.
///
/// Roles carry no meaning inside the evaluation core. Hosts may configure
/// privileged roles that widen a request snapshot (see
/// [`PrivilegedRoles`](crate::snapshot::PrivilegedRoles)).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma-separated list, skipping blank entries.
    pub fn parse_list(raw: &str) -> Vec<Role> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Role::new(s.to_string()))
            .collect()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_skips_blanks() {
        let roles = Role::parse_list(" Admin, ,Auditor ,");
        assert_eq!(roles, vec![Role::new("Admin"), Role::new("Auditor")]);
        assert!(Role::parse_list("").is_empty());
    }
}
