use serde::Serialize;

use grantgate_core::UserId;

use crate::{AuthzError, ClaimMapping, Claims, Role};

/// An authenticated user as seen by the authorization core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }
}

/// Identity resolved from a request, passed explicitly into every check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrincipalContext {
    /// The host found no credentials.
    #[default]
    Anonymous,

    /// Credentials present and an identifier was resolved.
    Authenticated(Principal),

    /// Credentials present but no usable identifier. Always carries
    /// [`AuthzError::MissingIdentity`] or [`AuthzError::MalformedIdentity`].
    Unresolved(AuthzError),
}

impl PrincipalContext {
    /// Extract the principal from already-verified claims.
    pub fn from_claims(claims: &Claims, mapping: &ClaimMapping) -> Self {
        let raw = match claims.scalar(&mapping.user_id_claim) {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Self::Unresolved(AuthzError::MissingIdentity),
        };

        let user_id = match raw.parse::<UserId>() {
            Ok(id) => id,
            Err(e) => return Self::Unresolved(AuthzError::MalformedIdentity(e.to_string())),
        };

        let roles = claims
            .values(&mapping.role_claim)
            .into_iter()
            .map(Role::new)
            .collect();

        Self::Authenticated(Principal::new(user_id, roles))
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self::Authenticated(principal)
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(p) => Some(p),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.principal().map(|p| p.user_id)
    }
}
