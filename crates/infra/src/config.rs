//! Configuration loading and representation.
//!
//! Values come from the process environment. `from_lookup` takes any
//! key -> value function so parsing can be exercised without touching the
//! real environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use grantgate_auth::{ClaimMapping, DEFAULT_STORE_TIMEOUT, Role};

pub const BIND_ADDR: &str = "GRANTGATE_BIND";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const JWT_SECRET: &str = "JWT_SECRET";
pub const STORE_TIMEOUT_MS: &str = "GRANTGATE_STORE_TIMEOUT_MS";
pub const USER_ID_CLAIM: &str = "GRANTGATE_USER_ID_CLAIM";
pub const ROLE_CLAIM: &str = "GRANTGATE_ROLE_CLAIM";
pub const PRIVILEGED_ROLES: &str = "GRANTGATE_PRIVILEGED_ROLES";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantGateConfig {
    pub bind_addr: SocketAddr,
    /// Absent means the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub store_timeout: Duration,
    pub claims: ClaimMapping,
    pub privileged_roles: Vec<Role>,
}

impl GrantGateConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get(BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: BIND_ADDR,
            message: e.to_string(),
        })?;

        let store_timeout = match get(STORE_TIMEOUT_MS) {
            Some(raw) => {
                let millis = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: STORE_TIMEOUT_MS,
                    message: e.to_string(),
                })?;
                if millis == 0 {
                    return Err(ConfigError::Invalid {
                        key: STORE_TIMEOUT_MS,
                        message: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(millis)
            }
            None => DEFAULT_STORE_TIMEOUT,
        };

        let jwt_secret = get(JWT_SECRET).unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let defaults = ClaimMapping::default();
        let claims = ClaimMapping {
            user_id_claim: get(USER_ID_CLAIM).unwrap_or(defaults.user_id_claim),
            role_claim: get(ROLE_CLAIM).unwrap_or(defaults.role_claim),
        };

        let privileged_roles = get(PRIVILEGED_ROLES)
            .map(|raw| Role::parse_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            bind_addr,
            database_url: get(DATABASE_URL),
            jwt_secret,
            store_timeout,
            claims,
            privileged_roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<GrantGateConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GrantGateConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database_url, None);
        assert_eq!(config.jwt_secret, "dev-secret");
        assert_eq!(config.store_timeout, DEFAULT_STORE_TIMEOUT);
        assert_eq!(config.claims, ClaimMapping::default());
        assert!(config.privileged_roles.is_empty());
    }

    #[test]
    fn overrides() {
        let config = load(&[
            (BIND_ADDR, "127.0.0.1:9000"),
            (DATABASE_URL, "postgres://localhost/grants"),
            (JWT_SECRET, "s3cret"),
            (STORE_TIMEOUT_MS, "250"),
            (USER_ID_CLAIM, "uid"),
            (ROLE_CLAIM, "roles"),
            (PRIVILEGED_ROLES, "Admin, SuperUser"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/grants"));
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(config.claims.user_id_claim, "uid");
        assert_eq!(config.claims.role_claim, "roles");
        assert_eq!(config.privileged_roles, vec![Role::new("Admin"), Role::new("SuperUser")]);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[(DATABASE_URL, "  "), (USER_ID_CLAIM, "")]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.claims.user_id_claim, "sub");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            load(&[(STORE_TIMEOUT_MS, "soon")]),
            Err(ConfigError::Invalid { key: STORE_TIMEOUT_MS, .. })
        ));
        assert!(matches!(
            load(&[(STORE_TIMEOUT_MS, "0")]),
            Err(ConfigError::Invalid { key: STORE_TIMEOUT_MS, .. })
        ));
        assert!(matches!(
            load(&[(BIND_ADDR, "localhost")]),
            Err(ConfigError::Invalid { key: BIND_ADDR, .. })
        ));
    }
}
