//! Infrastructure layer: grant-store adapters and configuration.

pub mod config;
pub mod grant_store;

pub use config::{ConfigError, GrantGateConfig};
pub use grant_store::{InMemoryGrantStore, PostgresGrantStore};
