use crate::config::{GrantStoreKind, SpyglassConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod redis;

/// Errors that can occur during grant store operations
#[derive(Debug, Error)]
pub enum GrantStoreError {
    #[error("Failed to encode grant: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Authorization-server-side record of an issued access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedGrant {
    /// Unique handle of the grant
    pub key: String,
    /// Client the grant was issued to
    pub client_id: String,
    /// Grant type, e.g. "reference_token"
    pub grant_type: String,
    /// Subject the grant was issued for, absent for client credentials grants
    #[serde(default)]
    pub subject_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PersistedGrant {
    /// Creates a reference token grant for a client, issued now
    #[cfg(test)]
    pub fn reference_token(key: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            client_id: client_id.into(),
            grant_type: "reference_token".to_string(),
            subject_id: None,
            created_at: Utc::now(),
            expires_at: None,
        }
    }
}

/// Interface of the persisted grant store.
///
/// The store is owned by the identity authority, Spyglass only reads grants
/// by client id and revokes them.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// List every grant currently persisted for a client
    async fn list_grants(&self, client_id: &str) -> Result<Vec<PersistedGrant>, GrantStoreError>;

    /// Delete exactly the given grants
    async fn delete_grants(&self, grants: &[PersistedGrant]) -> Result<(), GrantStoreError>;

    /// Persist a grant, the authority does this when issuing a token
    #[cfg(test)]
    async fn store_grant(&self, grant: PersistedGrant) -> Result<(), GrantStoreError>;

    /// Check connectivity to the backing store
    async fn health_check(&self) -> Result<(), String>;
}

/// Grant store selected at runtime from the configuration
#[derive(Clone)]
pub enum GrantRegistry {
    /// Process-local store, for development and tests
    InMemory(memory::InMemoryGrantStore),
    /// Redis store shared with the identity authority
    Redis(redis::RedisGrantStore),
}

#[async_trait]
impl GrantStore for GrantRegistry {
    async fn list_grants(&self, client_id: &str) -> Result<Vec<PersistedGrant>, GrantStoreError> {
        match self {
            Self::InMemory(store) => store.list_grants(client_id).await,
            Self::Redis(store) => store.list_grants(client_id).await,
        }
    }

    async fn delete_grants(&self, grants: &[PersistedGrant]) -> Result<(), GrantStoreError> {
        match self {
            Self::InMemory(store) => store.delete_grants(grants).await,
            Self::Redis(store) => store.delete_grants(grants).await,
        }
    }

    #[cfg(test)]
    async fn store_grant(&self, grant: PersistedGrant) -> Result<(), GrantStoreError> {
        match self {
            Self::InMemory(store) => store.store_grant(grant).await,
            Self::Redis(store) => store.store_grant(grant).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(store) => store.health_check().await,
            Self::Redis(store) => store.health_check().await,
        }
    }
}

/// Creates the grant store named by the configuration
pub async fn create_grant_registry(config: &SpyglassConfig) -> Result<GrantRegistry, GrantStoreError> {
    match config.grants.kind().map_err(GrantStoreError::Config)? {
        GrantStoreKind::InMemory => Ok(GrantRegistry::InMemory(memory::InMemoryGrantStore::new())),
        GrantStoreKind::Redis => {
            if config.grants.redis_url.is_empty() {
                return Err(GrantStoreError::Config(
                    "Redis URL is required for the Redis grant store".to_string(),
                ));
            }
            let store = redis::RedisGrantStore::new(&config.grants.redis_url)
                .await
                .map_err(GrantStoreError::Config)?;
            Ok(GrantRegistry::Redis(store))
        }
    }
}
