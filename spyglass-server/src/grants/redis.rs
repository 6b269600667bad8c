use super::{GrantStore, GrantStoreError, PersistedGrant};
use async_trait::async_trait;
use log::error;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::collections::BTreeMap;

const KEY_PREFIX: &str = "spyglass:grants";

/// Grants of a client live in one hash, keyed by grant handle
fn client_key(client_id: &str) -> String {
    format!("{}:{}", KEY_PREFIX, client_id)
}

#[derive(Clone)]
pub struct RedisGrantStore {
    _client: Client,
    conn_manager: ConnectionManager,
}

impl RedisGrantStore {
    /// Initialize a new Redis grant store instance
    pub async fn new(redis_url: &str) -> Result<Self, String> {
        let client = match Client::open(redis_url) {
            Ok(client) => client,
            Err(err) => {
                return Err(format!("Failed to connect to Redis: {}", err));
            }
        };

        let conn_manager = match ConnectionManager::new(client.clone()).await {
            Ok(manager) => manager,
            Err(err) => {
                return Err(format!(
                    "Failed to create Redis connection manager: {}",
                    err
                ));
            }
        };

        // Test the connection to ensure it's working
        let mut conn = conn_manager.clone();
        if let Err(err) = redis::cmd("PING").query_async::<String>(&mut conn).await {
            return Err(format!("Failed to ping Redis: {}", err));
        }

        Ok(Self {
            conn_manager,
            _client: client,
        })
    }
}

#[async_trait]
impl GrantStore for RedisGrantStore {
    async fn list_grants(&self, client_id: &str) -> Result<Vec<PersistedGrant>, GrantStoreError> {
        let mut conn = self.conn_manager.clone();

        let values: Vec<String> = match conn.hvals(client_key(client_id)).await {
            Ok(values) => values,
            Err(err) => {
                error!("Redis error while listing grants of {}: {}", client_id, err);
                return Err(GrantStoreError::Redis(err.to_string()));
            }
        };

        values
            .iter()
            .map(|value| {
                serde_json::from_str::<PersistedGrant>(value).map_err(GrantStoreError::from)
            })
            .collect()
    }

    async fn delete_grants(&self, grants: &[PersistedGrant]) -> Result<(), GrantStoreError> {
        if grants.is_empty() {
            return Ok(());
        }

        let mut by_client: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for grant in grants {
            by_client
                .entry(grant.client_id.as_str())
                .or_default()
                .push(grant.key.as_str());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (client_id, keys) in by_client {
            pipe.hdel(client_key(client_id), keys).ignore();
        }

        let mut conn = self.conn_manager.clone();
        match pipe.query_async::<()>(&mut conn).await {
            Ok(()) => Ok(()),
            Err(err) => {
                error!("Redis error while deleting {} grants: {}", grants.len(), err);
                Err(GrantStoreError::Redis(err.to_string()))
            }
        }
    }

    #[cfg(test)]
    async fn store_grant(&self, grant: PersistedGrant) -> Result<(), GrantStoreError> {
        let serialized = serde_json::to_string(&grant)?;
        let mut conn = self.conn_manager.clone();

        match conn
            .hset::<_, _, _, ()>(client_key(&grant.client_id), &grant.key, serialized)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                error!("Redis error while storing grant of {}: {}", grant.client_id, err);
                Err(GrantStoreError::Redis(err.to_string()))
            }
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        let mut conn = self.conn_manager.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => Ok(()),
            Err(err) => Err(format!("Redis health check failed: {}", err)),
        }
    }
}
