use super::{GrantStore, GrantStoreError, PersistedGrant};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local grant store, grants keyed by their handle
#[derive(Clone, Default)]
pub struct InMemoryGrantStore {
    grants: Arc<RwLock<HashMap<String, PersistedGrant>>>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn list_grants(&self, client_id: &str) -> Result<Vec<PersistedGrant>, GrantStoreError> {
        let grants = self.grants.read().await;
        let mut matching: Vec<PersistedGrant> = grants
            .values()
            .filter(|grant| grant.client_id == client_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.key.cmp(&b.key)));
        Ok(matching)
    }

    async fn delete_grants(&self, grants: &[PersistedGrant]) -> Result<(), GrantStoreError> {
        let mut stored = self.grants.write().await;
        for grant in grants {
            stored.remove(&grant.key);
        }
        Ok(())
    }

    #[cfg(test)]
    async fn store_grant(&self, grant: PersistedGrant) -> Result<(), GrantStoreError> {
        self.grants.write().await.insert(grant.key.clone(), grant);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
