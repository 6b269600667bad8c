use crate::config::SpyglassConfig;
use crate::grants::{GrantRegistry, GrantStore};
use crate::identity::{AuthorityClient, DiscoveryCache, HttpAuthorityClient};
use crate::tickets::MaintainerTicketService;
use crate::tokens::TokenLifecycleManager;
use log::error;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SpyglassConfig>,
    pub grants: Arc<GrantRegistry>,
    pub discovery: DiscoveryCache,
    pub authority: Arc<dyn AuthorityClient>,
    pub tokens: Arc<TokenLifecycleManager>,
    pub tickets: Arc<MaintainerTicketService>,
}

impl AppState {
    /// Creates the application state around an already connected grant store
    pub fn new(config: &SpyglassConfig, grants: GrantRegistry) -> Result<Self, std::io::Error> {
        let authority = HttpAuthorityClient::new(&config.identity).map_err(|e| {
            std::io::Error::other(format!("Failed to create authority client: {}", e))
        })?;
        Self::with_authority(config, grants, Arc::new(authority))
    }

    /// Creates the application state with a given authority client
    pub fn with_authority(
        config: &SpyglassConfig,
        grants: GrantRegistry,
        authority: Arc<dyn AuthorityClient>,
    ) -> Result<Self, std::io::Error> {
        let discovery_url = config.identity.discovery_url().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid authority URL '{}': {}", config.identity.authority_url, e),
            )
        })?;

        let grants = Arc::new(grants);
        let discovery = DiscoveryCache::new(authority.clone(), discovery_url.as_str());
        let tokens = TokenLifecycleManager::new(
            discovery.clone(),
            authority.clone(),
            grants.clone(),
            config.identity.admin_client_id.clone(),
        );

        Ok(Self {
            config: Arc::new(config.clone()),
            grants,
            discovery,
            authority,
            tokens: Arc::new(tokens),
            tickets: Arc::new(MaintainerTicketService::new(&config.tickets)),
        })
    }

    #[cfg(test)]
    pub fn for_testing(config: &SpyglassConfig) -> Self {
        use crate::grants::memory::InMemoryGrantStore;

        Self::new(config, GrantRegistry::InMemory(InMemoryGrantStore::new()))
            .expect("Failed to create test state")
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> bool {
        match self.grants.health_check().await {
            Ok(()) => true,
            Err(e) => {
                error!("Grant store is unhealthy: {}", e);
                false
            }
        }
    }
}
