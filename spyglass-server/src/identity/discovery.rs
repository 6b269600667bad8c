use super::{AuthorityClient, AuthorityError, DiscoveryDocument};
use log::{error, info};
use moka::future::Cache as MokaCache;
use std::sync::Arc;

/// Caches the authority's discovery document for the lifetime of the process.
///
/// The document is fetched on first use. Callers arriving while the fetch is
/// in flight wait for that same fetch and receive its outcome. A failed fetch
/// is not cached, so the next call fetches again.
#[derive(Clone)]
pub struct DiscoveryCache {
    authority: Arc<dyn AuthorityClient>,
    discovery_url: String,
    document: MokaCache<(), DiscoveryDocument>,
}

impl DiscoveryCache {
    pub fn new(authority: Arc<dyn AuthorityClient>, discovery_url: impl Into<String>) -> Self {
        Self {
            authority,
            discovery_url: discovery_url.into(),
            document: MokaCache::new(1),
        }
    }

    /// Returns the discovery document, fetching it if it was never resolved
    pub async fn get_discovery(&self) -> Result<DiscoveryDocument, Arc<AuthorityError>> {
        self.document
            .try_get_with((), async {
                let result = self.authority.fetch_discovery(&self.discovery_url).await;
                match &result {
                    Ok(document) => info!(
                        "Discovered token endpoint {} for authority {}",
                        document.token_endpoint, self.discovery_url
                    ),
                    Err(e) => error!(
                        "Failed to fetch discovery document from {}: {}",
                        self.discovery_url, e
                    ),
                }
                result
            })
            .await
    }
}
