use confique::Config;

/// Specifies which persisted grant store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantStoreKind {
    InMemory,
    Redis,
}

impl GrantStoreKind {
    /// Whether the store is shared with the identity authority. Only a shared
    /// store sees the grants the authority persists.
    pub fn is_shared(self) -> bool {
        matches!(self, Self::Redis)
    }
}

/// Configuration for the persisted grant store
#[derive(Debug, Config, Clone)]
pub struct GrantStoreConfig {
    /// Grant store type: "in-memory" or "redis" (default: in-memory)
    #[config(env = "SPYGLASS_GRANTS_STORE", default = "in-memory")]
    pub store: String,

    /// Redis connection string, required for the redis store
    #[config(env = "SPYGLASS_GRANTS_REDIS_URL", default = "")]
    pub redis_url: String,
}

impl GrantStoreConfig {
    /// Parses the configured store type
    pub fn kind(&self) -> Result<GrantStoreKind, String> {
        match self.store.trim().to_ascii_lowercase().as_str() {
            "in-memory" | "memory" => Ok(GrantStoreKind::InMemory),
            "redis" => Ok(GrantStoreKind::Redis),
            other => Err(format!(
                "Unknown grant store '{}', expected 'in-memory' or 'redis'",
                other
            )),
        }
    }
}
