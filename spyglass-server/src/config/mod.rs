pub(crate) use crate::config::grants::{GrantStoreConfig, GrantStoreKind};
pub(crate) use crate::config::identity::IdentityConfig;
pub(crate) use crate::config::tickets::TicketConfig;
use confique::Config;

pub mod grants;
pub mod identity;
pub mod tickets;

/// Optional configuration file, read when present next to the binary
pub const CONFIG_FILE: &str = "spyglass.toml";

/// Main configuration structure for the Spyglass server
#[derive(Debug, Config, Clone)]
pub struct SpyglassConfig {
    /// The port the Spyglass server will listen to (default: 7000)
    #[config(env = "SPYGLASS_PORT", default = 7000)]
    pub port: u16,

    /// Identity authority configuration
    #[config(nested)]
    pub identity: IdentityConfig,

    /// Maintainer ticket configuration
    #[config(nested)]
    pub tickets: TicketConfig,

    /// Persisted grant store configuration
    #[config(nested)]
    pub grants: GrantStoreConfig,
}

impl SpyglassConfig {
    /// Loads the configuration from environment variables, then the optional
    /// config file, then the defaults
    pub fn new() -> Result<Self, confique::Error> {
        Self::builder().env().file(CONFIG_FILE).load()
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(authority_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            identity: IdentityConfig {
                authority_url: authority_mock.uri(),
                admin_client_id: "spyglass-admin".to_string(),
                api_resource: "privileged".to_string(),
                api_secret: "test-api-secret".to_string(),
                required_scope: "admin".to_string(),
                client_timeout: 5,
            },
            tickets: TicketConfig {
                ttl: 180,
                token_bytes: 16,
            },
            grants: GrantStoreConfig {
                store: "in-memory".to_string(),
                redis_url: "".to_string(),
            },
        }
    }
}
