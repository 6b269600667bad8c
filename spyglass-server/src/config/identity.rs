//! Identity authority configuration

use confique::Config;

/// Configuration for the OAuth2 identity authority Spyglass delegates to
#[derive(Debug, Config, Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity authority (default: https://localhost:5001)
    #[config(env = "SPYGLASS_IDENTITY_AUTHORITY_URL", default = "https://localhost:5001")]
    pub authority_url: String,

    /// Well-known client id used for Spyglass administration (default: spyglass-admin)
    #[config(env = "SPYGLASS_IDENTITY_ADMIN_CLIENT_ID", default = "spyglass-admin")]
    pub admin_client_id: String,

    /// API resource name used to authenticate against the introspection endpoint
    /// (default: privileged)
    #[config(env = "SPYGLASS_IDENTITY_API_RESOURCE", default = "privileged")]
    pub api_resource: String,

    /// API resource secret used to authenticate against the introspection endpoint
    #[config(env = "SPYGLASS_IDENTITY_API_SECRET", default = "")]
    pub api_secret: String,

    /// Scope a bearer token must carry to access administrative routes (default: admin)
    #[config(env = "SPYGLASS_IDENTITY_REQUIRED_SCOPE", default = "admin")]
    pub required_scope: String,

    /// The timeout for identity authority requests in seconds (default: 10)
    #[config(env = "SPYGLASS_IDENTITY_CLIENT_TIMEOUT", default = 10)]
    pub client_timeout: u64,
}

impl IdentityConfig {
    /// Returns the discovery document URL of the configured authority
    pub fn discovery_url(&self) -> Result<url::Url, url::ParseError> {
        let base = url::Url::parse(&self.authority_url)?;
        url::Url::parse(&format!(
            "{}/.well-known/openid-configuration",
            base.as_str().trim_end_matches('/')
        ))
    }
}
