//! Integration with the external OAuth2 identity authority
//!
//! Spyglass never signs or stores access tokens itself. It talks to a
//! standards-compliant authority for three things:
//! - the discovery document, resolved once per process by [`DiscoveryCache`]
//! - client credentials exchanges (RFC 6749 Section 4.4)
//! - token introspection (RFC 7662) for the administrative routes

pub mod client;
pub mod discovery;

pub use client::HttpAuthorityClient;
pub use discovery::DiscoveryCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the identity authority or while talking to it
#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Discovery failed: {0}")]
    Discovery(String),
    #[error("{0}")]
    Rejected(String),
    #[error("Introspection is not supported by the authority")]
    IntrospectionUnsupported,
}

/// The subset of the OpenID Connect discovery document Spyglass reads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryDocument {
    /// Issuer identifier of the authority
    #[serde(default)]
    pub issuer: String,
    /// Token endpoint used for client credentials exchanges
    pub token_endpoint: String,
    /// Introspection endpoint used to check bearer tokens
    #[serde(default)]
    pub introspection_endpoint: Option<String>,
}

/// An access token issued by the authority
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Error body returned by the token endpoint (RFC 6749 Section 5.2)
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenErrorBody {
    pub(crate) fn into_message(self) -> String {
        match self.error_description {
            Some(description) if !description.is_empty() => {
                format!("{}: {}", self.error, description)
            }
            _ => self.error,
        }
    }
}

/// Scope claim as returned by introspection, either space separated or a list
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ScopeClaim {
    Spaced(String),
    List(Vec<String>),
}

impl ScopeClaim {
    pub fn contains(&self, scope: &str) -> bool {
        match self {
            Self::Spaced(scopes) => scopes.split_whitespace().any(|s| s == scope),
            Self::List(scopes) => scopes.iter().any(|s| s == scope),
        }
    }
}

/// Token introspection response (RFC 7662 Section 2.2)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Introspection {
    pub active: bool,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub scope: Option<ScopeClaim>,
}

impl Introspection {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.as_ref().is_some_and(|s| s.contains(scope))
    }
}

/// Calls made against the identity authority.
///
/// Implementations must be thread-safe, a single instance is shared by every
/// request handler.
#[async_trait]
pub trait AuthorityClient: Send + Sync {
    /// Fetch the discovery document at the given URL
    async fn fetch_discovery(&self, discovery_url: &str)
        -> Result<DiscoveryDocument, AuthorityError>;

    /// Exchange a client id and secret for an access token
    async fn exchange_client_credentials(
        &self,
        token_endpoint: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<IssuedToken, AuthorityError>;

    /// Introspect a bearer token, authenticating as the given API resource
    async fn introspect(
        &self,
        introspection_endpoint: &str,
        api_resource: &str,
        api_secret: &str,
        token: &str,
    ) -> Result<Introspection, AuthorityError>;
}
