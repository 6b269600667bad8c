//! Access token lifecycle with at most one live grant per client
//!
//! Every token request for a client revokes the grants that client held
//! before the request, so a client never has more than one working token.
//! Revocation happens only after the authority issued the new token: a failed
//! exchange leaves the existing session untouched.

use crate::grants::{GrantStore, GrantStoreError};
use crate::identity::{AuthorityClient, AuthorityError, DiscoveryCache, IssuedToken};
use crate::models::{ApiResult, TokenRequestResult};
use log::{error, info};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while requesting or revoking access tokens
#[derive(Debug, Error)]
pub enum TokenLifecycleError {
    #[error("Cannot request token with invalid 'clientId' parameter.")]
    InvalidClientId,
    #[error("Cannot request token with invalid 'clientSecret' parameter.")]
    InvalidClientSecret,
    #[error("Cannot revoke token with invalid 'clientId' parameter.")]
    InvalidRevokeClientId,
    #[error("Failed to discover the identity authority: {0}")]
    Discovery(Arc<AuthorityError>),
    #[error("Failed to request a token for client id '{client_id}': {source}.")]
    Exchange {
        client_id: String,
        source: AuthorityError,
    },
    #[error("Client '{0}' has no access token to revoke.")]
    NothingToRevoke(String),
    #[error("Failed to access persisted grants: {0}")]
    GrantStore(#[from] GrantStoreError),
}

/// Issues and revokes access tokens for clients
#[derive(Clone)]
pub struct TokenLifecycleManager {
    discovery: DiscoveryCache,
    authority: Arc<dyn AuthorityClient>,
    grants: Arc<dyn GrantStore>,
    admin_client_id: String,
}

impl TokenLifecycleManager {
    pub fn new(
        discovery: DiscoveryCache,
        authority: Arc<dyn AuthorityClient>,
        grants: Arc<dyn GrantStore>,
        admin_client_id: impl Into<String>,
    ) -> Self {
        Self {
            discovery,
            authority,
            grants,
            admin_client_id: admin_client_id.into(),
        }
    }

    /// Requests a new token for a client and revokes the grants it held before
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<IssuedToken, TokenLifecycleError> {
        if client_id.trim().is_empty() {
            return Err(TokenLifecycleError::InvalidClientId);
        }
        if client_secret.trim().is_empty() {
            return Err(TokenLifecycleError::InvalidClientSecret);
        }

        let discovery = self
            .discovery
            .get_discovery()
            .await
            .map_err(TokenLifecycleError::Discovery)?;

        // Snapshot before the exchange, the authority persists the new grant
        // while issuing it and that one must survive.
        let previous_grants = self.grants.list_grants(client_id).await?;

        info!("Requesting a new token for client {}", client_id);
        let token = match self
            .authority
            .exchange_client_credentials(&discovery.token_endpoint, client_id, client_secret)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                error!("Token request failed for client {} with error: {}", client_id, e);
                return Err(TokenLifecycleError::Exchange {
                    client_id: client_id.to_string(),
                    source: e,
                });
            }
        };

        if !previous_grants.is_empty() {
            // The new token is already live, a failed cleanup leaves stale
            // grants for the next request or revoke of this client.
            match self.grants.delete_grants(&previous_grants).await {
                Ok(()) => info!(
                    "Revoked {} previous grants of client {}",
                    previous_grants.len(),
                    client_id
                ),
                Err(e) => error!(
                    "Failed to revoke {} previous grants of client {}: {}",
                    previous_grants.len(),
                    client_id,
                    e
                ),
            }
        }

        info!(
            "Successfully created new {} token for client {} with scopes {}, expiring in {}",
            token.token_type,
            client_id,
            token.scope.as_deref().unwrap_or(""),
            token
                .expires_in
                .map_or_else(|| "an unknown time".to_string(), |secs| format!("{}s", secs))
        );
        Ok(token)
    }

    /// Requests a new token for the administrative client
    pub async fn request_admin_token(
        &self,
        client_secret: &str,
    ) -> Result<IssuedToken, TokenLifecycleError> {
        self.request_token(&self.admin_client_id, client_secret).await
    }

    /// Revokes every grant of a client, returning how many were revoked
    pub async fn revoke_token(&self, client_id: &str) -> Result<usize, TokenLifecycleError> {
        if client_id.trim().is_empty() {
            return Err(TokenLifecycleError::InvalidRevokeClientId);
        }

        let grants = self.grants.list_grants(client_id).await?;
        if grants.is_empty() {
            return Err(TokenLifecycleError::NothingToRevoke(client_id.to_string()));
        }

        self.grants.delete_grants(&grants).await?;
        info!("Revoked access token for client {}", client_id);
        Ok(grants.len())
    }
}

impl From<Result<IssuedToken, TokenLifecycleError>> for TokenRequestResult {
    fn from(result: Result<IssuedToken, TokenLifecycleError>) -> Self {
        match result {
            Ok(token) => Self {
                success: true,
                token: Some(token.access_token),
                token_type: Some(token.token_type),
                scope: token.scope,
                error: None,
            },
            Err(e) => Self::from_error(e),
        }
    }
}

impl From<Result<usize, TokenLifecycleError>> for ApiResult {
    fn from(result: Result<usize, TokenLifecycleError>) -> Self {
        match result {
            Ok(_) => Self::from_success(),
            Err(e) => Self::from_error(e),
        }
    }
}
