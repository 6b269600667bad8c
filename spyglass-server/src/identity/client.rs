use super::{
    AuthorityClient, AuthorityError, DiscoveryDocument, Introspection, IssuedToken,
    TokenErrorBody,
};
use crate::config::IdentityConfig;
use async_trait::async_trait;
use http::header::ACCEPT;
use http::{HeaderMap, HeaderValue};
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// [`AuthorityClient`] talking to the identity authority over HTTP
#[derive(Clone)]
pub struct HttpAuthorityClient {
    client: Client,
}

impl HttpAuthorityClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, AuthorityError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.client_timeout))
            .connect_timeout(Duration::from_secs(2))
            .default_headers(headers)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?;

        Ok(Self { client })
    }

    /// Maps a non-success token endpoint response to a rejection carrying the
    /// upstream error detail
    async fn rejection(response: reqwest::Response) -> AuthorityError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<TokenErrorBody>(&body) {
            Ok(error) => AuthorityError::Rejected(error.into_message()),
            Err(_) if body.is_empty() => AuthorityError::Rejected(status.to_string()),
            Err(_) => AuthorityError::Rejected(format!("{}: {}", status, body)),
        }
    }
}

#[async_trait]
impl AuthorityClient for HttpAuthorityClient {
    async fn fetch_discovery(
        &self,
        discovery_url: &str,
    ) -> Result<DiscoveryDocument, AuthorityError> {
        debug!("Fetching discovery document from {}", discovery_url);

        let response = self.client.get(discovery_url).send().await?;
        if !response.status().is_success() {
            return Err(AuthorityError::Discovery(format!(
                "authority returned {} for {}",
                response.status(),
                discovery_url
            )));
        }

        response
            .json::<DiscoveryDocument>()
            .await
            .map_err(|e| AuthorityError::Discovery(format!("invalid discovery document: {}", e)))
    }

    async fn exchange_client_credentials(
        &self,
        token_endpoint: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<IssuedToken, AuthorityError> {
        let response = self
            .client
            .post(token_endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(response.json::<IssuedToken>().await?)
    }

    async fn introspect(
        &self,
        introspection_endpoint: &str,
        api_resource: &str,
        api_secret: &str,
        token: &str,
    ) -> Result<Introspection, AuthorityError> {
        let response = self
            .client
            .post(introspection_endpoint)
            .basic_auth(api_resource, Some(api_secret))
            .form(&[("token", token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(response.json::<Introspection>().await?)
    }
}
