//! Access token administration
//!
//! Every route replies 200 with a result body; failures are reported through
//! `success` and `error`.

use crate::models::{ApiResult, TokenRequestResult};
use crate::openapi::ADMIN_TAG;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestTokenQuery {
    /// Client to issue a token for
    #[serde(default)]
    pub client_id: String,
    /// Secret of the client
    #[serde(default)]
    pub client_secret: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestAdminTokenQuery {
    /// Secret of the administrative client
    #[serde(default)]
    pub client_secret: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RevokeTokenQuery {
    /// Client whose tokens are revoked
    #[serde(default)]
    pub client_id: String,
}

/// Issues a new token for a client and revokes the tokens it held before
#[utoipa::path(
    get,
    path = "/admin/request_token",
    tag = ADMIN_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token with the admin scope"),
        RequestTokenQuery
    ),
    responses(
        (status = 200, description = "Token request completed", body = TokenRequestResult),
        (status = 401, description = "Missing or invalid bearer token", body = ApiResult),
        (status = 403, description = "Bearer token lacks the admin scope", body = ApiResult)
    )
)]
pub(crate) async fn request_token(
    State(state): State<AppState>,
    Query(query): Query<RequestTokenQuery>,
) -> Json<TokenRequestResult> {
    let result = state
        .tokens
        .request_token(&query.client_id, &query.client_secret)
        .await;
    Json(result.into())
}

/// Issues a new token for the administrative client.
///
/// Open to anonymous callers, the secret is the only check.
#[utoipa::path(
    get,
    path = "/admin/request_admin_token",
    tag = ADMIN_TAG,
    params(RequestAdminTokenQuery),
    responses(
        (status = 200, description = "Token request completed", body = TokenRequestResult)
    )
)]
pub(crate) async fn request_admin_token(
    State(state): State<AppState>,
    Query(query): Query<RequestAdminTokenQuery>,
) -> Json<TokenRequestResult> {
    let result = state.tokens.request_admin_token(&query.client_secret).await;
    Json(result.into())
}

/// Revokes every token of a client
#[utoipa::path(
    get,
    path = "/admin/revoke_token",
    tag = ADMIN_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token with the admin scope"),
        RevokeTokenQuery
    ),
    responses(
        (status = 200, description = "Revocation completed", body = ApiResult),
        (status = 401, description = "Missing or invalid bearer token", body = ApiResult),
        (status = 403, description = "Bearer token lacks the admin scope", body = ApiResult)
    )
)]
pub(crate) async fn revoke_token(
    State(state): State<AppState>,
    Query(query): Query<RevokeTokenQuery>,
) -> Json<ApiResult> {
    let result = state.tokens.revoke_token(&query.client_id).await;
    Json(result.into())
}

#[cfg(test)]
mod tests {
    use crate::grants::{GrantStore, PersistedGrant};
    use crate::models::{ApiResult, TokenRequestResult};
    use crate::test_utils::TestFixture;
    use serde_json::json;
    use wiremock::{matchers, Mock, ResponseTemplate};

    async fn mount_token_endpoint(fixture: &TestFixture, client_id: &str, access_token: &str) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/connect/token"))
            .and(matchers::body_string_contains(format!("client_id={}", client_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "admin"
            })))
            .mount(&fixture.authority_mock)
            .await;
    }

    #[tokio::test]
    async fn test_request_token_revokes_previous_grants() {
        let fixture = TestFixture::new().await;
        fixture.mount_admin_introspection().await;
        mount_token_endpoint(&fixture, "maintainer", "new-token").await;
        fixture
            .state
            .grants
            .store_grant(PersistedGrant::reference_token("old-grant", "maintainer"))
            .await
            .unwrap();

        let response = fixture
            .get_as_admin("/admin/request_token?clientId=maintainer&clientSecret=secret")
            .await;

        let result = response.assert_ok().json_as::<TokenRequestResult>();
        assert!(result.success);
        assert_eq!(result.token.as_deref(), Some("new-token"));
        assert_eq!(result.token_type.as_deref(), Some("Bearer"));
        assert_eq!(result.scope.as_deref(), Some("admin"));
        assert!(fixture
            .state
            .grants
            .list_grants("maintainer")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_request_token_requires_admin() {
        let fixture = TestFixture::new().await;

        let response = fixture
            .get("/admin/request_token?clientId=maintainer&clientSecret=secret")
            .await;

        response.assert_status(http::StatusCode::UNAUTHORIZED);
        assert_eq!(response.json["success"], false);
    }

    #[tokio::test]
    async fn test_request_token_missing_secret() {
        let fixture = TestFixture::new().await;
        fixture.mount_admin_introspection().await;

        let response = fixture
            .get_as_admin("/admin/request_token?clientId=maintainer")
            .await;

        let result = response.assert_ok().json_as::<TokenRequestResult>();
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Cannot request token with invalid 'clientSecret' parameter.")
        );
    }

    #[tokio::test]
    async fn test_request_token_upstream_rejection() {
        let fixture = TestFixture::new().await;
        fixture.mount_admin_introspection().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/connect/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_client"
            })))
            .mount(&fixture.authority_mock)
            .await;

        let response = fixture
            .get_as_admin("/admin/request_token?clientId=maintainer&clientSecret=wrong")
            .await;

        let result = response.assert_ok().json_as::<TokenRequestResult>();
        assert!(!result.success);
        assert!(result.token.is_none());
        assert_eq!(
            result.error.as_deref(),
            Some("Failed to request a token for client id 'maintainer': invalid_client.")
        );
    }

    #[tokio::test]
    async fn test_request_admin_token_is_anonymous() {
        let fixture = TestFixture::new().await;
        mount_token_endpoint(&fixture, "spyglass-admin", "admin-token").await;

        let response = fixture
            .get("/admin/request_admin_token?clientSecret=admin-secret")
            .await;

        let result = response.assert_ok().json_as::<TokenRequestResult>();
        assert!(result.success);
        assert_eq!(result.token.as_deref(), Some("admin-token"));
    }

    #[tokio::test]
    async fn test_revoke_token() {
        let fixture = TestFixture::new().await;
        fixture.mount_admin_introspection().await;
        fixture
            .state
            .grants
            .store_grant(PersistedGrant::reference_token("grant", "maintainer"))
            .await
            .unwrap();

        let response = fixture.get_as_admin("/admin/revoke_token?clientId=maintainer").await;
        assert_eq!(
            response.assert_ok().json_as::<ApiResult>(),
            ApiResult::from_success()
        );

        let response = fixture.get_as_admin("/admin/revoke_token?clientId=maintainer").await;
        assert_eq!(
            response.assert_ok().json_as::<ApiResult>(),
            ApiResult::from_error("Client 'maintainer' has no access token to revoke.")
        );
    }

    #[tokio::test]
    async fn test_revoke_token_missing_client_id() {
        let fixture = TestFixture::new().await;
        fixture.mount_admin_introspection().await;

        let response = fixture.get_as_admin("/admin/revoke_token").await;
        assert_eq!(
            response.assert_ok().json_as::<ApiResult>(),
            ApiResult::from_error("Cannot revoke token with invalid 'clientId' parameter.")
        );
    }
}
