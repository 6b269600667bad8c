use crate::errors::ApiError;
use crate::identity::AuthorityError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::HeaderMap;
use log::{error, warn};

/// Identity of the caller, as introspected from its bearer token
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientIdentity {
    pub client_id: Option<String>,
}

/// Extracts the token of a `Bearer` Authorization header
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let header = header.to_str().map_err(|e| {
        warn!("Failed to parse Authorization header to string: {}", e);
        ApiError::unauthorized("Invalid Authorization header")
    })?;

    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => {
            warn!("Invalid Authorization header format, expected a bearer token");
            Err(ApiError::unauthorized("Invalid Authorization header"))
        }
    }
}

/// Admits requests whose bearer token is active and carries the required scope
pub(super) async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => {
            warn!("Authentication failed: {}", e.detail);
            return e.into_response();
        }
    };

    let discovery = match state.discovery.get_discovery().await {
        Ok(discovery) => discovery,
        Err(e) => {
            return ApiError::bad_gateway(format!("Identity authority unavailable: {}", e))
                .into_response();
        }
    };
    let Some(introspection_endpoint) = discovery.introspection_endpoint else {
        error!("Identity authority does not advertise an introspection endpoint");
        return ApiError::bad_gateway(AuthorityError::IntrospectionUnsupported).into_response();
    };

    let identity = &state.config.identity;
    let introspection = match state
        .authority
        .introspect(
            &introspection_endpoint,
            &identity.api_resource,
            &identity.api_secret,
            &token,
        )
        .await
    {
        Ok(introspection) => introspection,
        Err(e) => {
            error!("Token introspection failed: {}", e);
            return ApiError::bad_gateway(format!("Token introspection failed: {}", e))
                .into_response();
        }
    };

    if !introspection.active {
        warn!("Authentication failed: inactive access token");
        return ApiError::unauthorized("Invalid or expired access token").into_response();
    }
    if !introspection.has_scope(&identity.required_scope) {
        warn!(
            "Authorization failed: client {} lacks the '{}' scope",
            introspection.client_id.as_deref().unwrap_or("<unknown>"),
            identity.required_scope
        );
        return ApiError::forbidden(format!(
            "Access token lacks the '{}' scope",
            identity.required_scope
        ))
        .into_response();
    }

    request.extensions_mut().insert(ClientIdentity {
        client_id: introspection.client_id,
    });
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpyglassConfig;
    use crate::test_utils::{mount_discovery, mount_introspection};
    use axum::routing::get;
    use axum::{Extension, Router};
    use http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::MockServer;

    const TEST_ROUTE: &str = "/test";

    async fn caller_client_id(Extension(identity): Extension<ClientIdentity>) -> String {
        identity.client_id.unwrap_or_default()
    }

    /// Helper function to set up a mock app with authentication middleware
    async fn setup_authn_mock_app(authority: &MockServer) -> Router {
        let config = SpyglassConfig::for_test_with_mocks(authority);
        let state = AppState::for_testing(&config);

        Router::new()
            .route(TEST_ROUTE, get(caller_client_id))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            ))
            .with_state(state)
    }

    /// Helper function to build a request with optional authorization header
    async fn send_request(app: &Router, auth_header: Option<&str>) -> (StatusCode, String) {
        let mut request_builder = Request::builder().uri(TEST_ROUTE);

        if let Some(auth) = auth_header {
            request_builder = request_builder.header("Authorization", auth);
        }

        let request = request_builder
            .body(Body::empty())
            .expect("Failed to build request");

        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let body = String::from_utf8(body_bytes.to_vec())
            .expect("Failed to convert response body to string");

        (status, body)
    }

    fn error_of(body: &str) -> Value {
        serde_json::from_str::<Value>(body).expect("Failed to parse error body")["error"].clone()
    }

    #[tokio::test]
    async fn test_admin_token_is_admitted() {
        let authority = MockServer::start().await;
        mount_discovery(&authority).await;
        mount_introspection(
            &authority,
            "admin-token",
            json!({ "active": true, "client_id": "maintainer", "scope": "admin maintainer" }),
        )
        .await;

        let app = setup_authn_mock_app(&authority).await;
        let (status, body) = send_request(&app, Some("Bearer admin-token")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "maintainer");
    }

    #[tokio::test]
    async fn test_scope_list_is_accepted() {
        let authority = MockServer::start().await;
        mount_discovery(&authority).await;
        mount_introspection(
            &authority,
            "admin-token",
            json!({ "active": true, "client_id": "maintainer", "scope": ["players", "admin"] }),
        )
        .await;

        let app = setup_authn_mock_app(&authority).await;
        let (status, _) = send_request(&app, Some("bearer admin-token")).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_authorization_header() {
        let authority = MockServer::start().await;
        let app = setup_authn_mock_app(&authority).await;
        let (status, body) = send_request(&app, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(&body), "401: Missing Authorization header");
    }

    #[tokio::test]
    async fn test_invalid_authorization_format() {
        let authority = MockServer::start().await;
        let app = setup_authn_mock_app(&authority).await;

        for header in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer   "] {
            let (status, body) = send_request(&app, Some(header)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", header);
            assert_eq!(error_of(&body), "401: Invalid Authorization header");
        }
    }

    #[tokio::test]
    async fn test_inactive_token_is_rejected() {
        let authority = MockServer::start().await;
        mount_discovery(&authority).await;
        mount_introspection(&authority, "revoked-token", json!({ "active": false })).await;

        let app = setup_authn_mock_app(&authority).await;
        let (status, body) = send_request(&app, Some("Bearer revoked-token")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(&body), "401: Invalid or expired access token");
    }

    #[tokio::test]
    async fn test_missing_scope_is_forbidden() {
        let authority = MockServer::start().await;
        mount_discovery(&authority).await;
        mount_introspection(
            &authority,
            "server-token",
            json!({ "active": true, "client_id": "game-server", "scope": "trusted_server" }),
        )
        .await;

        let app = setup_authn_mock_app(&authority).await;
        let (status, body) = send_request(&app, Some("Bearer server-token")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_of(&body), "403: Access token lacks the 'admin' scope");
    }

    #[tokio::test]
    async fn test_unreachable_authority() {
        let authority = MockServer::start().await;
        // No discovery mounted, the authority answers 404
        let app = setup_authn_mock_app(&authority).await;
        let (status, _) = send_request(&app, Some("Bearer admin-token")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
