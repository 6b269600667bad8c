use crate::config::SpyglassConfig;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Bearer token the fixture presents on admin requests
pub const ADMIN_BEARER: &str = "test-admin-token";

/// Mounts a discovery document pointing at `/connect/token` and
/// `/connect/introspect` on the mock authority
pub async fn mount_discovery(authority: &MockServer) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": authority.uri(),
            "token_endpoint": format!("{}/connect/token", authority.uri()),
            "introspection_endpoint": format!("{}/connect/introspect", authority.uri()),
        })))
        .mount(authority)
        .await;
}

/// Mounts an introspection response for one bearer token
pub async fn mount_introspection(authority: &MockServer, token: &str, response: Value) {
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/connect/introspect"))
        .and(matchers::body_string_contains(format!("token={}", token)))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(authority)
        .await;
}

/// Test fixture for setting up a complete test environment with a mocked
/// identity authority.
///
/// The authority serves a discovery document from the start. Admin
/// introspection and token endpoint responses are mounted per test.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     fixture.mount_admin_introspection().await;
///
///     let response = fixture.get_as_admin("/admin/revoke_token?clientId=maintainer").await;
///
///     let result = response.assert_ok().json_as::<ApiResult>();
///     assert!(!result.success);
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// State shared with the router, to seed and inspect grants and tickets
    pub state: AppState,
    /// Configuration settings
    pub config: SpyglassConfig,
    /// Mock server for the identity authority
    pub authority_mock: MockServer,
}

impl TestFixture {
    /// Creates a new test fixture with a mock identity authority
    pub async fn new() -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let authority_mock = MockServer::start().await;
        mount_discovery(&authority_mock).await;

        let config = SpyglassConfig::for_test_with_mocks(&authority_mock);
        let state = AppState::for_testing(&config);
        let app = create_app(state.clone()).await;

        Self {
            app,
            state,
            config,
            authority_mock,
        }
    }

    /// Initializes the test logger with the given level.
    ///
    /// Called by `TestFixture::new()` with the debug level, later calls are
    /// no-ops.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Lets [`ADMIN_BEARER`] through the admin middleware as client `maintainer`
    pub async fn mount_admin_introspection(&self) {
        mount_introspection(
            &self.authority_mock,
            ADMIN_BEARER,
            json!({ "active": true, "client_id": "maintainer", "scope": "admin" }),
        )
        .await;
    }

    /// Sends an anonymous GET request to the specified URI
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a GET request carrying [`ADMIN_BEARER`]
    pub async fn get_as_admin(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .header("Authorization", format!("Bearer {}", ADMIN_BEARER))
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| json!({}))
        } else {
            json!({})
        };

        TestResponse { status, json }
    }
}

/// Response from a test request that provides convenient access to status and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let fixture = TestFixture::new().await;
        fixture.get("/does-not-exist").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scalar_docs_are_served() {
        let fixture = TestFixture::new().await;
        fixture.get("/scalar").await.assert_ok();
    }
}
