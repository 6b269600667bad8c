use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const ADMIN_TAG: &str = "Admin API";
pub(crate) const AUTHENTICATION_TAG: &str = "Authentication API";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health::health_check,
        crate::api::health::ready_check,
        crate::api::admin::request_token,
        crate::api::admin::request_admin_token,
        crate::api::admin::revoke_token,
        crate::api::authenticate::request_ticket,
        crate::api::authenticate::validate_ticket,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = ADMIN_TAG, description = "Access token administration endpoints"),
        (name = AUTHENTICATION_TAG, description = "Maintainer authentication ticket endpoints"),
    ),
    info(
        title = "Spyglass API",
        description = "Maintainer authentication and access token service",
        version = "1.0.0"
    )
)]
pub(crate) struct ApiDoc;
