pub(crate) mod admin;
pub(crate) mod authenticate;
mod authn_middleware;
pub(crate) mod health;

use crate::api::authn_middleware::authentication_middleware;
use crate::state::AppState;
use axum::{middleware, routing::get, Router};

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(anonymous_routes())
        .merge(protected_routes(state))
}

/// Routes open to callers without a bearer token
fn anonymous_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/request_admin_token",
            get(admin::request_admin_token),
        )
        .route(
            "/authenticate/validate",
            get(authenticate::validate_ticket),
        )
}

/// Creates a router for protected routes that require an admin bearer token
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/request_token", get(admin::request_token))
        .route("/admin/revoke_token", get(admin::revoke_token))
        .route("/authenticate/request", get(authenticate::request_ticket))
        // route_layer keeps unmatched paths answering 404 instead of 401
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ))
}
