use crate::api::authn_middleware::ClientIdentity;
use crate::models::{ApiResult, MaintainerTicketResult, TicketValidationResult};
use crate::openapi::AUTHENTICATION_TAG;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use log::warn;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TicketRequestQuery {
    /// Unique id of the account the ticket is bound to
    #[serde(default)]
    pub unique_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TicketValidationQuery {
    /// Unique id of the account presenting the ticket
    #[serde(default)]
    pub unique_id: String,
    /// Ticket token
    #[serde(default)]
    pub token: String,
}

/// Creates an authentication ticket for an account on behalf of the calling maintainer
#[utoipa::path(
    get,
    path = "/authenticate/request",
    tag = AUTHENTICATION_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token with the admin scope"),
        TicketRequestQuery
    ),
    responses(
        (status = 200, description = "Ticket request completed", body = MaintainerTicketResult),
        (status = 401, description = "Missing or invalid bearer token", body = ApiResult),
        (status = 403, description = "Bearer token lacks the admin scope", body = ApiResult)
    )
)]
pub(crate) async fn request_ticket(
    State(state): State<AppState>,
    Extension(identity): Extension<ClientIdentity>,
    Query(query): Query<TicketRequestQuery>,
) -> Json<MaintainerTicketResult> {
    let Some(client_id) = identity.client_id else {
        warn!("Ticket requested with a token carrying no client_id claim");
        return Json(MaintainerTicketResult::from_error(
            "Cannot authenticate maintainer: no client_id claim.",
        ));
    };

    let result = state.tickets.create_ticket(&client_id, &query.unique_id).await;
    Json(result.into())
}

/// Validates and consumes an authentication ticket
#[utoipa::path(
    get,
    path = "/authenticate/validate",
    tag = AUTHENTICATION_TAG,
    params(TicketValidationQuery),
    responses(
        (status = 200, description = "Ticket validation completed", body = TicketValidationResult)
    )
)]
pub(crate) async fn validate_ticket(
    State(state): State<AppState>,
    Query(query): Query<TicketValidationQuery>,
) -> Json<TicketValidationResult> {
    Json(
        state
            .tickets
            .validate_ticket(&query.unique_id, &query.token)
            .await,
    )
}
