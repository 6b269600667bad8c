use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Longest accepted unique id, the digits of a u64
const MAX_UNIQUE_ID_LEN: usize = 20;

/// Checks a player or account unique id: 1 to 20 ASCII digits once trimmed
pub fn is_valid_unique_id(unique_id: &str) -> bool {
    let unique_id = unique_id.trim();
    !unique_id.is_empty()
        && unique_id.len() <= MAX_UNIQUE_ID_LEN
        && unique_id.bytes().all(|b| b.is_ascii_digit())
}

/// Generic result of an API operation
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable error on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResult {
    pub fn from_success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn from_error<S: ToString>(error: S) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Result of a token request
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequestResult {
    pub success: bool,
    /// The newly issued access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Type of the issued token, usually "Bearer"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Space-separated scopes granted to the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TokenRequestResult {
    pub fn from_error<S: ToString>(error: S) -> Self {
        Self {
            success: false,
            token: None,
            token_type: None,
            scope: None,
            error: Some(error.to_string()),
        }
    }
}

/// Short-lived proof that a maintainer client vouches for an account
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MaintainerTicket {
    /// Random ticket token, base64 encoded
    pub token: String,
    /// Instant after which the ticket is no longer accepted
    pub expiry: DateTime<Utc>,
}

/// Result of a maintainer ticket request
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaintainerTicketResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<MaintainerTicket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MaintainerTicketResult {
    pub fn from_ticket(ticket: MaintainerTicket) -> Self {
        Self {
            success: true,
            ticket: Some(ticket),
            error: None,
        }
    }

    pub fn from_error<S: ToString>(error: S) -> Self {
        Self {
            success: false,
            ticket: None,
            error: Some(error.to_string()),
        }
    }
}

/// Result of a maintainer ticket validation.
///
/// An unknown, mismatched or expired ticket is a successful validation with
/// `is_valid` set to false.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketValidationResult {
    pub success: bool,
    pub is_valid: bool,
}
