//! Maintainer authentication tickets
//!
//! A maintainer tool holding an admin token asks for a ticket bound to an
//! in-game account. The game client then proves the maintainer vouched for
//! that account by presenting the ticket, without holding OAuth2 credentials
//! itself. Tickets are short-lived, single-use, and one account has at most
//! one outstanding ticket: requesting another replaces it.

use crate::config::TicketConfig;
use crate::models::{
    is_valid_unique_id, MaintainerTicket, MaintainerTicketResult, TicketValidationResult,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, error, info};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

/// Default ticket lifetime in seconds
pub const DEFAULT_TICKET_TTL_SECS: i64 = 180;
/// Default number of random bytes in a ticket token
pub const DEFAULT_TOKEN_BYTES: usize = 16;

/// Errors that can occur while creating a ticket
#[derive(Debug, Error, PartialEq)]
pub enum TicketError {
    #[error("Cannot create an authentication ticket with a null or empty client id.")]
    InvalidClientId,
    #[error("Cannot create an authentication ticket with an invalid unique id.")]
    InvalidUniqueId,
    #[error("Cannot create an authentication ticket: the configured lifetime is out of range.")]
    LifetimeOutOfRange,
}

/// Outcome of checking a ticket, with the reason it was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketCheck {
    Valid,
    /// The unique id or token was empty
    MissingInput,
    /// No ticket is outstanding for the unique id
    NotIssued,
    /// A ticket is outstanding but the token differs
    Mismatch,
    /// The token matches an outstanding ticket past its expiry
    Expired,
}

impl TicketCheck {
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Issues and validates maintainer authentication tickets.
///
/// Tickets are kept in memory, keyed by unique id. Expired tickets are not
/// swept, they stay until replaced or checked.
pub struct MaintainerTicketService {
    tickets: Mutex<HashMap<String, MaintainerTicket>>,
    ttl: ChronoDuration,
    token_bytes: usize,
}

impl Default for MaintainerTicketService {
    fn default() -> Self {
        Self {
            tickets: Mutex::new(HashMap::new()),
            ttl: ChronoDuration::seconds(DEFAULT_TICKET_TTL_SECS),
            token_bytes: DEFAULT_TOKEN_BYTES,
        }
    }
}

impl MaintainerTicketService {
    pub fn new(config: &TicketConfig) -> Self {
        let ttl = ChronoDuration::from_std(config.ttl())
            .unwrap_or_else(|_| ChronoDuration::seconds(DEFAULT_TICKET_TTL_SECS));
        let token_bytes = if config.token_bytes == 0 {
            DEFAULT_TOKEN_BYTES
        } else {
            config.token_bytes
        };
        Self {
            tickets: Mutex::new(HashMap::new()),
            ttl,
            token_bytes,
        }
    }

    /// Creates a ticket for a unique id, replacing any outstanding one.
    ///
    /// The client id is only checked, tickets are not bound to the client
    /// that requested them.
    pub async fn create_ticket(
        &self,
        client_id: &str,
        unique_id: &str,
    ) -> Result<MaintainerTicket, TicketError> {
        let client_id = client_id.trim();
        let unique_id = unique_id.trim();
        if client_id.is_empty() {
            return Err(TicketError::InvalidClientId);
        }
        if !is_valid_unique_id(unique_id) {
            return Err(TicketError::InvalidUniqueId);
        }

        let Some(expiry) = Utc::now().checked_add_signed(self.ttl) else {
            error!("Ticket lifetime of {}s overflows the date range", self.ttl.num_seconds());
            return Err(TicketError::LifetimeOutOfRange);
        };
        let ticket = MaintainerTicket {
            token: self.generate_token(),
            expiry,
        };

        let replaced = self
            .tickets
            .lock()
            .await
            .insert(unique_id.to_string(), ticket.clone())
            .is_some();

        info!(
            "Maintainer '{}' created an authentication ticket for '{}'{}",
            client_id,
            unique_id,
            if replaced { ", replacing the previous one" } else { "" }
        );
        Ok(ticket)
    }

    /// Checks a ticket, consuming it when valid and `consume` is set
    pub async fn check_ticket(&self, unique_id: &str, token: &str, consume: bool) -> TicketCheck {
        self.check_ticket_at(unique_id, token, consume, Utc::now()).await
    }

    async fn check_ticket_at(
        &self,
        unique_id: &str,
        token: &str,
        consume: bool,
        now: DateTime<Utc>,
    ) -> TicketCheck {
        if unique_id.trim().is_empty() || token.trim().is_empty() {
            return TicketCheck::MissingInput;
        }

        let mut tickets = self.tickets.lock().await;
        let check = match tickets.get(unique_id) {
            None => TicketCheck::NotIssued,
            Some(ticket) if ticket.token != token => TicketCheck::Mismatch,
            // Still valid at the exact expiry instant
            Some(ticket) if ticket.expiry < now => TicketCheck::Expired,
            Some(_) => TicketCheck::Valid,
        };

        if check.is_valid() && consume {
            tickets.remove(unique_id);
        }
        check
    }

    /// Validates and consumes a ticket
    pub async fn validate_ticket(&self, unique_id: &str, token: &str) -> TicketValidationResult {
        self.validate_ticket_with(unique_id, token, true).await
    }

    /// Validates a ticket, consuming it only when `consume` is set.
    ///
    /// Any failure, whatever the reason, is reported as `is_valid: false`.
    pub async fn validate_ticket_with(
        &self,
        unique_id: &str,
        token: &str,
        consume: bool,
    ) -> TicketValidationResult {
        let check = self.check_ticket(unique_id, token, consume).await;
        debug!("Authentication ticket check for '{}': {:?}", unique_id, check);
        TicketValidationResult {
            success: true,
            is_valid: check.is_valid(),
        }
    }

    /// Number of tickets held, expired ones included
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.tickets.lock().await.len()
    }

    fn generate_token(&self) -> String {
        let mut bytes = vec![0u8; self.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    #[cfg(test)]
    pub(crate) async fn insert_ticket(&self, unique_id: &str, ticket: MaintainerTicket) {
        self.tickets.lock().await.insert(unique_id.to_string(), ticket);
    }
}

impl From<Result<MaintainerTicket, TicketError>> for MaintainerTicketResult {
    fn from(result: Result<MaintainerTicket, TicketError>) -> Self {
        match result {
            Ok(ticket) => Self::from_ticket(ticket),
            Err(e) => Self::from_error(e),
        }
    }
}
