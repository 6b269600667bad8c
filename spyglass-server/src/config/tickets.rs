use confique::Config;
use std::time::Duration;

/// Configuration for maintainer authentication tickets
#[derive(Debug, Config, Clone)]
pub struct TicketConfig {
    /// Ticket lifetime in seconds (default: 180)
    #[config(env = "SPYGLASS_TICKETS_TTL", default = 180)]
    pub ttl: u64,

    /// Number of random bytes in a ticket token (default: 16)
    #[config(env = "SPYGLASS_TICKETS_TOKEN_BYTES", default = 16)]
    pub token_bytes: usize,
}

impl TicketConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}
