use std::time::Duration;

/// Smallest receive buffer the client will run with.
pub const MIN_REPLY_BYTES: usize = 1024;

/// Default largest reply accepted before it is reported as truncated.
pub const DEFAULT_MAX_REPLY_BYTES: usize = 8192;

/// Default time to wait for the dealer's reply to a single command.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on acknowledgements triggered by one action.
pub const MAX_ACK_CHAIN: usize = 16;

/// Environment variable holding the log level.
pub const LOG_ENV: &str = "BLACKJACK_LOG";

/// Tunables for the request/reply exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long to wait for each reply; `None` waits forever.
    pub reply_timeout: Option<Duration>,
    pub max_ack_chain: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Some(DEFAULT_REPLY_TIMEOUT),
            max_ack_chain: MAX_ACK_CHAIN,
        }
    }
}

impl SessionConfig {
    pub fn with_reply_timeout(mut self, reply_timeout: Option<Duration>) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }
}
