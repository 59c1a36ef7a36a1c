use std::time::Duration;

use thiserror::Error;

use crate::session::Outcome;

/// Failures of the datagram channel itself.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    /// The reply did not fit the receive buffer and was cut off.
    #[error("reply truncated: datagram exceeds {limit} bytes")]
    Truncated { limit: usize },
    #[error("transport closed")]
    Closed,
}

/// Errors returned by the player session's action operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("you must register first")]
    NotRegistered,
    #[error("no card to reference")]
    EmptyHand,
    #[error("no reply to `{command}` within {waited:?}")]
    NoReply { command: String, waited: Duration },
    #[error("dealer requested more than {limit} acknowledgements in a row")]
    AckChainTooLong { limit: usize },
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// An acknowledgement exchange failed after earlier replies of the same
    /// action had already been applied.
    #[error("{cause}")]
    Interrupted {
        outcomes: Vec<Outcome>,
        cause: Box<SessionError>,
    },
}

impl SessionError {
    /// Whether the failure happened before anything was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SessionError::NotRegistered | SessionError::EmptyHand)
    }

    /// Socket failures end the run. A truncated reply only spoils that one
    /// exchange, so like everything else it is reported and the session
    /// carries on.
    pub fn is_fatal(&self) -> bool {
        match self {
            SessionError::Transport(TransportError::Truncated { .. }) => false,
            SessionError::Transport(_) => true,
            SessionError::Interrupted { cause, .. } => cause.is_fatal(),
            _ => false,
        }
    }

    /// Outcomes of the replies applied before the failure.
    pub fn outcomes(&self) -> &[Outcome] {
        match self {
            SessionError::Interrupted { outcomes, .. } => outcomes,
            _ => &[],
        }
    }

    /// The failure itself, without the outcomes that preceded it.
    pub fn cause(&self) -> &SessionError {
        match self {
            SessionError::Interrupted { cause, .. } => cause.cause(),
            other => other,
        }
    }
}

/// A reply that looked like a known kind but could not be decoded.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("malformed card: {0}")]
    Card(#[from] serde_json::Error),
    #[error("malformed prize amount in `{0}`")]
    PrizeAmount(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardTextError {
    #[error("not a card: `{0}`")]
    Shape(String),
    #[error("unknown card field `{0}`")]
    UnknownField(String),
    #[error("card is missing `{0}`")]
    MissingField(&'static str),
    #[error("unknown rank `{0}`")]
    UnknownRank(String),
    #[error("unknown suit `{0}`")]
    UnknownSuit(String),
}

/// Problems parsing a command line, either operator input or wire text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("not a valid number: {0}")]
    BadNumber(String),
    #[error(transparent)]
    Card(#[from] CardTextError),
}
