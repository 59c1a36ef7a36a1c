//! The player session: local state plus the request/reply exchange.
//!
//! Each action sends one command, waits for its reply and applies it to the
//! hand. Cards, prizes and game-over notices are acknowledged with further
//! commands before the action returns.

use std::fmt;
use std::net::SocketAddr;

use log::{debug, info, warn};
use tokio::time::timeout;

use crate::card::{Card, Hand};
use crate::config::SessionConfig;
use crate::error::{ReplyError, SessionError, TransportError};
use crate::protocol::{Action, Command, Reply, Subject};
use crate::transport::{Datagram, Transport};

/// What the player learned from one reply.
#[derive(Debug)]
pub enum Outcome {
    Accepted(Subject),
    Declined { subject: Subject, reason: String },
    Registered,
    RegistrationDeclined { reason: String },
    /// A card was dealt and added to the hand.
    CardReceived(Card),
    Prize { amount: i64 },
    GameOver { message: String },
    /// Reply text that matched no known pattern.
    Unrecognized(String),
    /// A reply that could not be decoded; it was dropped.
    Malformed { reply: String, error: ReplyError },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Accepted(subject) => write!(f, "The {} was accepted.", subject),
            Outcome::Declined { subject, reason } => {
                write!(f, "The {} was declined: {}", subject, reason)
            }
            Outcome::Registered => f.write_str("Registration was successful."),
            Outcome::RegistrationDeclined { reason } => {
                write!(f, "Registration was declined: {}", reason)
            }
            Outcome::CardReceived(card) => write!(f, "Received card: {}", card),
            Outcome::Prize { amount } => write!(f, "Prize received: {}", amount),
            Outcome::GameOver { message } => write!(f, "Game over: {}", message),
            Outcome::Unrecognized(text) => write!(f, "Received: {}", text),
            Outcome::Malformed { reply, error } => {
                write!(f, "Dropped unreadable reply `{}`: {}", reply, error)
            }
        }
    }
}

/// The player's side of a game: its identity, hand, dealer and channel.
///
/// Every action sends one command and waits for its reply before returning.
/// Replies that must be acknowledged (a dealt card, a prize, game over)
/// trigger further exchanges inside the same call.
pub struct PlayerSession<T: Transport> {
    name: String,
    local: SocketAddr,
    dealer: Option<SocketAddr>,
    hand: Hand,
    transport: T,
    config: SessionConfig,
}

impl<T: Transport> PlayerSession<T> {
    pub fn new(name: impl Into<String>, local: SocketAddr, transport: T) -> Self {
        Self::with_config(name, local, transport, SessionConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        local: SocketAddr,
        transport: T,
        config: SessionConfig,
    ) -> Self {
        Self {
            name: name.into(),
            local,
            dealer: None,
            hand: Hand::new(),
            transport,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address advertised to the dealer at registration.
    pub fn local_endpoint(&self) -> SocketAddr {
        self.local
    }

    pub fn dealer_endpoint(&self) -> Option<SocketAddr> {
        self.dealer
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Register with the dealer at `dealer`.
    ///
    /// The endpoint is stored before the command is sent and replaces any
    /// earlier registration, whatever the dealer answers.
    pub async fn register(&mut self, dealer: SocketAddr) -> Result<Vec<Outcome>, SessionError> {
        if let Some(previous) = self.dealer.replace(dealer) {
            if previous != dealer {
                info!("re-registering: dealer moves from {} to {}", previous, dealer);
            }
        }
        let command = Command::Register {
            endpoint: self.local,
            name: self.name.clone(),
        };
        self.exchange(command).await
    }

    pub async fn place_bet(&mut self, amount: u64) -> Result<Vec<Outcome>, SessionError> {
        if self.dealer.is_none() {
            return Err(SessionError::NotRegistered);
        }
        let command = Command::Bet {
            name: self.name.clone(),
            amount,
        };
        self.exchange(command).await
    }

    /// Send `action`, quoting the last card received so the dealer can check
    /// the player is acting on the current deal.
    pub async fn act(&mut self, action: Action) -> Result<Vec<Outcome>, SessionError> {
        let card = self.hand.last().cloned().ok_or(SessionError::EmptyHand)?;
        let command = Command::Act {
            action,
            name: self.name.clone(),
            card,
        };
        self.exchange(command).await
    }

    pub async fn hit(&mut self) -> Result<Vec<Outcome>, SessionError> {
        self.act(Action::Hit).await
    }

    pub async fn stand(&mut self) -> Result<Vec<Outcome>, SessionError> {
        self.act(Action::Stand).await
    }

    // The protocol has no hand index, so actions after a split cannot say
    // which branch they mean; the dealer decides.
    pub async fn split(&mut self) -> Result<Vec<Outcome>, SessionError> {
        self.act(Action::Split).await
    }

    pub async fn double_down(&mut self) -> Result<Vec<Outcome>, SessionError> {
        self.act(Action::DoubleDown).await
    }

    pub async fn surrender(&mut self) -> Result<Vec<Outcome>, SessionError> {
        self.act(Action::Surrender).await
    }

    /// Send `command` and keep exchanging until no acknowledgement is owed.
    ///
    /// Acknowledgements are queued on an explicit stack instead of being sent
    /// from inside the reply handler, so every wait is bounded by the same
    /// timeout and a dealer that never stops asking is cut off. A reply that
    /// would need one acknowledgement too many is dropped before it touches
    /// the hand, so every card kept has been confirmed.
    ///
    /// If a later exchange fails, the outcomes already applied travel with
    /// the error as [`SessionError::Interrupted`].
    async fn exchange(&mut self, command: Command) -> Result<Vec<Outcome>, SessionError> {
        let dealer = self.dealer.ok_or(SessionError::NotRegistered)?;
        let mut pending = vec![command];
        let mut outcomes = Vec::new();
        let mut acks = 0;

        while let Some(command) = pending.pop() {
            let step = self.round_trip(dealer, &command).await.and_then(|reply| {
                let decoded = Reply::decode_bytes(&reply.payload);
                let owes_ack = matches!(&decoded, Ok(r) if r.owes_ack());
                if owes_ack && acks >= self.config.max_ack_chain {
                    warn!(
                        "dropping `{}`: acknowledgement limit reached",
                        String::from_utf8_lossy(&reply.payload)
                    );
                    return Err(SessionError::AckChainTooLong {
                        limit: self.config.max_ack_chain,
                    });
                }
                Ok((reply, decoded))
            });

            let (reply, decoded) = match step {
                Ok(step) => step,
                Err(cause) if outcomes.is_empty() => return Err(cause),
                Err(cause) => {
                    return Err(SessionError::Interrupted {
                        outcomes,
                        cause: Box::new(cause),
                    })
                }
            };

            let (outcome, ack) = self.react(&reply.payload, decoded);
            outcomes.push(outcome);
            if let Some(ack) = ack {
                acks += 1;
                pending.push(ack);
            }
        }
        Ok(outcomes)
    }

    /// Send one command and wait for exactly one reply.
    ///
    /// Anything already waiting on the channel answers an earlier command
    /// that timed out; it is discarded first so it cannot be taken for the
    /// reply to this one.
    async fn round_trip(
        &mut self,
        dealer: SocketAddr,
        command: &Command,
    ) -> Result<Datagram, SessionError> {
        self.discard_stale()?;

        debug!("-> {}: {}", dealer, command);
        self.transport.send_to(&command.to_wire(), dealer).await?;

        let reply = match self.config.reply_timeout {
            Some(limit) => timeout(limit, self.transport.recv())
                .await
                .map_err(|_| SessionError::NoReply {
                    command: command.to_string(),
                    waited: limit,
                })??,
            None => self.transport.recv().await?,
        };

        if reply.source != dealer {
            warn!(
                "reply came from {} instead of dealer {}",
                reply.source, dealer
            );
        }
        debug!("<- {}: {}", reply.source, String::from_utf8_lossy(&reply.payload));
        Ok(reply)
    }

    fn discard_stale(&mut self) -> Result<(), SessionError> {
        loop {
            match self.transport.try_recv() {
                Ok(Some(late)) => warn!(
                    "discarding late reply from {}: {}",
                    late.source,
                    String::from_utf8_lossy(&late.payload)
                ),
                Ok(None) => return Ok(()),
                Err(TransportError::Truncated { limit }) => {
                    warn!("discarding late reply over {} bytes", limit)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Apply one decoded reply to the session and work out the
    /// acknowledgement owed, if any.
    fn react(
        &mut self,
        payload: &[u8],
        decoded: Result<Reply, ReplyError>,
    ) -> (Outcome, Option<Command>) {
        let reply = match decoded {
            Ok(reply) => reply,
            Err(error) => {
                let text = String::from_utf8_lossy(payload).into_owned();
                warn!("dropping reply `{}`: {}", text, error);
                return (Outcome::Malformed { reply: text, error }, None);
            }
        };

        match reply {
            Reply::Card(card) => {
                info!("dealt {}", card);
                self.hand.push(card.clone());
                let ack = Command::ConfirmCard {
                    name: self.name.clone(),
                    card: card.clone(),
                };
                (Outcome::CardReceived(card), Some(ack))
            }
            Reply::Prize { amount } => {
                info!("prize of {}", amount);
                let ack = Command::AcceptPrize {
                    name: self.name.clone(),
                };
                (Outcome::Prize { amount }, Some(ack))
            }
            Reply::GameOver { message } => {
                info!("game over: {}", message);
                let ack = Command::GameOver {
                    name: self.name.clone(),
                };
                (Outcome::GameOver { message }, Some(ack))
            }
            Reply::Accepted(subject) => (Outcome::Accepted(subject), None),
            Reply::Declined { subject, reason } => (Outcome::Declined { subject, reason }, None),
            Reply::Registered => (Outcome::Registered, None),
            Reply::RegistrationDeclined { reason } => {
                (Outcome::RegistrationDeclined { reason }, None)
            }
            Reply::Unrecognized(text) => {
                debug!("unrecognized reply kept verbatim: {}", text);
                (Outcome::Unrecognized(text), None)
            }
        }
    }
}
