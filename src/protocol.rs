//! The text protocol spoken with the dealer.
//!
//! Every request is a single line of space-separated tokens, verb first.
//! Every request is answered by exactly one reply datagram, which is decoded
//! once into a [`Reply`] before the session acts on it.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::card::Card;
use crate::error::{ReplyError, UsageError};

/// Player actions that reference the most recently received card.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Hit,
    Stand,
    Split,
    DoubleDown,
    Surrender,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Hit,
        Action::Stand,
        Action::Split,
        Action::DoubleDown,
        Action::Surrender,
    ];

    /// Verb used on the wire and at the prompt.
    pub fn verb(self) -> &'static str {
        match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::Split => "split",
            Action::DoubleDown => "doubleDown",
            Action::Surrender => "surrender",
        }
    }

    pub fn from_verb(verb: &str) -> Option<Self> {
        Action::ALL.into_iter().find(|a| a.verb() == verb)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Requests sent from the player to the dealer.
///
/// `Display` renders the exact wire text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `registerPlayer <ip> <port> <name>`
    Register { endpoint: SocketAddr, name: String },
    /// `bet <name> <amount>`
    Bet { name: String, amount: u64 },
    /// `<verb> <name> <deck> <card>`
    Act {
        action: Action,
        name: String,
        card: Card,
    },
    /// `player <name> received <deck> <card>`
    ConfirmCard { name: String, card: Card },
    /// `prize accepted <name>`
    AcceptPrize { name: String },
    /// `gameover <name>`
    GameOver { name: String },
}

impl Command {
    pub fn to_wire(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Register { endpoint, name } => write!(
                f,
                "registerPlayer {} {} {}",
                endpoint.ip(),
                endpoint.port(),
                name
            ),
            Command::Bet { name, amount } => write!(f, "bet {} {}", name, amount),
            Command::Act { action, name, card } => {
                write!(f, "{} {} {} {}", action, name, card.deck, card)
            }
            Command::ConfirmCard { name, card } => {
                write!(f, "player {} received {} {}", name, card.deck, card)
            }
            Command::AcceptPrize { name } => write!(f, "prize accepted {}", name),
            Command::GameOver { name } => write!(f, "gameover {}", name),
        }
    }
}

fn number<T: FromStr>(token: &str) -> Result<T, UsageError> {
    token
        .parse()
        .map_err(|_| UsageError::BadNumber(token.to_string()))
}

impl FromStr for Command {
    type Err = UsageError;

    /// Parse wire text back into a command, as the dealer would read it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let verb = s.split(' ').next().unwrap_or_default();

        if let Some(action) = Action::from_verb(verb) {
            let mut parts = s.splitn(4, ' ').skip(1);
            let (name, _deck, card) = match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(deck), Some(card)) => (name, deck, card),
                _ => return Err(UsageError::Usage("<verb> <name> <deck> <card>")),
            };
            return Ok(Command::Act {
                action,
                name: name.to_string(),
                card: card.parse()?,
            });
        }

        match verb {
            "registerPlayer" => {
                let parts: Vec<&str> = s.split(' ').collect();
                if parts.len() != 4 {
                    return Err(UsageError::Usage("registerPlayer <ip> <port> <name>"));
                }
                let ip: IpAddr = number(parts[1])?;
                let port: u16 = number(parts[2])?;
                Ok(Command::Register {
                    endpoint: SocketAddr::new(ip, port),
                    name: parts[3].to_string(),
                })
            }
            "bet" => {
                let parts: Vec<&str> = s.split(' ').collect();
                if parts.len() != 3 {
                    return Err(UsageError::Usage("bet <name> <amount>"));
                }
                Ok(Command::Bet {
                    name: parts[1].to_string(),
                    amount: number(parts[2])?,
                })
            }
            "player" => {
                let parts: Vec<&str> = s.splitn(5, ' ').collect();
                if parts.len() != 5 || parts[2] != "received" {
                    return Err(UsageError::Usage("player <name> received <deck> <card>"));
                }
                Ok(Command::ConfirmCard {
                    name: parts[1].to_string(),
                    card: parts[4].parse()?,
                })
            }
            "prize" => match s.split(' ').collect::<Vec<_>>().as_slice() {
                ["prize", "accepted", name] => Ok(Command::AcceptPrize {
                    name: name.to_string(),
                }),
                _ => Err(UsageError::Usage("prize accepted <name>")),
            },
            "gameover" => match s.split(' ').collect::<Vec<_>>().as_slice() {
                ["gameover", name] => Ok(Command::GameOver {
                    name: name.to_string(),
                }),
                _ => Err(UsageError::Usage("gameover <name>")),
            },
            other => Err(UsageError::Unknown(other.to_string())),
        }
    }
}

/// What a bet or action verdict refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Subject {
    Bet,
    Action,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Bet => f.write_str("bet"),
            Subject::Action => f.write_str("action"),
        }
    }
}

/// Every kind of reply the dealer can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Card(Card),
    Accepted(Subject),
    Declined { subject: Subject, reason: String },
    Registered,
    RegistrationDeclined { reason: String },
    Prize { amount: i64 },
    GameOver { message: String },
    /// Anything else, kept verbatim.
    Unrecognized(String),
}

const REGISTRATION_DECLINED: &str = "registration declined";

impl Reply {
    /// Classify reply text.
    ///
    /// Patterns are tried in a fixed order, so e.g. `"bet declined"` wins
    /// over any later prefix. A reply that starts like a card or a prize but
    /// cannot be decoded is an error; text matching nothing is
    /// [`Reply::Unrecognized`].
    pub fn decode(text: &str) -> Result<Reply, ReplyError> {
        let text = text.trim();

        if text.starts_with('{') {
            return Ok(Reply::Card(Card::from_json(text)?));
        }

        let reply = match text {
            "bet accepted" => Reply::Accepted(Subject::Bet),
            "action accepted" => Reply::Accepted(Subject::Action),
            _ if text.starts_with("bet declined") => Reply::Declined {
                subject: Subject::Bet,
                reason: text["bet declined".len()..].trim().to_string(),
            },
            _ if text.starts_with("action declined") => Reply::Declined {
                subject: Subject::Action,
                reason: text["action declined".len()..].trim().to_string(),
            },
            "registration successful" => Reply::Registered,
            _ if text.starts_with(REGISTRATION_DECLINED) => Reply::RegistrationDeclined {
                reason: text[REGISTRATION_DECLINED.len()..].trim().to_string(),
            },
            _ if text.starts_with("prize") => {
                let amount = text
                    .split_whitespace()
                    .nth(1)
                    .and_then(|token| token.parse().ok())
                    .ok_or_else(|| ReplyError::PrizeAmount(text.to_string()))?;
                Reply::Prize { amount }
            }
            _ if text.starts_with("gameover") => Reply::GameOver {
                message: text["gameover".len()..].trim().to_string(),
            },
            other => Reply::Unrecognized(other.to_string()),
        };
        Ok(reply)
    }

    /// Whether the dealer expects this reply to be acknowledged with a
    /// further command.
    pub fn owes_ack(&self) -> bool {
        matches!(
            self,
            Reply::Card(_) | Reply::Prize { .. } | Reply::GameOver { .. }
        )
    }

    pub fn decode_bytes(payload: &[u8]) -> Result<Reply, ReplyError> {
        Reply::decode(&String::from_utf8_lossy(payload))
    }
}
