//! Player-side client for a blackjack dealer reachable over UDP.

pub mod card;
pub mod config;
pub mod dispatcher;
pub mod error;
mod logging;
pub mod protocol;
pub mod session;
pub mod transport;

pub use card::{Card, DeckId, Hand, Rank, Suit};
pub use config::*;
pub use error::{CardTextError, ReplyError, SessionError, TransportError, UsageError};
pub use logging::init_logging;
pub use protocol::{Action, Command, Reply, Subject};
pub use session::{Outcome, PlayerSession};
pub use transport::{in_memory::InMemoryTransport, udp::UdpTransport, Datagram, Transport};
