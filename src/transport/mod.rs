use std::net::SocketAddr;

use crate::error::TransportError;

/// One datagram as received, with the address it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub source: SocketAddr,
}

/// A connectionless channel able to send a datagram to any peer and
/// receive the next datagram addressed to us.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send_to(&mut self, payload: &[u8], dest: SocketAddr) -> Result<(), TransportError>;
    async fn recv(&mut self) -> Result<Datagram, TransportError>;

    /// Take a datagram that has already arrived, without waiting.
    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError>;
}

pub mod in_memory;
pub mod udp;
