use std::net::SocketAddr;

use tokio::net::{ToSocketAddrs, UdpSocket};

use crate::config::{DEFAULT_MAX_REPLY_BYTES, MIN_REPLY_BYTES};
use crate::error::TransportError;
use crate::transport::{Datagram, Transport};

pub struct UdpTransport {
    socket: UdpSocket,
    max_datagram_size: usize,
    buf: Vec<u8>,
}

impl UdpTransport {
    pub fn new(socket: UdpSocket) -> Self {
        Self::with_max_datagram_size(socket, DEFAULT_MAX_REPLY_BYTES)
    }

    /// Wrap a bound socket, accepting datagrams of up to `max_datagram_size`
    /// bytes (never less than [`MIN_REPLY_BYTES`]).
    pub fn with_max_datagram_size(socket: UdpSocket, max_datagram_size: usize) -> Self {
        let max_datagram_size = max_datagram_size.max(MIN_REPLY_BYTES);
        Self {
            socket,
            max_datagram_size,
            // One spare byte: a datagram that fills it is longer than allowed.
            buf: vec![0u8; max_datagram_size + 1],
        }
    }

    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::new(socket))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn max_datagram_size(&self) -> usize {
        self.max_datagram_size
    }

    fn datagram(&self, len: usize, source: SocketAddr) -> Result<Datagram, TransportError> {
        if len > self.max_datagram_size {
            return Err(TransportError::Truncated {
                limit: self.max_datagram_size,
            });
        }
        Ok(Datagram {
            payload: self.buf[..len].to_vec(),
            source,
        })
    }
}

#[async_trait::async_trait]
impl Transport for UdpTransport {
    async fn send_to(&mut self, payload: &[u8], dest: SocketAddr) -> Result<(), TransportError> {
        let sent = self.socket.send_to(payload, dest).await?;
        if sent != payload.len() {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, payload.len()),
            )));
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Datagram, TransportError> {
        let (len, source) = self.socket.recv_from(&mut self.buf).await?;
        self.datagram(len, source)
    }

    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError> {
        match self.socket.try_recv_from(&mut self.buf) {
            Ok((len, source)) => self.datagram(len, source).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
