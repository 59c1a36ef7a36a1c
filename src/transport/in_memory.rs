use std::net::SocketAddr;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::error::TransportError;
use crate::transport::{Datagram, Transport};

/// One end of a pair of directly connected endpoints.
///
/// Whatever one end sends, the other receives, tagged with the sender's
/// address. The destination address is recorded but not routed on.
pub struct InMemoryTransport {
    local: SocketAddr,
    tx: UnboundedSender<Datagram>,
    rx: UnboundedReceiver<Datagram>,
    sent_to: Vec<SocketAddr>,
}

impl InMemoryTransport {
    pub fn pair(a: SocketAddr, b: SocketAddr) -> (Self, Self) {
        let (tx_a, rx_b) = unbounded_channel();
        let (tx_b, rx_a) = unbounded_channel();
        (
            Self {
                local: a,
                tx: tx_a,
                rx: rx_a,
                sent_to: Vec::new(),
            },
            Self {
                local: b,
                tx: tx_b,
                rx: rx_b,
                sent_to: Vec::new(),
            },
        )
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Destinations of every datagram sent from this end, oldest first.
    pub fn sent_to(&self) -> &[SocketAddr] {
        &self.sent_to
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send_to(&mut self, payload: &[u8], dest: SocketAddr) -> Result<(), TransportError> {
        self.sent_to.push(dest);
        self.tx
            .send(Datagram {
                payload: payload.to_vec(),
                source: self.local,
            })
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<Datagram, TransportError> {
        self.rx.recv().await.ok_or(TransportError::Closed)
    }

    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError> {
        match self.rx.try_recv() {
            Ok(datagram) => Ok(Some(datagram)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }
}
