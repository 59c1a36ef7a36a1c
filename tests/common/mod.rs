use std::net::SocketAddr;
use std::time::Duration;

use blackjack_player::{InMemoryTransport, PlayerSession, SessionConfig, Transport};
use tokio::task::JoinHandle;

pub const PLAYER: &str = "alice";

pub fn player_addr() -> SocketAddr {
    "127.0.0.1:4000".parse().unwrap()
}

pub fn dealer_addr() -> SocketAddr {
    "127.0.0.1:5000".parse().unwrap()
}

/// Dealer that answers each command with the next scripted reply.
///
/// Once the script runs out it keeps recording commands without answering.
/// The task ends when the player side is dropped and yields every command
/// it received, in order.
pub fn spawn_dealer(mut transport: InMemoryTransport, script: Vec<&'static str>) -> JoinHandle<Vec<String>> {
    tokio::spawn(async move {
        let mut received = Vec::new();
        let mut script = script.into_iter();
        while let Ok(datagram) = transport.recv().await {
            received.push(String::from_utf8(datagram.payload).unwrap());
            if let Some(reply) = script.next() {
                if transport.send_to(reply.as_bytes(), datagram.source).await.is_err() {
                    break;
                }
            }
        }
        received
    })
}

/// A session wired to a scripted dealer, with a short reply timeout.
pub fn session_with_dealer(
    script: Vec<&'static str>,
) -> (PlayerSession<InMemoryTransport>, JoinHandle<Vec<String>>) {
    session_with_config(
        script,
        SessionConfig::default().with_reply_timeout(Some(Duration::from_millis(500))),
    )
}

pub fn session_with_config(
    script: Vec<&'static str>,
    config: SessionConfig,
) -> (PlayerSession<InMemoryTransport>, JoinHandle<Vec<String>>) {
    let (player, dealer) = InMemoryTransport::pair(player_addr(), dealer_addr());
    let handle = spawn_dealer(dealer, script);
    let session = PlayerSession::with_config(PLAYER, player_addr(), player, config);
    (session, handle)
}

/// Drop the session and collect everything the dealer received.
pub async fn finish(
    session: PlayerSession<InMemoryTransport>,
    dealer: JoinHandle<Vec<String>>,
) -> Vec<String> {
    drop(session);
    dealer.await.unwrap()
}
