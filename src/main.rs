use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use blackjack_player::{
    dispatcher, init_logging, PlayerSession, SessionConfig, UdpTransport,
    DEFAULT_MAX_REPLY_BYTES, DEFAULT_REPLY_TIMEOUT, MIN_REPLY_BYTES,
};
use clap::Parser;
use log::info;
use tokio::io::BufReader;
use tokio::net::UdpSocket;

#[derive(Parser)]
#[command(author, version, about = "Play blackjack against a remote dealer", long_about = None)]
struct Cli {
    /// Address this player listens on and advertises to the dealer.
    local_ip: IpAddr,
    /// Port this player listens on.
    local_port: u16,
    /// Player name.
    name: String,
    #[arg(
        long,
        default_value_t = DEFAULT_REPLY_TIMEOUT.as_secs(),
        help = "Seconds to wait for each dealer reply (0 waits forever)"
    )]
    reply_timeout_secs: u64,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_REPLY_BYTES,
        value_parser = parse_reply_bytes,
        help = "Largest reply accepted before it is reported as truncated"
    )]
    max_reply_bytes: usize,
}

fn parse_reply_bytes(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{}", e))?;
    if n < MIN_REPLY_BYTES {
        return Err(format!("must be at least {}", MIN_REPLY_BYTES));
    }
    Ok(n)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let local = SocketAddr::new(cli.local_ip, cli.local_port);
    let socket = UdpSocket::bind(local).await?;
    let transport = UdpTransport::with_max_datagram_size(socket, cli.max_reply_bytes);
    info!("{} listening on {}", cli.name, transport.local_addr()?);

    let reply_timeout = match cli.reply_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let config = SessionConfig::default().with_reply_timeout(reply_timeout);
    let mut session = PlayerSession::with_config(cli.name, local, transport, config);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    dispatcher::run(&mut session, stdin, &mut stdout).await
}
