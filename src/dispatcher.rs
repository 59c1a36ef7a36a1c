//! Interactive front end: reads operator lines and drives the session.

use std::io::Write;
use std::net::SocketAddr;

use log::warn;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::UsageError;
use crate::protocol::Action;
use crate::session::PlayerSession;
use crate::transport::Transport;

pub const HELP: &str = "\
Commands:
  registerPlayer <dealerIP> <dealerPort>   register with a dealer
  bet <name> <amount>                      place a bet (name may be omitted)
  hit | stand | split | doubleDown | surrender
  hand                                     show the cards received so far
  help                                     show this text
  quit                                     leave";

/// One parsed operator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Register { host: String, port: u16 },
    Bet { name: Option<String>, amount: u64 },
    Act(Action),
    ShowHand,
    Help,
    Quit,
}

fn number<T: std::str::FromStr>(token: &str) -> Result<T, UsageError> {
    token
        .parse()
        .map_err(|_| UsageError::BadNumber(token.to_string()))
}

/// Parse a line typed at the prompt. Blank lines yield `Ok(None)`.
pub fn parse_input(line: &str) -> Result<Option<Input>, UsageError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = tokens.split_first() else {
        return Ok(None);
    };

    if let Some(action) = Action::from_verb(verb) {
        return Ok(Some(Input::Act(action)));
    }

    let input = match (verb, args) {
        // A trailing player name is tolerated and ignored.
        ("registerPlayer", [host, port]) | ("registerPlayer", [host, port, _]) => {
            Input::Register {
                host: host.to_string(),
                port: number(port)?,
            }
        }
        ("registerPlayer", _) => {
            return Err(UsageError::Usage("registerPlayer <dealerIP> <dealerPort>"))
        }
        ("bet", [name, amount]) => Input::Bet {
            name: Some(name.to_string()),
            amount: number(amount)?,
        },
        ("bet", [amount]) => Input::Bet {
            name: None,
            amount: number(amount)?,
        },
        ("bet", _) => return Err(UsageError::Usage("bet <name> <amount>")),
        ("hand", _) => Input::ShowHand,
        ("help", _) => Input::Help,
        ("quit", _) | ("exit", _) => Input::Quit,
        (other, _) => return Err(UsageError::Unknown(other.to_string())),
    };
    Ok(Some(input))
}

async fn resolve(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address found"))
}

/// Read commands from `input` until it ends or the operator quits.
///
/// Usage, precondition and decode problems, missing replies and truncated
/// replies are reported on `out` and the loop carries on. A socket failure
/// ends the loop with an error.
pub async fn run<T, R, W>(
    session: &mut PlayerSession<T>,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    T: Transport,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(out, "Enter command: ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let parsed = match parse_input(&line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };

        let result = match parsed {
            Input::Quit => break,
            Input::Help => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            Input::ShowHand => {
                writeln!(out, "Hand: {}", session.hand())?;
                continue;
            }
            Input::Register { host, port } => match resolve(&host, port).await {
                Ok(dealer) => session.register(dealer).await,
                Err(e) => {
                    writeln!(out, "Cannot resolve dealer {}:{}: {}", host, port, e)?;
                    continue;
                }
            },
            Input::Bet { name, amount } => {
                if let Some(name) = name.filter(|n| n != session.name()) {
                    warn!("betting as {} (ignoring name {})", session.name(), name);
                }
                session.place_bet(amount).await
            }
            Input::Act(action) => session.act(action).await,
        };

        match result {
            Ok(outcomes) => {
                for outcome in outcomes {
                    writeln!(out, "{}", outcome)?;
                }
            }
            Err(e) => {
                // Replies applied before the failure still get reported.
                for outcome in e.outcomes() {
                    writeln!(out, "{}", outcome)?;
                }
                if e.is_fatal() {
                    return Err(e.into());
                }
                writeln!(out, "{}", e)?;
            }
        }
    }
    Ok(())
}
