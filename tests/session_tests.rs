mod common;

use std::time::Duration;

use blackjack_player::{
    Action, Card, Outcome, Rank, SessionConfig, SessionError, Subject, Suit, Transport,
    TransportError,
};
use common::{dealer_addr, finish, session_with_config, session_with_dealer, PLAYER};

const ACE_OF_SPADES: &str = r#"{"deck":2,"rank":"Ace","suit":"Spades"}"#;
const SEVEN_OF_HEARTS: &str = r#"{"deck":2,"rank":"Seven","suit":"Hearts"}"#;

#[tokio::test]
async fn registration_sends_local_endpoint_and_name() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec!["registration successful"]);

    let outcomes = session.register(dealer_addr()).await?;
    assert!(matches!(outcomes.as_slice(), [Outcome::Registered]));
    assert_eq!(session.dealer_endpoint(), Some(dealer_addr()));

    let received = finish(session, dealer).await;
    assert_eq!(received, vec!["registerPlayer 127.0.0.1 4000 alice"]);
    Ok(())
}

#[tokio::test]
async fn every_command_goes_to_the_registered_dealer() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![
        "registration successful",
        ACE_OF_SPADES,
        "action accepted",
        "action accepted",
    ]);

    session.register(dealer_addr()).await?;
    session.place_bet(25).await?;
    session.hit().await?;

    assert_eq!(session.transport().sent_to().len(), 4);
    assert!(session.transport().sent_to().iter().all(|&a| a == dealer_addr()));

    let received = finish(session, dealer).await;
    assert_eq!(received[1], "bet alice 25");
    Ok(())
}

#[tokio::test]
async fn re_registration_replaces_the_dealer() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![
        "registration successful",
        "registration successful",
        "bet accepted",
    ]);
    let other = "127.0.0.1:6000".parse()?;

    session.register(dealer_addr()).await?;
    session.register(other).await?;
    session.place_bet(5).await?;

    assert_eq!(session.dealer_endpoint(), Some(other));
    assert_eq!(session.transport().sent_to(), &[dealer_addr(), other, other]);
    finish(session, dealer).await;
    Ok(())
}

#[tokio::test]
async fn betting_before_registration_sends_nothing() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![]);

    let err = session.place_bet(10).await.unwrap_err();
    assert!(matches!(err, SessionError::NotRegistered));
    assert!(err.is_precondition());
    assert_eq!(err.to_string(), "you must register first");

    assert!(session.transport().sent_to().is_empty());
    assert!(finish(session, dealer).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn card_actions_need_a_card_in_hand() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec!["registration successful"]);
    session.register(dealer_addr()).await?;

    for action in Action::ALL {
        let err = session.act(action).await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyHand), "{:?}", action);
        assert_eq!(err.to_string(), "no card to reference");
    }

    assert_eq!(session.transport().sent_to().len(), 1);
    let received = finish(session, dealer).await;
    assert_eq!(received.len(), 1);
    Ok(())
}

#[tokio::test]
async fn dealt_card_is_kept_and_confirmed_next() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![
        "registration successful",
        ACE_OF_SPADES,
        "action accepted",
    ]);
    session.register(dealer_addr()).await?;

    let outcomes = session.place_bet(100).await?;
    let ace = Card::new(2, Rank::Ace, Suit::Spades);
    match outcomes.as_slice() {
        [Outcome::CardReceived(card), Outcome::Accepted(Subject::Action)] => {
            assert_eq!(card, &ace)
        }
        other => panic!("unexpected outcomes {:?}", other),
    }
    assert_eq!(session.hand().len(), 1);
    assert_eq!(session.hand().last(), Some(&ace));

    let received = finish(session, dealer).await;
    assert_eq!(received.len(), 3);
    assert_eq!(received[1], "bet alice 100");
    assert!(received[2].contains("deck=2"));
    assert!(received[2].contains(&ace.to_string()));
    assert_eq!(
        received[2],
        "player alice received 2 Card{deck=2, rank=Ace, suit=Spades}"
    );
    Ok(())
}

#[tokio::test]
async fn actions_quote_the_last_card() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![
        "registration successful",
        ACE_OF_SPADES,
        "bet accepted",
        SEVEN_OF_HEARTS,
        "action accepted",
        "action accepted",
    ]);
    session.register(dealer_addr()).await?;
    session.place_bet(10).await?;
    session.hit().await?;
    session.stand().await?;

    assert_eq!(session.hand().len(), 2);
    assert_eq!(session.hand().total(), 18);

    let received = finish(session, dealer).await;
    assert_eq!(received[3], "hit alice 2 Card{deck=2, rank=Ace, suit=Spades}");
    assert_eq!(
        received[4],
        "player alice received 2 Card{deck=2, rank=Seven, suit=Hearts}"
    );
    assert_eq!(received[5], "stand alice 2 Card{deck=2, rank=Seven, suit=Hearts}");
    Ok(())
}

#[tokio::test]
async fn declined_bet_reports_reason() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![
        "registration successful",
        "bet declined insufficient funds",
    ]);
    session.register(dealer_addr()).await?;

    let outcomes = session.place_bet(1_000_000).await?;
    match outcomes.as_slice() {
        [Outcome::Declined { subject, reason }] => {
            assert_eq!(*subject, Subject::Bet);
            assert_eq!(reason, "insufficient funds");
        }
        other => panic!("unexpected outcomes {:?}", other),
    }
    finish(session, dealer).await;
    Ok(())
}

#[tokio::test]
async fn declined_registration_reports_reason() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec!["registration declined name taken"]);

    let outcomes = session.register(dealer_addr()).await?;
    match outcomes.as_slice() {
        [Outcome::RegistrationDeclined { reason }] => assert_eq!(reason, "name taken"),
        other => panic!("unexpected outcomes {:?}", other),
    }
    // The endpoint stays stored; the dealer decides what a declined player may do.
    assert_eq!(session.dealer_endpoint(), Some(dealer_addr()));
    finish(session, dealer).await;
    Ok(())
}

#[tokio::test]
async fn prize_is_accepted_with_a_new_exchange() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![
        "registration successful",
        ACE_OF_SPADES,
        "bet accepted",
        "prize 500",
        "action accepted",
    ]);
    session.register(dealer_addr()).await?;
    session.place_bet(10).await?;

    let outcomes = session.stand().await?;
    assert!(matches!(
        outcomes.as_slice(),
        [Outcome::Prize { amount: 500 }, Outcome::Accepted(Subject::Action)]
    ));

    let received = finish(session, dealer).await;
    assert_eq!(received.last().map(String::as_str), Some("prize accepted alice"));
    Ok(())
}

#[tokio::test]
async fn game_over_is_acknowledged() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![
        "registration successful",
        ACE_OF_SPADES,
        "bet accepted",
        "gameover   dealer wins  ",
        "ok",
    ]);
    session.register(dealer_addr()).await?;
    session.place_bet(10).await?;

    let outcomes = session.surrender().await?;
    match outcomes.as_slice() {
        [Outcome::GameOver { message }, Outcome::Unrecognized(ok)] => {
            assert_eq!(message, "dealer wins");
            assert_eq!(ok, "ok");
        }
        other => panic!("unexpected outcomes {:?}", other),
    }

    let received = finish(session, dealer).await;
    assert_eq!(received[3], "surrender alice 2 Card{deck=2, rank=Ace, suit=Spades}");
    assert_eq!(received[4], format!("gameover {}", PLAYER));
    Ok(())
}

#[tokio::test]
async fn unrecognized_reply_changes_nothing() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec!["registration successful", "foobar"]);
    session.register(dealer_addr()).await?;

    let outcomes = session.place_bet(10).await?;
    assert!(matches!(outcomes.as_slice(), [Outcome::Unrecognized(t)] if t == "foobar"));
    assert!(session.hand().is_empty());
    assert_eq!(session.transport().sent_to().len(), 2);

    let received = finish(session, dealer).await;
    assert_eq!(received.len(), 2);
    Ok(())
}

#[tokio::test]
async fn malformed_card_is_dropped() -> anyhow::Result<()> {
    let (mut session, dealer) = session_with_dealer(vec![
        "registration successful",
        r#"{"deck":2,"rank":"Ace"}"#,
        "prize lots",
    ]);
    session.register(dealer_addr()).await?;

    let outcomes = session.place_bet(10).await?;
    assert!(matches!(outcomes.as_slice(), [Outcome::Malformed { .. }]));
    assert!(session.hand().is_empty());

    let outcomes = session.place_bet(10).await?;
    match outcomes.as_slice() {
        [Outcome::Malformed { reply, .. }] => assert_eq!(reply, "prize lots"),
        other => panic!("unexpected outcomes {:?}", other),
    }

    let received = finish(session, dealer).await;
    assert_eq!(received.len(), 3);
    Ok(())
}

#[tokio::test]
async fn silent_dealer_yields_no_reply() -> anyhow::Result<()> {
    let config = SessionConfig::default().with_reply_timeout(Some(Duration::from_millis(50)));
    let (mut session, dealer) = session_with_config(vec![], config);

    let err = session.register(dealer_addr()).await.unwrap_err();
    match &err {
        SessionError::NoReply { command, waited } => {
            assert_eq!(command, "registerPlayer 127.0.0.1 4000 alice");
            assert_eq!(*waited, Duration::from_millis(50));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!err.is_fatal());
    finish(session, dealer).await;
    Ok(())
}

#[tokio::test]
async fn endless_acknowledgements_are_cut_off() -> anyhow::Result<()> {
    let config = SessionConfig {
        reply_timeout: Some(Duration::from_millis(500)),
        max_ack_chain: 2,
    };
    let (mut session, dealer) = session_with_config(
        vec!["registration successful", ACE_OF_SPADES, ACE_OF_SPADES, ACE_OF_SPADES],
        config,
    );
    session.register(dealer_addr()).await?;

    let err = session.place_bet(10).await.unwrap_err();
    assert!(matches!(err.cause(), SessionError::AckChainTooLong { limit: 2 }));
    assert_eq!(err.outcomes().len(), 2);
    assert!(err
        .outcomes()
        .iter()
        .all(|o| matches!(o, Outcome::CardReceived(_))));
    // The card over the limit is dropped, so every card held was confirmed.
    assert_eq!(session.hand().len(), 2);

    let received = finish(session, dealer).await;
    assert_eq!(received.len(), 4);
    assert!(received[2].starts_with("player alice received"));
    assert!(received[3].starts_with("player alice received"));
    Ok(())
}

#[tokio::test]
async fn late_reply_is_not_taken_for_the_next_one() -> anyhow::Result<()> {
    let (player, mut dealer) =
        blackjack_player::InMemoryTransport::pair(common::player_addr(), dealer_addr());
    let dealer = tokio::spawn(async move {
        let register = dealer.recv().await?;
        tokio::time::sleep(Duration::from_millis(150)).await;
        dealer
            .send_to(b"registration successful", register.source)
            .await?;
        let bet = dealer.recv().await?;
        dealer
            .send_to(b"bet declined insufficient funds", bet.source)
            .await?;
        anyhow::Ok(String::from_utf8(bet.payload)?)
    });

    let config = SessionConfig::default().with_reply_timeout(Some(Duration::from_millis(50)));
    let mut session =
        blackjack_player::PlayerSession::with_config(PLAYER, common::player_addr(), player, config);

    let err = session.register(dealer_addr()).await.unwrap_err();
    assert!(matches!(err, SessionError::NoReply { .. }));
    // Let the late registration answer arrive before the next command.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let outcomes = session.place_bet(10).await?;
    match outcomes.as_slice() {
        [Outcome::Declined {
            subject: Subject::Bet,
            reason,
        }] => assert_eq!(reason, "insufficient funds"),
        other => panic!("unexpected outcomes {:?}", other),
    }
    assert_eq!(dealer.await??, "bet alice 10");
    Ok(())
}

#[tokio::test]
async fn failed_confirmation_keeps_the_dealt_card_outcome() -> anyhow::Result<()> {
    let config = SessionConfig::default().with_reply_timeout(Some(Duration::from_millis(50)));
    let (mut session, dealer) =
        session_with_config(vec!["registration successful", ACE_OF_SPADES], config);
    session.register(dealer_addr()).await?;

    let err = session.place_bet(10).await.unwrap_err();
    assert!(matches!(err, SessionError::Interrupted { .. }));
    match err.outcomes() {
        [Outcome::CardReceived(card)] => {
            assert_eq!(card, &Card::new(2, Rank::Ace, Suit::Spades))
        }
        other => panic!("unexpected outcomes {:?}", other),
    }
    assert!(matches!(err.cause(), SessionError::NoReply { .. }));
    assert!(!err.is_fatal());
    assert_eq!(session.hand().len(), 1);

    let received = finish(session, dealer).await;
    assert_eq!(received.len(), 3);
    Ok(())
}

#[test]
fn truncated_reply_is_not_fatal() {
    let truncated = SessionError::from(TransportError::Truncated { limit: 1024 });
    assert!(!truncated.is_fatal());
    let closed = SessionError::from(TransportError::Closed);
    assert!(closed.is_fatal());
    let interrupted = SessionError::Interrupted {
        outcomes: vec![Outcome::Registered],
        cause: Box::new(SessionError::from(TransportError::Closed)),
    };
    assert!(interrupted.is_fatal());
    assert_eq!(interrupted.to_string(), "transport closed");
}

#[tokio::test]
async fn vanished_dealer_is_a_transport_error() -> anyhow::Result<()> {
    let (player, dealer) =
        blackjack_player::InMemoryTransport::pair(common::player_addr(), dealer_addr());
    drop(dealer);
    let mut session = blackjack_player::PlayerSession::new(PLAYER, common::player_addr(), player);

    let err = session.register(dealer_addr()).await.unwrap_err();
    assert!(err.is_fatal());
    Ok(())
}

#[tokio::test]
async fn transport_is_usable_directly() -> anyhow::Result<()> {
    let (mut a, mut b) =
        blackjack_player::InMemoryTransport::pair(common::player_addr(), dealer_addr());
    assert_eq!(b.local_addr(), dealer_addr());
    a.send_to(b"ping", b.local_addr()).await?;
    let datagram = b.recv().await?;
    assert_eq!(datagram.payload, b"ping");
    assert_eq!(datagram.source, common::player_addr());
    Ok(())
}
