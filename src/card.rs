//! Cards as the dealer sends them, and the hand built from them.
//!
//! On the wire a card is a JSON object with named fields:
//!
//! ```text
//! {"deck":2,"rank":"Ace","suit":"Spades"}
//! ```
//!
//! Inside command payloads and log lines a card is written in its canonical
//! text form, `Card{deck=2, rank=Ace, suit=Spades}`, which the dealer uses to
//! correlate an action with the card it last dealt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CardTextError;

/// Identifier of the deck or shoe a card was drawn from.
///
/// The client never interprets it; dealers may use numbers or names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeckId {
    Number(i64),
    Name(String),
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckId::Number(n) => write!(f, "{}", n),
            DeckId::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for DeckId {
    fn from(n: i64) -> Self {
        DeckId::Number(n)
    }
}

impl From<&str> for DeckId {
    fn from(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => DeckId::Number(n),
            Err(_) => DeckId::Name(s.to_string()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    #[serde(alias = "CLUBS", alias = "clubs")]
    Clubs,
    #[serde(alias = "DIAMONDS", alias = "diamonds")]
    Diamonds,
    #[serde(alias = "HEARTS", alias = "hearts")]
    Hearts,
    #[serde(alias = "SPADES", alias = "spades")]
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn name(self) -> &'static str {
        match self {
            Suit::Clubs => "Clubs",
            Suit::Diamonds => "Diamonds",
            Suit::Hearts => "Hearts",
            Suit::Spades => "Spades",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Suit {
    type Err = CardTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Suit::ALL
            .into_iter()
            .find(|suit| suit.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CardTextError::UnknownSuit(s.to_string()))
    }
}

/// Rank of a card, Two through Ace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(alias = "TWO", alias = "2")]
    Two,
    #[serde(alias = "THREE", alias = "3")]
    Three,
    #[serde(alias = "FOUR", alias = "4")]
    Four,
    #[serde(alias = "FIVE", alias = "5")]
    Five,
    #[serde(alias = "SIX", alias = "6")]
    Six,
    #[serde(alias = "SEVEN", alias = "7")]
    Seven,
    #[serde(alias = "EIGHT", alias = "8")]
    Eight,
    #[serde(alias = "NINE", alias = "9")]
    Nine,
    #[serde(alias = "TEN", alias = "10")]
    Ten,
    #[serde(alias = "JACK", alias = "J")]
    Jack,
    #[serde(alias = "QUEEN", alias = "Q")]
    Queen,
    #[serde(alias = "KING", alias = "K")]
    King,
    #[serde(alias = "ACE", alias = "A")]
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rank::Two => "Two",
            Rank::Three => "Three",
            Rank::Four => "Four",
            Rank::Five => "Five",
            Rank::Six => "Six",
            Rank::Seven => "Seven",
            Rank::Eight => "Eight",
            Rank::Nine => "Nine",
            Rank::Ten => "Ten",
            Rank::Jack => "Jack",
            Rank::Queen => "Queen",
            Rank::King => "King",
            Rank::Ace => "Ace",
        }
    }

    /// Blackjack point value, counting an ace as 11.
    pub fn points(self) -> u32 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 11,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rank {
    type Err = CardTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CardTextError::UnknownRank(s.to_string()))
    }
}

/// A single card as dealt by the dealer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub deck: DeckId,
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(deck: impl Into<DeckId>, rank: Rank, suit: Suit) -> Self {
        Self {
            deck: deck.into(),
            rank,
            suit,
        }
    }

    /// Decode a card from its JSON wire form.
    ///
    /// Missing fields, unknown ranks or suits, and non-object input are all
    /// errors; nothing is defaulted.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Card{{deck={}, rank={}, suit={}}}",
            self.deck, self.rank, self.suit
        )
    }
}

impl FromStr for Card {
    type Err = CardTextError;

    /// Parse the canonical text form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .trim()
            .strip_prefix("Card{")
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| CardTextError::Shape(s.to_string()))?;

        let mut deck = None;
        let mut rank = None;
        let mut suit = None;
        for field in body.split(", ") {
            let (key, value) = field
                .split_once('=')
                .ok_or_else(|| CardTextError::Shape(s.to_string()))?;
            match key {
                "deck" => deck = Some(DeckId::from(value)),
                "rank" => rank = Some(value.parse()?),
                "suit" => suit = Some(value.parse()?),
                other => return Err(CardTextError::UnknownField(other.to_string())),
            }
        }

        Ok(Card {
            deck: deck.ok_or(CardTextError::MissingField("deck"))?,
            rank: rank.ok_or(CardTextError::MissingField("rank"))?,
            suit: suit.ok_or(CardTextError::MissingField("suit"))?,
        })
    }
}

/// Cards received from the dealer, in the order they arrived.
///
/// The hand only ever grows; split and surrender are resolved by the dealer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Most recently received card.
    pub fn last(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Blackjack total of every card held, with aces dropped from 11 to 1
    /// while the total is over 21.
    ///
    /// Informational only. After a split the dealer tracks the branches, so
    /// this is the total of everything dealt to the player.
    pub fn total(&self) -> u32 {
        let mut total: u32 = self.cards.iter().map(|c| c.rank.points()).sum();
        let mut soft_aces = self.cards.iter().filter(|c| c.rank == Rank::Ace).count();
        while total > 21 && soft_aces > 0 {
            total -= 10;
            soft_aces -= 1;
        }
        total
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cards.is_empty() {
            return f.write_str("(empty)");
        }
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} of {}", card.rank, card.suit)?;
        }
        write!(f, " [total {}]", self.total())
    }
}
