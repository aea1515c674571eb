//! Card model: ranks, suits, token parsing and the remaining deck.
//!
//! ## Card Encoding
//!
//! Each card also has a dense ID 0-51:
//!   - `rank = (id >> 2) + 2`  (2=2, ..., 14=A)
//!   - `suit = id & 3`         (0=♣, 1=♦, 2=♥, 3=♠)
//!
//! Ordering is by rank, then suit, which is also the ID order.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

pub const HAND_SIZE: usize = 13;
pub const DECK_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
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

    /// Numeric value, 2 through 14.
    pub fn value(self) -> u8 {
        self as u8
    }

    fn from_token(s: &str) -> Option<Rank> {
        let rank = match s {
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "T" | "10" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            _ => return None,
        };
        Some(rank)
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let c = match self {
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
            r => char::from(b'0' + r.value()),
        };
        write!(f, "{}", c)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn index(self) -> usize {
        self as usize
    }

    fn from_token(s: &str) -> Option<Suit> {
        let suit = match s {
            "C" | "♣" => Suit::Clubs,
            "D" | "♦" => Suit::Diamonds,
            "H" | "♥" => Suit::Hearts,
            "S" | "♠" => Suit::Spades,
            _ => return None,
        };
        Some(suit)
    }
}

impl Display for Suit {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let c = match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        };
        write!(f, "{}", c)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    /// Dense ID in `0..52`, increasing with card order.
    pub fn id(&self) -> u8 {
        (self.rank.value() - 2) * 4 + self.suit as u8
    }

    pub fn from_id(id: u8) -> Option<Card> {
        if id as usize >= DECK_SIZE {
            return None;
        }
        let rank = Rank::ALL[(id >> 2) as usize];
        let suit = Suit::ALL[(id & 3) as usize];
        Some(Card::new(rank, suit))
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl std::str::FromStr for Card {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

/// Parse a single card token such as `"Ah"`, `"td"` or `"10S"`.
pub fn parse(token: &str) -> Result<Card> {
    let normalized = token.trim().to_uppercase();
    let invalid = || Error::InvalidCard {
        token: token.to_string(),
    };

    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() != 2 && chars.len() != 3 {
        return Err(invalid());
    }

    let (rank_part, suit_part) = chars.split_at(chars.len() - 1);
    let rank_token: String = rank_part.iter().collect();
    let suit_token: String = suit_part.iter().collect();

    let rank = Rank::from_token(&rank_token).ok_or_else(invalid)?;
    let suit = Suit::from_token(&suit_token).ok_or_else(invalid)?;
    Ok(Card::new(rank, suit))
}

/// Parse a full 13-card hand.
///
/// Tokens that are empty after trimming are ignored; the count is checked
/// before any token is parsed.
pub fn parse_hand<S: AsRef<str>>(tokens: &[S]) -> Result<[Card; HAND_SIZE]> {
    let tokens: Vec<&str> = tokens
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.len() != HAND_SIZE {
        return Err(Error::WrongCount {
            count: tokens.len(),
        });
    }

    let mut hand = [Card::new(Rank::Two, Suit::Clubs); HAND_SIZE];
    hand.copy_from_slice(&parse_distinct(&tokens)?);
    Ok(hand)
}

/// Parse tokens into distinct cards, in input order.
pub fn parse_distinct<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Card>> {
    let mut seen = HashSet::with_capacity(tokens.len());
    let mut cards = Vec::with_capacity(tokens.len());
    for token in tokens {
        let card = parse(token.as_ref())?;
        if !seen.insert(card) {
            return Err(Error::DuplicateCard {
                card: card.to_string(),
            });
        }
        cards.push(card);
    }
    Ok(cards)
}

/// All cards not in `hand`, in canonical order.
pub fn remaining_deck(hand: &[Card]) -> Vec<Card> {
    let mut used = [false; DECK_SIZE];
    for c in hand {
        used[c.id() as usize] = true;
    }

    (0..DECK_SIZE as u8)
        .filter(|&id| !used[id as usize])
        .filter_map(Card::from_id)
        .collect()
}

/// Test helper: parse a whitespace-separated list of tokens.
#[cfg(test)]
pub(crate) fn cards(s: &str) -> Vec<Card> {
    s.split_whitespace().map(|t| parse(t).unwrap()).collect()
}

// ── Tests ───────────────────────────────────────────────────────────
