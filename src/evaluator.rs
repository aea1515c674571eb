//! Hand Evaluator — 3-card and 5-card Chinese Poker rows.
//!
//! Classifies a row by rank multiplicities, plus straight/flush checks for
//! 5-card rows, and produces a tie-break key so that two hands of the same
//! category compare deterministically.
//!
//! ## Hand Ranking (higher = better)
//!
//! | Category         | Key                                   | Rows      |
//! |------------------|---------------------------------------|-----------|
//! | Straight Flush   | top card (wheel = 5)                  | 5         |
//! | Four of a Kind   | quad rank, kicker                     | 5         |
//! | Full House       | trips rank, pair rank                 | 5         |
//! | Flush            | ranks, high to low                    | 5         |
//! | Straight         | top card (wheel = 5)                  | 5         |
//! | Three of a Kind  | trips rank, kickers                   | 3 and 5   |
//! | Two Pair         | high pair, low pair, kicker           | 5         |
//! | Pair             | pair rank, kickers                    | 3 and 5   |
//! | High Card        | ranks, high to low                    | 3 and 5   |
//!
//! Keys list every card's rank ordered by (count desc, rank desc), padded
//! with zeros, so a 3-card row compares against a 5-card row the same way
//! two 5-card rows do.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank};

#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    HighCard = 0,
    Pair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::Pair => "Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Category plus tie-break key. The derived order compares the category
/// first, then the key lexicographically.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandRank {
    category: Category,
    key: [u8; 5],
}

impl HandRank {
    pub fn category(&self) -> Category {
        self.category
    }

    /// Tie-break ranks (2..=14), zero-padded.
    pub fn key(&self) -> &[u8; 5] {
        &self.key
    }

    /// Monotone scalar strength: category index plus the key read as a
    /// base-15 fraction.
    pub fn strength(&self) -> f64 {
        let fraction = self
            .key
            .iter()
            .fold(0.0f64, |acc, &r| acc * 15.0 + r as f64)
            / 15f64.powi(5);
        self.category.index() as f64 + fraction
    }
}

impl Display for HandRank {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} {:?}", self.category, self.key)
    }
}

// ── Core Evaluator ──────────────────────────────────────────────────

/// Evaluate a 3-card or 5-card row.
///
/// Straights and flushes need five cards; a 3-card row tops out at
/// Three of a Kind.
pub fn evaluate(cards: &[Card]) -> HandRank {
    debug_assert!(
        cards.len() == 3 || cards.len() == 5,
        "rows hold 3 or 5 cards, got {}",
        cards.len()
    );

    let mut counts = [0u8; 15];
    for c in cards {
        counts[c.rank().value() as usize] += 1;
    }

    // (count, rank) groups, strongest first
    let mut groups: Vec<(u8, u8)> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &n)| n > 0)
        .map(|(r, &n)| (n, r as u8))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let mut key = [0u8; 5];
    let mut i = 0;
    for &(n, r) in &groups {
        for _ in 0..n {
            if i < key.len() {
                key[i] = r;
                i += 1;
            }
        }
    }

    let five = cards.len() == 5;
    let is_flush = five && cards.iter().all(|c| c.suit() == cards[0].suit());
    let straight_top = if five && groups.len() == 5 {
        straight_top(&groups)
    } else {
        None
    };

    let category = match (straight_top, is_flush) {
        (Some(_), true) => Category::StraightFlush,
        _ if groups[0].0 == 4 => Category::FourOfAKind,
        _ if groups[0].0 == 3 && groups.len() > 1 && groups[1].0 == 2 => Category::FullHouse,
        (_, true) => Category::Flush,
        (Some(_), false) => Category::Straight,
        _ if groups[0].0 == 3 => Category::ThreeOfAKind,
        _ if groups[0].0 == 2 && groups.len() > 1 && groups[1].0 == 2 => Category::TwoPair,
        _ if groups[0].0 == 2 => Category::Pair,
        _ => Category::HighCard,
    };

    if let Some(top) = straight_top {
        key = [top, 0, 0, 0, 0];
    }

    HandRank { category, key }
}

/// Top card of a 5-distinct-rank straight, the wheel counting as five-high.
/// `groups` must be sorted by rank descending.
fn straight_top(groups: &[(u8, u8)]) -> Option<u8> {
    let high = groups[0].1;
    let low = groups[groups.len() - 1].1;
    if high - low == 4 {
        return Some(high);
    }
    let wheel = [
        Rank::Ace.value(),
        Rank::Five.value(),
        Rank::Four.value(),
        Rank::Three.value(),
        Rank::Two.value(),
    ];
    if groups.iter().map(|&(_, r)| r).eq(wheel) {
        return Some(Rank::Five.value());
    }
    None
}

/// Total order over hand ranks; `Equal` means the rows tie.
pub fn compare(a: &HandRank, b: &HandRank) -> Ordering {
    a.cmp(b)
}

// ── Tests ───────────────────────────────────────────────────────────
