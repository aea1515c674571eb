//! Auto-Win Detector — special 13-card hands that win outright.
//!
//! Detection runs on rank and suit counts only, so it is cheap enough to
//! check every simulated opponent as well as the player. Which hands count,
//! their labels and their precedence come from the catalog in
//! [`EngineConfig`](crate::config::EngineConfig).

use serde::{Deserialize, Serialize};

use crate::arrangement::{HandTable, Position, Split};
use crate::card::{Card, Suit, HAND_SIZE};
use crate::evaluator::Category;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoWinKind {
    /// 13 distinct ranks, one suit.
    SameSuitDragon,
    /// 13 distinct ranks.
    Dragon,
    /// Six pairs; quads count as two.
    SixPairs,
    /// Front, middle and back are all straights.
    ThreeStraights,
    /// Front, middle and back are each single-suited.
    ThreeFlushes,
}

/// One catalog entry. Higher priority wins; equal priorities fall back to
/// listed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoWinRule {
    pub kind: AutoWinKind,
    pub label: String,
    pub priority: u32,
}

impl AutoWinRule {
    pub fn new(kind: AutoWinKind, label: &str, priority: u32) -> Self {
        Self {
            kind,
            label: label.to_string(),
            priority,
        }
    }
}

pub fn default_catalog() -> Vec<AutoWinRule> {
    vec![
        AutoWinRule::new(AutoWinKind::SameSuitDragon, "Same-Suit Dragon", 100),
        AutoWinRule::new(AutoWinKind::Dragon, "Dragon", 90),
        AutoWinRule::new(AutoWinKind::SixPairs, "Six Pairs", 60),
        AutoWinRule::new(AutoWinKind::ThreeStraights, "Three Straights", 50),
        AutoWinRule::new(AutoWinKind::ThreeFlushes, "Three Flushes", 40),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoWin {
    pub kind: AutoWinKind,
    pub label: String,
}

/// First matching catalog rule by precedence, if any.
pub fn detect(hand: &[Card; HAND_SIZE], catalog: &[AutoWinRule]) -> Option<AutoWin> {
    let counts = Counts::new(hand);

    let mut ordered: Vec<&AutoWinRule> = catalog.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    ordered
        .into_iter()
        .find(|rule| counts.matches(rule.kind))
        .map(|rule| AutoWin {
            kind: rule.kind,
            label: rule.label.clone(),
        })
}

/// First foul-free split that shows the special hand row by row.
///
/// Only row-shaped hands have a witness; the caller picks a display
/// arrangement for the rest.
pub fn witness(table: &HandTable, kind: AutoWinKind) -> Option<Split> {
    let row_ok: fn(&HandTable, u16, Position) -> bool = match kind {
        AutoWinKind::ThreeFlushes => |t, mask, _| single_suited(t, mask),
        AutoWinKind::ThreeStraights => |t, mask, position| match position {
            Position::Front => three_card_run(t, mask),
            _ => matches!(
                t.rank(mask).category(),
                Category::Straight | Category::StraightFlush
            ),
        },
        _ => return None,
    };

    table.foul_free_splits().find(|split| {
        Position::ALL
            .iter()
            .all(|&p| row_ok(table, split.mask(p), p))
    })
}

fn single_suited(table: &HandTable, mask: u16) -> bool {
    let mut suits = row_cards(table, mask).map(|c| c.suit());
    match suits.next() {
        Some(first) => suits.all(|s| s == first),
        None => false,
    }
}

fn three_card_run(table: &HandTable, mask: u16) -> bool {
    let mut counts = [0u8; 15];
    for c in row_cards(table, mask) {
        counts[c.rank().value() as usize] += 1;
    }
    (3..=14).any(|top| window(top, 3).iter().all(|&r| counts[r] == 1))
}

fn row_cards(table: &HandTable, mask: u16) -> impl Iterator<Item = Card> + '_ {
    table
        .cards()
        .iter()
        .enumerate()
        .filter(move |&(i, _)| mask & (1 << i) != 0)
        .map(|(_, &c)| c)
}

/// Ranks of a straight of `len` cards topped by `top`; an ace below two
/// plays low.
fn window(top: usize, len: usize) -> Vec<usize> {
    (top + 1 - len..=top)
        .map(|r| if r == 1 { 14 } else { r })
        .collect()
}

// ── Predicates ──────────────────────────────────────────────────────

struct Counts {
    ranks: [u8; 15],
    suits: [u8; 4],
}

impl Counts {
    fn new(hand: &[Card]) -> Self {
        let mut ranks = [0u8; 15];
        let mut suits = [0u8; 4];
        for c in hand {
            ranks[c.rank().value() as usize] += 1;
            suits[c.suit().index()] += 1;
        }
        Self { ranks, suits }
    }

    fn matches(&self, kind: AutoWinKind) -> bool {
        match kind {
            AutoWinKind::SameSuitDragon => {
                self.is_dragon() && self.suits.iter().any(|&n| n as usize == HAND_SIZE)
            }
            AutoWinKind::Dragon => self.is_dragon(),
            AutoWinKind::SixPairs => self.ranks.iter().map(|&n| n / 2).sum::<u8>() == 6,
            AutoWinKind::ThreeStraights => self.has_three_straights(),
            AutoWinKind::ThreeFlushes => self.has_three_flushes(),
        }
    }

    fn is_dragon(&self) -> bool {
        self.ranks[2..=14].iter().all(|&n| n == 1)
    }

    /// Rows of 3, 5 and 5 can each be given one suit.
    fn has_three_flushes(&self) -> bool {
        Suit::ALL.iter().any(|&front| {
            Suit::ALL.iter().any(|&middle| {
                Suit::ALL.iter().any(|&back| {
                    let mut need = [0u8; 4];
                    need[front.index()] += 3;
                    need[middle.index()] += 5;
                    need[back.index()] += 5;
                    need == self.suits
                })
            })
        })
    }

    /// Two five-card runs plus a three-card run use up every rank exactly.
    fn has_three_straights(&self) -> bool {
        for back in 5..=14 {
            let mut after_back = self.ranks;
            if !take(&mut after_back, &window(back, 5)) {
                continue;
            }
            for middle in 5..=back {
                let mut after_middle = after_back;
                if !take(&mut after_middle, &window(middle, 5)) {
                    continue;
                }
                for front in 3..=14 {
                    let mut rest = after_middle;
                    if take(&mut rest, &window(front, 3)) && rest.iter().all(|&n| n == 0) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn take(counts: &mut [u8; 15], ranks: &[usize]) -> bool {
    for &r in ranks {
        if counts[r] == 0 {
            return false;
        }
        counts[r] -= 1;
    }
    true
}

// ── Tests ───────────────────────────────────────────────────────────
