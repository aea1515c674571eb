//! Arrangement Enumerator — front/middle/back splits of 13 cards.
//!
//! ## Combinatorics
//!
//! | Row    | Cards | Choices      |
//! |--------|-------|--------------|
//! | Front  | 3     | C(13,3) = 286 |
//! | Middle | 5     | C(10,5) = 252 |
//! | Back   | 5     | remainder     |
//!
//! 286 × 252 = 72,072 raw splits. Splits are stored once as pairs of 13-bit
//! masks over the canonically sorted hand, so enumerating a hand is a scan
//! over a static table plus lookups into the hand's [`HandTable`].

use std::cmp::Ordering;
use std::sync::OnceLock;

use itertools::Itertools;

use crate::card::{Card, HAND_SIZE};
use crate::evaluator::{self, HandRank};

pub const FRONT_SIZE: usize = 3;
pub const ROW_SIZE: usize = 5;
pub const RAW_SPLITS: usize = 72_072;

const FULL_MASK: u16 = (1 << HAND_SIZE) - 1;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Position {
    Front = 0,
    Middle = 1,
    Back = 2,
}

impl Position {
    pub const ALL: [Position; 3] = [Position::Front, Position::Middle, Position::Back];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn size(self) -> usize {
        match self {
            Position::Front => FRONT_SIZE,
            Position::Middle | Position::Back => ROW_SIZE,
        }
    }
}

/// One raw split, as masks over the sorted hand. Back is the complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub front: u16,
    pub middle: u16,
}

impl Split {
    pub fn back(&self) -> u16 {
        FULL_MASK ^ self.front ^ self.middle
    }

    pub fn mask(&self, position: Position) -> u16 {
        match position {
            Position::Front => self.front,
            Position::Middle => self.middle,
            Position::Back => self.back(),
        }
    }
}

// ── Static Tables ───────────────────────────────────────────────────

struct Tables {
    splits: Vec<Split>,
    subsets: Vec<u16>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mask = |idx: &[usize]| idx.iter().fold(0u16, |m, &i| m | 1 << i);

        let splits: Vec<Split> = (0..HAND_SIZE)
            .combinations(FRONT_SIZE)
            .flat_map(|front| {
                let front = mask(&front);
                (0..HAND_SIZE)
                    .filter(move |&i| front & (1 << i) == 0)
                    .combinations(ROW_SIZE)
                    .map(move |middle| Split {
                        front,
                        middle: mask(&middle),
                    })
            })
            .collect();

        let subsets: Vec<u16> = (0..HAND_SIZE)
            .combinations(FRONT_SIZE)
            .chain((0..HAND_SIZE).combinations(ROW_SIZE))
            .map(|idx| mask(&idx))
            .collect();

        log::info!(
            "Split tables initialized ({} splits, {} row subsets)",
            splits.len(),
            subsets.len()
        );
        Tables { splits, subsets }
    })
}

/// Build the static split tables. Called once at startup; later calls are
/// no-ops.
pub fn init_tables() {
    tables();
}

/// All raw splits in lexicographic order.
pub fn splits() -> &'static [Split] {
    &tables().splits
}

// ── Hand Table ──────────────────────────────────────────────────────

/// A 13-card hand with every 3- and 5-card row evaluated once.
#[derive(Debug, Clone)]
pub struct HandTable {
    cards: [Card; HAND_SIZE],
    ranks: Vec<HandRank>,
}

impl HandTable {
    pub fn new(hand: &[Card; HAND_SIZE]) -> Self {
        let mut cards = *hand;
        cards.sort_unstable();

        let mut ranks = vec![HandRank::default(); 1 << HAND_SIZE];
        let mut row = Vec::with_capacity(ROW_SIZE);
        for &subset in &tables().subsets {
            row.clear();
            row.extend(members(&cards, subset));
            ranks[subset as usize] = evaluator::evaluate(&row);
        }

        Self { cards, ranks }
    }

    /// The hand in canonical order.
    pub fn cards(&self) -> &[Card; HAND_SIZE] {
        &self.cards
    }

    /// Rank of a 3- or 5-card row given as a mask over the sorted hand.
    pub fn rank(&self, mask: u16) -> HandRank {
        self.ranks[mask as usize]
    }

    pub fn is_foul_free(&self, split: &Split) -> bool {
        let front = self.rank(split.front);
        let middle = self.rank(split.middle);
        let back = self.rank(split.back());
        evaluator::compare(&back, &middle) != Ordering::Less
            && evaluator::compare(&middle, &front) != Ordering::Less
    }

    /// Every raw split, fouled or not.
    pub fn raw_splits(&self) -> impl Iterator<Item = Split> + '_ {
        splits().iter().copied()
    }

    /// Foul-free splits, lazily, in enumeration order.
    pub fn foul_free_splits(&self) -> impl Iterator<Item = Split> + '_ {
        self.raw_splits().filter(move |s| self.is_foul_free(s))
    }

    /// Foul-free arrangements, lazily, in enumeration order.
    pub fn arrangements(&self) -> impl Iterator<Item = Arrangement> + '_ {
        self.foul_free_splits().map(move |s| self.arrangement(&s))
    }

    /// Materialize a split. The split need not be foul-free.
    pub fn arrangement(&self, split: &Split) -> Arrangement {
        let mut front = [self.cards[0]; FRONT_SIZE];
        let mut middle = [self.cards[0]; ROW_SIZE];
        let mut back = [self.cards[0]; ROW_SIZE];
        fill(&mut front, members(&self.cards, split.front));
        fill(&mut middle, members(&self.cards, split.middle));
        fill(&mut back, members(&self.cards, split.back()));

        Arrangement {
            front,
            middle,
            back,
            ranks: [
                self.rank(split.front),
                self.rank(split.middle),
                self.rank(split.back()),
            ],
        }
    }
}

fn members(cards: &[Card; HAND_SIZE], mask: u16) -> impl Iterator<Item = Card> + '_ {
    (0..HAND_SIZE)
        .filter(move |&i| mask & (1 << i) != 0)
        .map(move |i| cards[i])
}

fn fill(slots: &mut [Card], cards: impl Iterator<Item = Card>) {
    for (slot, card) in slots.iter_mut().zip(cards) {
        *slot = card;
    }
}

// ── Arrangement ─────────────────────────────────────────────────────

/// Three rows partitioning a 13-card hand, with each row's rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrangement {
    front: [Card; FRONT_SIZE],
    middle: [Card; ROW_SIZE],
    back: [Card; ROW_SIZE],
    ranks: [HandRank; 3],
}

impl Arrangement {
    /// Build from explicit rows, evaluating each.
    pub fn from_rows(
        front: [Card; FRONT_SIZE],
        middle: [Card; ROW_SIZE],
        back: [Card; ROW_SIZE],
    ) -> Self {
        let ranks = [
            evaluator::evaluate(&front),
            evaluator::evaluate(&middle),
            evaluator::evaluate(&back),
        ];
        Self {
            front,
            middle,
            back,
            ranks,
        }
    }

    pub fn front(&self) -> &[Card] {
        &self.front
    }

    pub fn middle(&self) -> &[Card] {
        &self.middle
    }

    pub fn back(&self) -> &[Card] {
        &self.back
    }

    pub fn row(&self, position: Position) -> &[Card] {
        match position {
            Position::Front => &self.front,
            Position::Middle => &self.middle,
            Position::Back => &self.back,
        }
    }

    pub fn rank(&self, position: Position) -> HandRank {
        self.ranks[position.index()]
    }

    pub fn ranks(&self) -> &[HandRank; 3] {
        &self.ranks
    }

    /// back ≥ middle ≥ front
    pub fn is_foul_free(&self) -> bool {
        let [front, middle, back] = &self.ranks;
        evaluator::compare(back, middle) != Ordering::Less
            && evaluator::compare(middle, front) != Ordering::Less
    }

    /// All 13 cards, front then middle then back.
    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.front
            .iter()
            .chain(self.middle.iter())
            .chain(self.back.iter())
            .copied()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{cards, remaining_deck};
    use crate::evaluator::Category;
    use rand::prelude::*;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::collections::HashSet;

    fn hand(s: &str) -> [Card; HAND_SIZE] {
        cards(s).try_into().unwrap()
    }

    fn random_hand(rng: &mut Xoshiro256PlusPlus) -> [Card; HAND_SIZE] {
        let mut deck = remaining_deck(&[]);
        deck.shuffle(rng);
        deck[..HAND_SIZE].try_into().unwrap()
    }

    #[test]
    fn test_split_table_size() {
        assert_eq!(splits().len(), RAW_SPLITS);
        let distinct: HashSet<(u16, u16)> = splits().iter().map(|s| (s.front, s.middle)).collect();
        assert_eq!(distinct.len(), RAW_SPLITS, "splits must be unique");
        for s in splits() {
            assert_eq!(s.front.count_ones(), 3);
            assert_eq!(s.middle.count_ones(), 5);
            assert_eq!(s.back().count_ones(), 5);
            assert_eq!(s.front & s.middle, 0);
        }
    }

    #[test]
    fn test_enumeration_yields_only_foul_free() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(21);
        for _ in 0..4 {
            let table = HandTable::new(&random_hand(&mut rng));
            let mut count = 0;
            for a in table.arrangements() {
                assert!(a.rank(Position::Back) >= a.rank(Position::Middle));
                assert!(a.rank(Position::Middle) >= a.rank(Position::Front));
                count += 1;
            }
            assert!(count > 0, "every hand has a foul-free arrangement");
            assert!(count < RAW_SPLITS / 2, "only a fraction should survive, got {}", count);
        }
    }

    #[test]
    fn test_arrangements_partition_the_hand() {
        let cards = hand("AS KD QH JC TS 9D 8H 7C 6S 5D 4H 3C 2S");
        let original: HashSet<Card> = cards.iter().copied().collect();
        let table = HandTable::new(&cards);
        for a in table.arrangements().step_by(97) {
            let seen: Vec<Card> = a.cards().collect();
            let unique: HashSet<Card> = seen.iter().copied().collect();
            assert_eq!(seen.len(), 13);
            assert_eq!(unique, original);
            assert_eq!(a.front().len(), 3);
            assert_eq!(a.middle().len(), 5);
            assert_eq!(a.back().len(), 5);
        }
    }

    #[test]
    fn test_enumeration_is_deterministic_and_restartable() {
        let cards = hand("2C 2D 2H 7S 7D 3C 3D 3H AH AC AD AS KH");
        let table = HandTable::new(&cards);
        let first: Vec<Arrangement> = table.arrangements().take(50).collect();
        let second: Vec<Arrangement> = table.arrangements().take(50).collect();
        assert_eq!(first, second);

        // Input order does not matter
        let mut shuffled = cards;
        shuffled.reverse();
        let other = HandTable::new(&shuffled);
        assert!(other.arrangements().take(50).eq(first.into_iter()));
    }

    #[test]
    fn test_example_arrangement_is_foul_free() {
        let a = Arrangement::from_rows(
            cards("2C 2D 2H").try_into().unwrap(),
            cards("7S 7D 3C 3D 3H").try_into().unwrap(),
            cards("AH AC AD AS KH").try_into().unwrap(),
        );
        assert_eq!(a.rank(Position::Front).category(), Category::ThreeOfAKind);
        assert_eq!(a.rank(Position::Middle).category(), Category::FullHouse);
        assert_eq!(a.rank(Position::Back).category(), Category::FourOfAKind);
        assert!(a.is_foul_free());

        let table = HandTable::new(&hand("2C 2D 2H 7S 7D 3C 3D 3H AH AC AD AS KH"));
        let sorted = |s: &str| {
            let mut row = cards(s);
            row.sort();
            row
        };
        assert!(
            table.arrangements().any(|b| {
                b.front() == sorted("2C 2D 2H").as_slice()
                    && b.middle() == sorted("7S 7D 3C 3D 3H").as_slice()
                    && b.back() == sorted("AH AC AD AS KH").as_slice()
            }),
            "enumerator should produce the example arrangement"
        );
    }

    #[test]
    fn test_fouled_split_is_rejected() {
        let a = Arrangement::from_rows(
            cards("AC AD AH").try_into().unwrap(),
            cards("2C 5D 7H 9S JC").try_into().unwrap(),
            cards("KC KD 4H 6S 8C").try_into().unwrap(),
        );
        assert!(!a.is_foul_free(), "front trips over high-card middle is a foul");
    }
}
