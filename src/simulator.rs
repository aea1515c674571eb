//! Monte Carlo Simulator — win rate of arrangements against random
//! opponents.
//!
//! Each iteration deals the opponent 13 cards from a fresh copy of the
//! remaining deck (partial Fisher-Yates), arranges them with the static
//! selector and settles row by row against every candidate. All candidates
//! face the same deals, so their win rates are directly comparable.
//!
//! The opponent plays the statically best foul-free split rather than a
//! simulated selection, so one arrangement per deal serves every candidate.
//!
//! ## Determinism
//!
//! Iteration `i` seeds its own Xoshiro256++ from a base seed (drawn from the
//! injected RNG) and `i`. Iterations run on the rayon pool in any order and
//! the tallies are summed, so a fixed seed gives identical results whatever
//! the thread count.

use std::cmp::Ordering;

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

use crate::arrangement::{Arrangement, HandTable, Position};
use crate::autowin;
use crate::cancel::CancelToken;
use crate::card::{Card, HAND_SIZE};
use crate::config::{EngineConfig, Scoring};
use crate::error::{Error, Result};
use crate::evaluator::{self, HandRank};
use crate::selector;

/// How a dealt opponent plays their 13 cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opponent {
    /// Special hand: takes every row.
    Natural,
    /// No foul-free arrangement exists: loses every row.
    Fouled,
    Rows([HandRank; 3]),
}

/// Points `ours` scores against `theirs` under `scoring`.
pub fn settle(scoring: &Scoring, ours: &[HandRank; 3], theirs: &Opponent) -> i32 {
    let our_royalties: i32 = Position::ALL
        .iter()
        .map(|&p| scoring.royalty(p, ours[p.index()].category()))
        .sum();

    let their = match theirs {
        Opponent::Natural => return -scoring.sweep(),
        Opponent::Fouled => return scoring.sweep() + our_royalties,
        Opponent::Rows(ranks) => ranks,
    };

    let mut total = our_royalties;
    let (mut won, mut lost) = (0, 0);
    for p in Position::ALL {
        let i = p.index();
        match evaluator::compare(&ours[i], &their[i]) {
            Ordering::Greater => {
                total += scoring.weight(p);
                won += 1;
            }
            Ordering::Less => {
                total -= scoring.weight(p);
                lost += 1;
            }
            Ordering::Equal => total += scoring.tie_points,
        }
        total -= scoring.royalty(p, their[i].category());
    }

    if won == 3 {
        total += scoring.scoop_bonus;
    } else if lost == 3 {
        total -= scoring.scoop_bonus;
    }
    total
}

/// Per-candidate win counts over the iterations that completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTally {
    pub wins: Vec<u32>,
    pub completed: u32,
    pub requested: u32,
}

impl FieldTally {
    pub fn win_rate(&self, candidate: usize) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.wins[candidate] as f64 / self.completed as f64
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.requested
    }
}

/// Validate a requested iteration count.
pub fn iteration_count(iterations: i64) -> Result<u32> {
    if iterations <= 0 {
        return Err(Error::InvalidIterationCount { iterations });
    }
    u32::try_from(iterations).map_err(|_| Error::TooManyIterations {
        iterations,
        max: u32::MAX,
    })
}

pub struct Simulator<'a> {
    config: &'a EngineConfig,
}

impl<'a> Simulator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Win rate of one arrangement over `iterations` random opponents.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        candidate: &Arrangement,
        deck: &[Card],
        iterations: i64,
        rng: &mut R,
    ) -> Result<f64> {
        let iterations = iteration_count(iterations)?;
        let tally = self.simulate_field(
            std::slice::from_ref(candidate),
            deck,
            iterations,
            rng,
            &CancelToken::new(),
        )?;
        Ok(tally.win_rate(0))
    }

    /// Score every candidate against the same opponent deals.
    ///
    /// Stops early when `cancel` trips; the tally then covers only the
    /// iterations that finished.
    pub fn simulate_field<R: Rng + ?Sized>(
        &self,
        candidates: &[Arrangement],
        deck: &[Card],
        iterations: u32,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<FieldTally> {
        if deck.len() < HAND_SIZE {
            return Err(Error::ShortDeck { size: deck.len() });
        }

        let base_seed: u64 = rng.gen();
        let n = candidates.len();
        let scoring = &self.config.scoring;

        let (completed, wins) = (0..iterations)
            .into_par_iter()
            .fold(
                || (0u32, vec![0u32; n]),
                |(mut done, mut wins), i| {
                    if cancel.is_cancelled() {
                        return (done, wins);
                    }
                    let opponent = self.deal(deck, base_seed, i);
                    for (w, candidate) in wins.iter_mut().zip(candidates) {
                        if settle(scoring, candidate.ranks(), &opponent) >= scoring.win_threshold {
                            *w += 1;
                        }
                    }
                    done += 1;
                    (done, wins)
                },
            )
            .reduce(
                || (0u32, vec![0u32; n]),
                |(done_a, mut wins_a), (done_b, wins_b)| {
                    for (a, b) in wins_a.iter_mut().zip(wins_b) {
                        *a += b;
                    }
                    (done_a + done_b, wins_a)
                },
            );

        log::debug!(
            "Simulated {}/{} deals for {} candidates",
            completed,
            iterations,
            n
        );

        Ok(FieldTally {
            wins,
            completed,
            requested: iterations,
        })
    }

    /// Deal and arrange the opponent for iteration `index`.
    fn deal(&self, deck: &[Card], base_seed: u64, index: u32) -> Opponent {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(
            base_seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );

        // Fisher-Yates partial shuffle (only shuffle what we need)
        let mut pool = deck.to_vec();
        for k in 0..HAND_SIZE {
            let swap_idx = rng.gen_range(k..pool.len());
            pool.swap(k, swap_idx);
        }

        let mut hand = [pool[0]; HAND_SIZE];
        hand.copy_from_slice(&pool[..HAND_SIZE]);
        self.opponent(&hand)
    }

    fn opponent(&self, hand: &[Card; HAND_SIZE]) -> Opponent {
        if autowin::detect(hand, &self.config.auto_wins).is_some() {
            return Opponent::Natural;
        }
        let table = HandTable::new(hand);
        match selector::best_static(&table, &self.config.selector.heuristic_weights) {
            Some(split) => Opponent::Rows([
                table.rank(split.front),
                table.rank(split.middle),
                table.rank(split.back()),
            ]),
            None => Opponent::Fouled,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{cards, remaining_deck};

    fn arrangement(front: &str, middle: &str, back: &str) -> Arrangement {
        Arrangement::from_rows(
            cards(front).try_into().unwrap(),
            cards(middle).try_into().unwrap(),
            cards(back).try_into().unwrap(),
        )
    }

    fn monster() -> Arrangement {
        arrangement("KC KD KH", "9C 9D 9H 9S 2C", "AS KS QS JS TS")
    }

    fn rags() -> Arrangement {
        arrangement("2C 3D 5H", "2D 4C 6S 8H 9D", "3C 4D 7S 9H JD")
    }

    fn deck_for(a: &Arrangement) -> Vec<Card> {
        let hand: Vec<Card> = a.cards().collect();
        remaining_deck(&hand)
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = EngineConfig::default();
        let sim = Simulator::new(&config);
        let a = monster();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        for bad in [0, -5] {
            match sim.simulate(&a, &deck_for(&a), bad, &mut rng) {
                Err(Error::InvalidIterationCount { iterations }) => assert_eq!(iterations, bad),
                other => panic!("expected InvalidIterationCount, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_iteration_count_bounds() {
        assert_eq!(iteration_count(1).unwrap(), 1);
        assert_eq!(iteration_count(u32::MAX as i64).unwrap(), u32::MAX);
        match iteration_count(5_000_000_000) {
            Err(Error::TooManyIterations { iterations, max }) => {
                assert_eq!(iterations, 5_000_000_000);
                assert_eq!(max, u32::MAX);
            }
            other => panic!("expected TooManyIterations, got {:?}", other),
        }
        assert!(matches!(
            iteration_count(i64::MIN),
            Err(Error::InvalidIterationCount { .. })
        ));
    }

    #[test]
    fn test_win_rate_variance_shrinks_with_iterations() {
        let config = EngineConfig::default();
        let sim = Simulator::new(&config);
        let a = arrangement("QC QD 4H", "9C 9D 9H 5S 2D", "AS JS 8S 6S 3S");
        assert!(a.is_foul_free());
        let deck = deck_for(&a);

        let variance = |iterations: i64| {
            let rates: Vec<f64> = (0..20u64)
                .map(|seed| {
                    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                    sim.simulate(&a, &deck, iterations, &mut rng).unwrap()
                })
                .collect();
            let mean = rates.iter().sum::<f64>() / rates.len() as f64;
            rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (rates.len() - 1) as f64
        };

        let low = variance(10);
        let high = variance(200);
        assert!(
            high < low,
            "variance should shrink: n=10 {:.5}, n=200 {:.5}",
            low,
            high
        );
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let config = EngineConfig::default();
        let sim = Simulator::new(&config);
        let a = rags();
        let deck = deck_for(&a);
        let run = |seed| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            sim.simulate(&a, &deck, 40, &mut rng).unwrap()
        };
        assert_eq!(run(9).to_bits(), run(9).to_bits());
    }

    #[test]
    fn test_strong_hand_beats_weak_hand() {
        let config = EngineConfig::default();
        let sim = Simulator::new(&config);
        let strong = monster();
        let weak = rags();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);

        let strong_rate = sim.simulate(&strong, &deck_for(&strong), 60, &mut rng).unwrap();
        let weak_rate = sim.simulate(&weak, &deck_for(&weak), 60, &mut rng).unwrap();
        assert!(strong_rate > 0.8, "monster should win most deals, got {:.3}", strong_rate);
        assert!(weak_rate < 0.3, "rags should lose most deals, got {:.3}", weak_rate);
        assert!((0.0..=1.0).contains(&strong_rate) && (0.0..=1.0).contains(&weak_rate));
    }

    #[test]
    fn test_field_shares_deals() {
        let config = EngineConfig::default();
        let sim = Simulator::new(&config);
        let a = rags();
        let deck = deck_for(&a);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(13);
        let tally = sim
            .simulate_field(&[a.clone(), a.clone()], &deck, 30, &mut rng, &CancelToken::new())
            .unwrap();
        assert!(tally.is_complete());
        assert_eq!(tally.wins[0], tally.wins[1], "identical candidates see identical deals");
    }

    #[test]
    fn test_cancelled_field_completes_nothing() {
        let config = EngineConfig::default();
        let sim = Simulator::new(&config);
        let a = rags();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let tally = sim
            .simulate_field(&[a.clone()], &deck_for(&a), 50, &mut rng, &cancel)
            .unwrap();
        assert_eq!(tally.completed, 0);
        assert!(!tally.is_complete());
        assert_eq!(tally.win_rate(0), 0.0);
    }

    #[test]
    fn test_short_deck_rejected() {
        let config = EngineConfig::default();
        let sim = Simulator::new(&config);
        let a = rags();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let short = cards("AS AD AH");
        assert!(matches!(
            sim.simulate(&a, &short, 5, &mut rng),
            Err(Error::ShortDeck { size: 3 })
        ));
    }

    #[test]
    fn test_settle_row_by_row() {
        let scoring = Scoring::default();
        let ours = monster();
        let theirs = rags();

        let beat = settle(&scoring, ours.ranks(), &Opponent::Rows(*theirs.ranks()));
        assert_eq!(beat, 3);
        let lost = settle(&scoring, theirs.ranks(), &Opponent::Rows(*ours.ranks()));
        assert_eq!(lost, -3);
        let tie = settle(&scoring, ours.ranks(), &Opponent::Rows(*ours.ranks()));
        assert_eq!(tie, 0);

        assert_eq!(settle(&scoring, ours.ranks(), &Opponent::Natural), -3);
        assert_eq!(settle(&scoring, theirs.ranks(), &Opponent::Fouled), 3);
    }

    #[test]
    fn test_settle_with_royalties_and_scoop() {
        let scoring = Scoring::traditional();
        let ours = monster();
        let theirs = rags();
        // 3 rows + 3 scoop + front trips 3 + middle quads 8 + back straight flush 5
        let points = settle(&scoring, ours.ranks(), &Opponent::Rows(*theirs.ranks()));
        assert_eq!(points, 3 + 3 + 3 + 8 + 5);
    }
}
