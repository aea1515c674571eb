//! Arrangement Selector — picks the split to play.
//!
//! ## Policy
//!
//! 1. **Static pass**: every foul-free split gets a heuristic score, the
//!    weighted sum of its rows' [`HandRank::strength`].
//! 2. **Shortlist**: with at most `full_search_cutoff` foul-free splits all
//!    of them go forward, otherwise the top `shortlist_size` by score.
//! 3. **Simulation**: the shortlist is played against the same random
//!    opponents and the highest win rate is chosen.
//!
//! Ties go to the stronger back row, then the higher static score, then
//! enumeration order.

use std::cmp::Ordering;

use rand::Rng;

use crate::arrangement::{Arrangement, HandTable, Position, Split};
use crate::cancel::CancelToken;
use crate::card::{Card, HAND_SIZE};
use crate::config::{CancelPolicy, EngineConfig};
use crate::error::{Error, Result};
use crate::evaluator::HandRank;
use crate::simulator::Simulator;

/// Weighted sum of row strengths; weights are front, middle, back.
pub fn static_score(ranks: &[HandRank; 3], weights: &[f64; 3]) -> f64 {
    ranks
        .iter()
        .zip(weights)
        .map(|(rank, w)| rank.strength() * w)
        .sum()
}

/// Highest-scoring foul-free split; the first one wins a tie.
pub fn best_static(table: &HandTable, weights: &[f64; 3]) -> Option<Split> {
    let mut best: Option<(Split, f64)> = None;
    for split in table.foul_free_splits() {
        let score = static_score(&split_ranks(table, &split), weights);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((split, score));
        }
    }
    best.map(|(split, _)| split)
}

fn split_ranks(table: &HandTable, split: &Split) -> [HandRank; 3] {
    [
        table.rank(split.front),
        table.rank(split.middle),
        table.rank(split.back()),
    ]
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub arrangement: Arrangement,
    pub win_rate: f64,
    /// Simulation iterations that finished before any cancellation.
    pub completed_iterations: u32,
    /// Number of arrangements that were simulated.
    pub candidates: usize,
}

struct Candidate {
    arrangement: Arrangement,
    score: f64,
}

pub struct Selector<'a> {
    config: &'a EngineConfig,
}

impl<'a> Selector<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Choose the arrangement with the best simulated win rate.
    pub fn select<R: Rng + ?Sized>(
        &self,
        hand: &[Card; HAND_SIZE],
        deck: &[Card],
        iterations: u32,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<Selection> {
        let table = HandTable::new(hand);
        let candidates = self.shortlist(&table)?;

        let tally = if cancel.is_cancelled() {
            None
        } else {
            let arrangements: Vec<Arrangement> =
                candidates.iter().map(|c| c.arrangement.clone()).collect();
            Some(Simulator::new(self.config).simulate_field(
                &arrangements,
                deck,
                iterations,
                rng,
                cancel,
            )?)
        };

        let completed = tally.as_ref().map_or(0, |t| t.completed);
        if completed < iterations && self.config.cancel_policy == CancelPolicy::RequireComplete {
            return Err(Error::TimedOut {
                completed,
                requested: iterations,
            });
        }

        let wins = |i: usize| tally.as_ref().map_or(0, |t| t.wins[i]);
        let mut best = 0;
        for i in 1..candidates.len() {
            let order = wins(i).cmp(&wins(best)).then_with(|| {
                compare_candidates(&candidates[i], &candidates[best])
            });
            if order == Ordering::Greater {
                best = i;
            }
        }

        for (i, c) in candidates.iter().enumerate() {
            log::trace!("candidate {} score {:.4} wins {}", i, c.score, wins(i));
        }

        let win_rate = tally.as_ref().map_or(0.0, |t| t.win_rate(best));
        log::debug!(
            "Selected candidate {} of {} (win rate {:.4}, {}/{} iterations)",
            best,
            candidates.len(),
            win_rate,
            completed,
            iterations
        );

        let n = candidates.len();
        let arrangement = candidates
            .into_iter()
            .nth(best)
            .map(|c| c.arrangement)
            .ok_or_else(|| Error::Internal("empty candidate list".into()))?;

        Ok(Selection {
            arrangement,
            win_rate,
            completed_iterations: completed,
            candidates: n,
        })
    }

    /// Foul-free arrangements that go on to simulation, in enumeration order
    /// when everything fits under the cutoff, by static score otherwise.
    fn shortlist(&self, table: &HandTable) -> Result<Vec<Candidate>> {
        let settings = &self.config.selector;
        let weights = &settings.heuristic_weights;

        let mut scored: Vec<(Split, f64)> = table
            .foul_free_splits()
            .map(|split| {
                let score = static_score(&split_ranks(table, &split), weights);
                (split, score)
            })
            .collect();

        if scored.is_empty() {
            return Err(Error::Internal("hand has no foul-free arrangement".into()));
        }

        let total = scored.len();
        if total > settings.full_search_cutoff {
            // stable: equal scores keep enumeration order
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            scored.truncate(settings.shortlist_size);
        }
        log::debug!("{} foul-free arrangements, {} shortlisted", total, scored.len());

        Ok(scored
            .into_iter()
            .map(|(split, score)| {
                let arrangement = table.arrangement(&split);
                debug_assert!(arrangement.is_foul_free(), "fouled arrangement shortlisted");
                Candidate { arrangement, score }
            })
            .collect())
    }
}

/// Tie-break between equal win counts: stronger back row, then higher
/// static score. `Equal` keeps the earlier candidate.
fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    a.arrangement
        .rank(Position::Back)
        .cmp(&b.arrangement.rank(Position::Back))
        .then_with(|| a.score.total_cmp(&b.score))
}

/// Static best arrangement, used when no simulation runs.
pub fn best_static_arrangement(table: &HandTable, weights: &[f64; 3]) -> Option<Arrangement> {
    best_static(table, weights).map(|split| table.arrangement(&split))
}

// ── Tests ───────────────────────────────────────────────────────────
