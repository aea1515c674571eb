//! Simulation Service — turns a request into a result.
//!
//! ## Pipeline
//!
//! 1. **Validate**: parse the 13 cards and the iteration count
//! 2. **Auto-win**: a special hand short-circuits with win rate 1.0
//! 3. **Select**: shortlist foul-free arrangements and simulate them
//! 4. **Render**: rows as canonical card tokens, highest card first

use std::time::{Duration, Instant};

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::arrangement::{self, Arrangement, HandTable};
use crate::autowin;
use crate::cancel::CancelToken;
use crate::card::{self, Card};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::selector::{self, Selector};
use crate::simulator;
use crate::{SimulateRequest, SimulateResponse};

pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        arrangement::init_tables();
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn simulate(&self, request: &SimulateRequest) -> Result<SimulateResponse> {
        self.simulate_with_cancel(request, &CancelToken::new())
    }

    /// Run a request; `cancel` is combined with the configured timeout.
    pub fn simulate_with_cancel(
        &self,
        request: &SimulateRequest,
        cancel: &CancelToken,
    ) -> Result<SimulateResponse> {
        self.run(request, cancel).map(|outcome| outcome.response)
    }

    fn run(&self, request: &SimulateRequest, cancel: &CancelToken) -> Result<Outcome> {
        let start = Instant::now();

        // ── Step 1: Validate ────────────────────────────────────────────
        let hand = card::parse_hand(&request.my_cards)?;
        let iterations = simulator::iteration_count(request.iterations)?;

        let cancel = cancel.with_deadline(self.config.timeout_ms.map(Duration::from_millis));
        let seed = request
            .seed
            .map(|s| s as u64)
            .or(self.config.seed)
            .unwrap_or_else(rand::random);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

        // ── Step 2: Auto-win ────────────────────────────────────────────
        if let Some(win) = autowin::detect(&hand, &self.config.auto_wins) {
            let table = HandTable::new(&hand);
            let shown = autowin::witness(&table, win.kind)
                .map(|split| table.arrangement(&split))
                .or_else(|| {
                    selector::best_static_arrangement(
                        &table,
                        &self.config.selector.heuristic_weights,
                    )
                })
                .ok_or_else(|| Error::Internal("hand has no foul-free arrangement".into()))?;

            log::info!(
                "Auto-win {:?} in {:.3}ms",
                win.label,
                start.elapsed().as_secs_f64() * 1e3
            );
            return Ok(Outcome {
                response: render(request.iterations, 1.0, &shown, Some(win.label)),
                completed_iterations: 0,
            });
        }

        // ── Step 3: Select ──────────────────────────────────────────────
        let deck = card::remaining_deck(&hand);
        let selection =
            Selector::new(&self.config).select(&hand, &deck, iterations, &mut rng, &cancel)?;

        log::info!(
            "Simulated {}/{} iterations over {} candidates in {:.3}ms, win rate {:.4}",
            selection.completed_iterations,
            iterations,
            selection.candidates,
            start.elapsed().as_secs_f64() * 1e3,
            selection.win_rate
        );

        // ── Step 4: Render ──────────────────────────────────────────────
        Ok(Outcome {
            response: render(
                request.iterations,
                selection.win_rate,
                &selection.arrangement,
                None,
            ),
            completed_iterations: selection.completed_iterations,
        })
    }
}

/// A response plus the number of simulated deals behind it.
struct Outcome {
    response: SimulateResponse,
    completed_iterations: u32,
}

fn render(
    iterations: i64,
    win_rate: f64,
    arrangement: &Arrangement,
    auto_win: Option<String>,
) -> SimulateResponse {
    let front = render_row(arrangement.front());
    let middle = render_row(arrangement.middle());
    let back = render_row(arrangement.back());
    let best_arrangement = front
        .iter()
        .chain(middle.iter())
        .chain(back.iter())
        .cloned()
        .collect();

    SimulateResponse {
        iterations,
        win_rate,
        best_arrangement,
        front,
        middle,
        back,
        auto_win,
    }
}

fn render_row(cards: &[Card]) -> Vec<String> {
    let mut row = cards.to_vec();
    row.sort_unstable_by(|a, b| b.cmp(a));
    row.iter().map(Card::to_string).collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cards: &str, iterations: i64, seed: Option<i64>) -> SimulateRequest {
        SimulateRequest {
            my_cards: cards.split_whitespace().map(String::from).collect(),
            iterations,
            seed,
        }
    }

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_all_spades_auto_wins() {
        let outcome = engine()
            .run(
                &request("AS KS QS JS TS 9S 8S 7S 6S 5S 4S 3S 2S", 500, None),
                &CancelToken::new(),
            )
            .unwrap();
        assert_eq!(outcome.completed_iterations, 0, "auto-win skips simulation");
        let resp = outcome.response;
        assert_eq!(resp.auto_win.as_deref(), Some("Same-Suit Dragon"));
        assert_eq!(resp.win_rate, 1.0);
        assert_eq!(resp.iterations, 500);
        assert_eq!(resp.front.len(), 3);
        assert_eq!(resp.middle.len(), 5);
        assert_eq!(resp.back.len(), 5);
    }

    #[test]
    fn test_three_flushes_shows_suited_rows() {
        let resp = engine()
            .simulate(&request("2H 7H 9H 2S 5S 8S JS KS 4D 6D TD QD AD", 10, Some(1)))
            .unwrap();
        assert_eq!(resp.auto_win.as_deref(), Some("Three Flushes"));
        assert_eq!(resp.front, vec!["9H", "7H", "2H"]);
        assert_eq!(resp.middle, vec!["KS", "JS", "8S", "5S", "2S"]);
        assert_eq!(resp.back, vec!["AD", "QD", "TD", "6D", "4D"]);
    }

    #[test]
    fn test_zero_iterations_rejected_before_work() {
        match engine().simulate(&request("AS KD QH JC 9S 9D 8H 7C 6S 5D 4H 2C 2S", 0, None)) {
            Err(Error::InvalidIterationCount { iterations: 0 }) => {}
            other => panic!("expected InvalidIterationCount, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_card_rejected() {
        match engine().simulate(&request("AH AH QH JC 9S 9D 8H 7C 6S 5D 4H 2C 2S", 10, None)) {
            Err(Error::DuplicateCard { card }) => assert_eq!(card, "AH"),
            other => panic!("expected DuplicateCard, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_count_and_bad_token() {
        assert!(matches!(
            engine().simulate(&request("AH KH", 10, None)),
            Err(Error::WrongCount { count: 2 })
        ));
        assert!(matches!(
            engine().simulate(&request("AH KH QH JH 9S 9D 8H 7C 6S 5D 4H 2C 1S", 10, None)),
            Err(Error::InvalidCard { .. })
        ));
    }

    #[test]
    fn test_regular_hand_runs_every_iteration() {
        let outcome = engine()
            .run(
                &request("AS KD QH JC 9S 9D 8H 7C 6S 5D 4H 2C 2S", 16, Some(2)),
                &CancelToken::new(),
            )
            .unwrap();
        assert_eq!(outcome.completed_iterations, 16);
        assert!(outcome.response.auto_win.is_none());
    }

    #[test]
    fn test_response_shape() {
        let resp = engine()
            .simulate(&request("AS KD QH JC 9S 9D 8H 7C 6S 5D 4H 2C 2S", 16, Some(4)))
            .unwrap();
        assert!(resp.auto_win.is_none());
        assert!((0.0..=1.0).contains(&resp.win_rate));
        assert_eq!(resp.best_arrangement.len(), 13);
        let concat: Vec<String> = resp
            .front
            .iter()
            .chain(&resp.middle)
            .chain(&resp.back)
            .cloned()
            .collect();
        assert_eq!(resp.best_arrangement, concat);

        let rows: Vec<Card> = concat.iter().map(|t| card::parse(t).unwrap()).collect();
        let a = Arrangement::from_rows(
            rows[..3].try_into().unwrap(),
            rows[3..8].try_into().unwrap(),
            rows[8..].try_into().unwrap(),
        );
        assert!(a.is_foul_free());
    }

    #[test]
    fn test_fixed_seed_is_byte_identical() {
        let engine = engine();
        let req = request("10h 9c 9d 8s 7h 6c kd qs js 3h 3c 2d 4s", 16, Some(99));
        let a = serde_json::to_string(&engine.simulate(&req).unwrap()).unwrap();
        let b = serde_json::to_string(&engine.simulate(&req).unwrap()).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"winRate\""));
        assert!(!a.contains("autoWin"), "absent autoWin is omitted");
    }

    #[test]
    fn test_configured_seed_used_without_request_seed() {
        let config = EngineConfig {
            seed: Some(5),
            ..EngineConfig::default()
        };
        let engine = Engine::new(config).unwrap();
        let req = request("AS KD QH JC 9S 9D 8H 7C 6S 5D 4H 2C 2S", 12, None);
        let a = engine.simulate(&req).unwrap();
        let b = engine.simulate(&req).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_timeout_best_so_far_still_answers() {
        let config = EngineConfig {
            timeout_ms: Some(0),
            ..EngineConfig::default()
        };
        let engine = Engine::new(config).unwrap();
        let resp = engine
            .simulate(&request("AS KD QH JC 9S 9D 8H 7C 6S 5D 4H 2C 2S", 1000, Some(1)))
            .unwrap();
        assert_eq!(resp.iterations, 1000);
        assert_eq!(resp.best_arrangement.len(), 13);
    }
}
