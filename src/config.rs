//! Engine configuration: the tunable tables behind auto-win detection,
//! row scoring, arrangement selection and cancellation.
//!
//! Every field has a default, so a JSON document only needs the keys it
//! overrides:
//!
//! ```json
//! {
//!   "seed": 42,
//!   "selector": { "shortlist_size": 6 },
//!   "scoring": { "scoop_bonus": 3 }
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::arrangement::Position;
use crate::autowin::{self, AutoWinRule};
use crate::error::{Error, Result};
use crate::evaluator::Category;

/// Environment variable holding a path to a JSON config file.
pub const CONFIG_ENV: &str = "CHINESE_POKER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Special hands and their precedence.
    pub auto_wins: Vec<AutoWinRule>,
    pub scoring: Scoring,
    pub selector: SelectorConfig,
    /// Fixed seed for reproducible runs; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Wall-clock budget per request.
    pub timeout_ms: Option<u64>,
    pub cancel_policy: CancelPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_wins: autowin::default_catalog(),
            scoring: Scoring::default(),
            selector: SelectorConfig::default(),
            seed: None,
            timeout_ms: None,
            cancel_policy: CancelPolicy::BestSoFar,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from the file named by [`CONFIG_ENV`], or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                log::info!("Loading engine config from {}", path);
                Self::from_path(path)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auto_wins.iter().any(|r| r.label.trim().is_empty()) {
            return Err(Error::Config("auto-win labels must not be empty".into()));
        }
        let mut kinds = HashSet::new();
        if !self.auto_wins.iter().all(|r| kinds.insert(r.kind)) {
            return Err(Error::Config("auto-win catalog lists a kind twice".into()));
        }
        if self.selector.shortlist_size == 0 {
            return Err(Error::Config("shortlist_size must be at least 1".into()));
        }
        if !self.selector.heuristic_weights.iter().all(|w| w.is_finite()) {
            return Err(Error::Config("heuristic_weights must be finite".into()));
        }
        if self.scoring.row_weights.iter().any(|&w| w < 0) {
            return Err(Error::Config("row_weights must not be negative".into()));
        }
        Ok(())
    }
}

/// What a cancelled or timed-out request returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Best arrangement over the iterations that did complete.
    BestSoFar,
    /// Fail with `TimedOut` unless every iteration completed.
    RequireComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Candidates simulated when the foul-free set is large.
    pub shortlist_size: usize,
    /// Simulate every foul-free arrangement when there are at most this many.
    pub full_search_cutoff: usize,
    /// Static score weights for front, middle and back.
    pub heuristic_weights: [f64; 3],
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            shortlist_size: 12,
            full_search_cutoff: 24,
            heuristic_weights: [1.0, 1.0, 1.25],
        }
    }
}

/// Bonus points for a row holding a given category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Royalty {
    pub position: RowName,
    pub category: Category,
    pub points: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowName {
    Front,
    Middle,
    Back,
}

impl From<RowName> for Position {
    fn from(row: RowName) -> Position {
        match row {
            RowName::Front => Position::Front,
            RowName::Middle => Position::Middle,
            RowName::Back => Position::Back,
        }
    }
}

/// Row-by-row settlement between two arrangements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scoring {
    /// Points for winning (or lost for losing) front, middle and back.
    pub row_weights: [i32; 3],
    pub tie_points: i32,
    /// Extra points for winning all three rows.
    pub scoop_bonus: i32,
    pub royalties: Vec<Royalty>,
    /// A deal counts as won when the candidate's total reaches this.
    pub win_threshold: i32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            row_weights: [1, 1, 1],
            tie_points: 0,
            scoop_bonus: 0,
            royalties: Vec::new(),
            win_threshold: 1,
        }
    }
}

impl Scoring {
    /// Traditional bonuses: trips up front, full house or better in the
    /// middle, quads or better in the back.
    pub fn traditional() -> Self {
        let royalty = |position, category, points| Royalty {
            position,
            category,
            points,
        };
        Self {
            scoop_bonus: 3,
            royalties: vec![
                royalty(RowName::Front, Category::ThreeOfAKind, 3),
                royalty(RowName::Middle, Category::FullHouse, 2),
                royalty(RowName::Middle, Category::FourOfAKind, 8),
                royalty(RowName::Middle, Category::StraightFlush, 10),
                royalty(RowName::Back, Category::FourOfAKind, 4),
                royalty(RowName::Back, Category::StraightFlush, 5),
            ],
            ..Self::default()
        }
    }

    pub fn weight(&self, position: Position) -> i32 {
        self.row_weights[position.index()]
    }

    pub fn royalty(&self, position: Position, category: Category) -> i32 {
        self.royalties
            .iter()
            .filter(|r| Position::from(r.position) == position && r.category == category)
            .map(|r| r.points)
            .sum()
    }

    /// Largest total an opponent can take off us: every row lost plus the
    /// scoop.
    pub fn sweep(&self) -> i32 {
        self.row_weights.iter().sum::<i32>() + self.scoop_bonus
    }
}

// ── Tests ───────────────────────────────────────────────────────────
