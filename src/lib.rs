//! Chinese Poker Engine — library entry point
//!
//! Given 13 dealt cards, find the foul-free front/middle/back split with the
//! best Monte Carlo win rate against a random opponent, or report an
//! auto-win hand. With the `node` feature the same service is exposed to
//! Node.js via N-API.
//!
//! ## Architecture
//!
//! ```text
//! Node.js (feature = "node")
//!     │
//!     ▼  N-API FFI boundary
//! node.rs ──────────────────────────  N-API exports
//!     │
//! lib.rs  ──────────────────────────  This file (request/response contract)
//!     ├── solver.rs                  Simulation service (Engine)
//!     ├── selector.rs                Shortlist + pick the best split
//!     ├── simulator.rs               Monte Carlo win rate (rayon)
//!     ├── autowin.rs                 Special-hand catalog
//!     ├── arrangement.rs             72,072 splits, foul-free filter
//!     ├── evaluator.rs               3- and 5-card hand ranks
//!     ├── card.rs                    Card model and token parsing
//!     ├── config.rs                  Tunable tables (JSON)
//!     ├── cancel.rs                  Cooperative cancellation
//!     └── error.rs                   Error taxonomy
//! ```
//!
//! ## Contract
//!
//! ```json
//! { "myCards": ["AS", "KD", ...13], "iterations": 5000 }
//! → { "iterations": 5000, "winRate": 0.61, "bestArrangement": [...13],
//!     "front": [...3], "middle": [...5], "back": [...5], "autoWin": "Dragon" }
//! ```

pub mod arrangement;
pub mod autowin;
pub mod cancel;
pub mod card;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod selector;
pub mod simulator;
pub mod solver;

#[cfg(feature = "node")]
mod node;

#[cfg(feature = "node")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub use cancel::CancelToken;
pub use card::{Card, Rank, Suit};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use evaluator::{Category, HandRank};
pub use solver::Engine;

// ── Exported Types ──────────────────────────────────────────────────

/// A simulation request, as received from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "node", napi(object))]
pub struct SimulateRequest {
    /// Exactly 13 card tokens such as "AS", "10h", "TD".
    pub my_cards: Vec<String>,
    /// Monte Carlo rounds; must be positive.
    pub iterations: i64,
    /// Overrides the configured seed for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

/// The simulation result sent back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "node", napi(object))]
pub struct SimulateResponse {
    /// Echo of the requested iteration count.
    pub iterations: i64,
    /// Win rate in [0.0, 1.0]; 1.0 for an auto-win.
    pub win_rate: f64,
    /// front ++ middle ++ back.
    pub best_arrangement: Vec<String>,
    pub front: Vec<String>,
    pub middle: Vec<String>,
    pub back: Vec<String>,
    /// Display label of the detected special hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_win: Option<String>,
}

// ── Library Functions ───────────────────────────────────────────────

/// Engine shared by [`simulate`], configured once from the environment.
static ENGINE: OnceLock<Engine> = OnceLock::new();

/// Initialize logging, build the static split tables and load the engine
/// configuration named by [`config::CONFIG_ENV`]. Safe to call more than
/// once; only the first successful call reads the configuration.
pub fn init() -> Result<()> {
    env_logger::try_init().ok();
    log::info!("Chinese Poker Engine initializing...");

    arrangement::init_tables();
    shared_engine(&ENGINE, EngineConfig::from_env)?;

    log::info!("Chinese Poker Engine ready");
    Ok(())
}

/// Return the engine version string.
pub fn version() -> String {
    format!("chinese-poker-engine v{}", env!("CARGO_PKG_VERSION"))
}

/// Run one request on the shared engine, loading it on first use when
/// [`init`] was not called.
pub fn simulate(request: &SimulateRequest) -> Result<SimulateResponse> {
    shared_engine(&ENGINE, EngineConfig::from_env)?.simulate(request)
}

/// The engine held by `cell`, built from `load` only while the cell is empty.
fn shared_engine(
    cell: &OnceLock<Engine>,
    load: impl FnOnce() -> Result<EngineConfig>,
) -> Result<&Engine> {
    if let Some(engine) = cell.get() {
        return Ok(engine);
    }
    let engine = Engine::new(load()?)?;
    Ok(cell.get_or_init(|| engine))
}
