//! N-API exports. NAPI-RS handles the V8 Object ↔ Rust struct conversion
//! for [`SimulateRequest`] and [`SimulateResponse`].

use napi::bindgen_prelude::*;
use napi_derive::napi;

use crate::{card, evaluator, Engine, EngineConfig, SimulateRequest, SimulateResponse};

fn to_napi(err: crate::Error) -> Error {
    let status = match err {
        crate::Error::Internal(_) | crate::Error::TimedOut { .. } => Status::GenericFailure,
        _ => Status::InvalidArg,
    };
    Error::new(status, err.to_string())
}

/// Initialize the engine and load its configuration. Called once at
/// server startup.
#[napi]
pub fn init() -> Result<()> {
    crate::init().map_err(to_napi)
}

#[napi]
pub fn version() -> String {
    crate::version()
}

/// Main entry point, one call per dealt hand. Uses the engine loaded by
/// `init`.
#[napi]
pub fn simulate(request: SimulateRequest) -> Result<SimulateResponse> {
    crate::simulate(&request).map_err(to_napi)
}

/// Same as `simulate`, with a JSON config document instead of the
/// environment.
#[napi]
pub fn simulate_with_config(
    request: SimulateRequest,
    config_json: String,
) -> Result<SimulateResponse> {
    let config = EngineConfig::from_json(&config_json).map_err(to_napi)?;
    Engine::new(config)
        .and_then(|engine| engine.simulate(&request))
        .map_err(to_napi)
}

/// Category name of a 3- or 5-card row, e.g. "Full House".
#[napi]
pub fn evaluate(cards: Vec<String>) -> Result<String> {
    if cards.len() != 3 && cards.len() != 5 {
        return Err(Error::new(
            Status::InvalidArg,
            "evaluate requires exactly 3 or 5 cards",
        ));
    }
    let parsed = card::parse_distinct(&cards).map_err(to_napi)?;
    Ok(evaluator::evaluate(&parsed).category().name().to_string())
}
