//! Error taxonomy for the engine.
//!
//! Input validation errors are raised before any simulation work starts and
//! are returned to the caller verbatim.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid card token {token:?}")]
    InvalidCard { token: String },
    #[error("expected exactly 13 cards, got {count}")]
    WrongCount { count: usize },
    #[error("duplicate card {card}")]
    DuplicateCard { card: String },
    #[error("iterations must be positive, got {iterations}")]
    InvalidIterationCount { iterations: i64 },
    #[error("iterations must be at most {max}, got {iterations}")]
    TooManyIterations { iterations: i64, max: u32 },
    #[error("timed out after {completed} of {requested} iterations")]
    TimedOut { completed: u32, requested: u32 },
    #[error("deck holds {size} cards, need at least 13")]
    ShortDeck { size: usize },
    #[error("internal invariant violated: {0}")]
    Internal(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
