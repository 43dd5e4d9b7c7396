//! Construction-time validation errors.
//!
//! Every configurable piece (spawn distribution, search parameters, harness
//! inputs, scripted RNGs) is checked when it is built, so the engine, search
//! and harness never discover a bad value mid-run.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("spawn probabilities must be non-negative and sum to 1 (p2={p2}, p4={p4})")]
    SpawnProbabilities { p2: f64, p4: f64 },
    #[error("search depth must be at least 1 (got {0})")]
    Depth(u32),
    #[error("p2 must lie strictly between 0 and 1 (got {0})")]
    SpawnTwoProbability(f64),
    #[error("evaluation needs at least one game")]
    NoGames,
    #[error("sequence rng needs at least one value")]
    EmptySequence,
    #[error("sequence rng values must lie in [0, 1) (got {0})")]
    SequenceValue(f64),
}
