//! Expectimax search policy for 2048.
//!
//! Max nodes pick the best player move; chance nodes average over every
//! possible spawn (each empty cell, value 2 with probability `p2`, else 4).
//! Leaves are scored by the static [`evaluate_grid`] heuristic.
//!
//! Notes
//! - One unit of depth is one player move followed by the full expectation
//!   over its spawn. A chance node on a full grid recurses into a max node at
//!   the same depth.
//! - A max node with no moving direction scores `evaluate - TERMINAL_PENALTY`.
//!   The penalty is finite so it still sums cleanly with merge gains.
//! - The search never draws randomness: the same grid and config always give
//!   the same answer.
//!
//! Quick start
//! ```
//! use ai_2048_lab::engine::{new_game, SpawnConfig};
//! use ai_2048_lab::expectimax::{Expectimax, ExpectimaxConfig};
//! use ai_2048_lab::rng::Mulberry32;
//!
//! let mut rng = Mulberry32::new(123);
//! let state = new_game(&mut rng, &SpawnConfig::default());
//!
//! let cfg = ExpectimaxConfig { depth: 2, ..Default::default() };
//! let mut ex = Expectimax::with_config(cfg).unwrap();
//! assert!(ex.best_move(state.grid).is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::Direction;
use crate::error::ConfigError;

mod heuristic;
mod search;

pub use heuristic::{evaluate_grid, evaluate_grid_with, HeuristicWeights};
pub use search::Expectimax;

/// Direction enumeration order used by the search. Ties go to the earliest
/// direction in this order.
pub const SEARCH_ORDER: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Right, Direction::Down];

/// Subtracted from the static value of a stuck grid inside the search.
pub const TERMINAL_PENALTY: f64 = 1e9;

/// Search knobs.
///
/// - `depth`: plies searched from the root (>= 1; 3-4 keeps latency sane).
/// - `p2`: probability a spawn is a 2, strictly inside (0, 1).
/// - `cache_enabled`: memoize node values within one root call. Values are
///   identical either way; only node counts change.
/// - `weights`: heuristic weights for leaf evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectimaxConfig {
    pub depth: u32,
    pub p2: f64,
    #[serde(default = "default_cache")]
    pub cache_enabled: bool,
    #[serde(default)]
    pub weights: HeuristicWeights,
}

fn default_cache() -> bool { true }

impl ExpectimaxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth == 0 {
            return Err(ConfigError::Depth(self.depth));
        }
        if !(self.p2 > 0.0 && self.p2 < 1.0) {
            return Err(ConfigError::SpawnTwoProbability(self.p2));
        }
        Ok(())
    }

    #[inline]
    pub fn p4(&self) -> f64 { 1.0 - self.p2 }
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self { depth: 3, p2: 0.9, cache_enabled: true, weights: HeuristicWeights::default() }
    }
}

/// Expected value of one root direction.
///
/// `legal` is false when the direction does not change the grid; `ev` is
/// then 0 and meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchEval {
    pub dir: Direction,
    pub ev: f64,
    pub legal: bool,
}

/// Node counts for the last root call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub cache_hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        assert!(ExpectimaxConfig::default().validate().is_ok());
        let zero = ExpectimaxConfig { depth: 0, ..Default::default() };
        assert_eq!(zero.validate(), Err(ConfigError::Depth(0)));
        for p2 in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let cfg = ExpectimaxConfig { p2, ..Default::default() };
            assert!(matches!(cfg.validate(), Err(ConfigError::SpawnTwoProbability(_))));
        }
    }

    #[test]
    fn config_serde_defaults() {
        let cfg: ExpectimaxConfig = serde_json::from_str(r#"{"depth":4,"p2":0.8}"#).unwrap();
        assert_eq!(cfg.depth, 4);
        assert!(cfg.cache_enabled);
        assert_eq!(cfg.weights, HeuristicWeights::default());
        assert!((cfg.p4() - 0.2).abs() < 1e-12);
    }
}
