//! Move-choosing agents.
//!
//! An agent sees the current grid and score and names a direction, or `None`
//! when nothing moves. The caller owns the game RNG and lends it to the
//! agent first, then to the engine, so any draws the agent makes land on
//! the same stream ahead of that move's spawn.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::{Direction, Grid};
use crate::error::ConfigError;
use crate::expectimax::{BranchEval, Expectimax, ExpectimaxConfig};
use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    Random,
    Expectimax,
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentId::Random => f.write_str("random"),
            AgentId::Expectimax => f.write_str("expectimax"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChooseMoveInput {
    pub grid: Grid,
    pub score: u64,
}

/// Search details behind an expectimax choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDebug {
    /// EV of the chosen direction; `None` when nothing moves.
    pub best_value: Option<f64>,
    /// Legal root directions only, in search order.
    pub per_move: Vec<BranchEval>,
    pub depth: u32,
    pub p2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveChoice {
    pub direction: Option<Direction>,
    pub debug: Option<ChoiceDebug>,
}

impl MoveChoice {
    pub fn plain(direction: Option<Direction>) -> Self { Self { direction, debug: None } }
}

pub trait Agent {
    fn id(&self) -> AgentId;

    fn choose_move(&mut self, input: &ChooseMoveInput, rng: &mut dyn RandomSource) -> MoveChoice;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn id(&self) -> AgentId { (**self).id() }

    fn choose_move(&mut self, input: &ChooseMoveInput, rng: &mut dyn RandomSource) -> MoveChoice {
        (**self).choose_move(input, rng)
    }
}

/// Baseline: shuffle the four directions and take the first that moves.
///
/// ```
/// use ai_2048_lab::agent::{Agent, ChooseMoveInput, RandomAgent};
/// use ai_2048_lab::engine::Grid;
/// use ai_2048_lab::rng::Mulberry32;
/// let grid = Grid::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
/// let mut rng = Mulberry32::new(5);
/// let choice = RandomAgent.choose_move(&ChooseMoveInput { grid, score: 0 }, &mut rng);
/// assert!(grid.shift(choice.direction.unwrap()).moved);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAgent;

impl RandomAgent {
    /// Fisher-Yates over `[Up, Down, Left, Right]`, three draws.
    pub fn shuffled_directions(rng: &mut dyn RandomSource) -> [Direction; 4] {
        let mut dirs = Direction::ALL;
        for i in (1..dirs.len()).rev() {
            let j = ((rng.next_f64() * (i + 1) as f64) as usize).min(i);
            dirs.swap(i, j);
        }
        dirs
    }
}

impl Agent for RandomAgent {
    fn id(&self) -> AgentId { AgentId::Random }

    fn choose_move(&mut self, input: &ChooseMoveInput, rng: &mut dyn RandomSource) -> MoveChoice {
        let dirs = Self::shuffled_directions(rng);
        MoveChoice::plain(dirs.into_iter().find(|&d| input.grid.shift(d).moved))
    }
}

/// Expectimax policy. Draws nothing from the RNG.
pub struct ExpectimaxAgent {
    search: Expectimax,
}

impl ExpectimaxAgent {
    pub fn new(cfg: ExpectimaxConfig) -> Result<Self, ConfigError> {
        Ok(Self { search: Expectimax::with_config(cfg)? })
    }

    pub fn search(&self) -> &Expectimax { &self.search }
}

impl Agent for ExpectimaxAgent {
    fn id(&self) -> AgentId { AgentId::Expectimax }

    fn choose_move(&mut self, input: &ChooseMoveInput, _rng: &mut dyn RandomSource) -> MoveChoice {
        let branches = self.search.branch_evals(input.grid);
        let mut best: Option<BranchEval> = None;
        for b in branches.iter().filter(|b| b.legal) {
            if best.map_or(true, |cur| b.ev > cur.ev) {
                best = Some(*b);
            }
        }
        let cfg = self.search.config();
        let debug = ChoiceDebug {
            best_value: best.map(|b| b.ev),
            per_move: branches.iter().filter(|b| b.legal).copied().collect(),
            depth: cfg.depth,
            p2: cfg.p2,
        };
        MoveChoice { direction: best.map(|b| b.dir), debug: Some(debug) }
    }
}

/// Serializable agent selection, echoed into evaluation results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "agent", rename_all = "lowercase")]
pub enum AgentConfig {
    Random,
    Expectimax { depth: u32, p2: f64 },
}

impl AgentConfig {
    pub fn id(&self) -> AgentId {
        match self {
            AgentConfig::Random => AgentId::Random,
            AgentConfig::Expectimax { .. } => AgentId::Expectimax,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.expectimax_config() {
            Some(cfg) => cfg.validate(),
            None => Ok(()),
        }
    }

    /// Validate once, then mint any number of agents.
    pub fn factory(&self) -> Result<AgentFactory, ConfigError> {
        self.validate()?;
        Ok(AgentFactory(*self))
    }

    pub fn build(&self) -> Result<Box<dyn Agent + Send>, ConfigError> { Ok(self.factory()?.make()) }

    fn expectimax_config(&self) -> Option<ExpectimaxConfig> {
        match *self {
            AgentConfig::Random => None,
            AgentConfig::Expectimax { depth, p2 } => Some(ExpectimaxConfig { depth, p2, ..Default::default() }),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self { AgentConfig::Random }
}

/// A validated [`AgentConfig`].
#[derive(Debug, Clone, Copy)]
pub struct AgentFactory(AgentConfig);

impl AgentFactory {
    pub fn config(&self) -> &AgentConfig { &self.0 }

    pub fn make(&self) -> Box<dyn Agent + Send> {
        match self.0.expectimax_config() {
            Some(cfg) => Box::new(ExpectimaxAgent { search: Expectimax::from_validated(cfg) }),
            None => Box::new(RandomAgent),
        }
    }
}
