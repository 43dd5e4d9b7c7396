//! Evaluation harness: play many independent games and aggregate statistics.
//!
//! Game `i` is seeded with `seed_base.wrapping_add(i)`, so a run is fully
//! determined by its config, RNG constructor and agent constructor. The
//! parallel variant assigns seeds the same way and collects results in game
//! order, producing the same [`EvalResult`] as the sequential one.
//!
//! ```
//! use ai_2048_lab::agent::{AgentConfig, RandomAgent};
//! use ai_2048_lab::eval::{evaluate_agent, EvalConfig};
//! use ai_2048_lab::rng::Mulberry32;
//!
//! let cfg = EvalConfig::new(5, 1337, AgentConfig::Random);
//! let a = evaluate_agent(&cfg, Mulberry32::new, || RandomAgent).unwrap();
//! let b = evaluate_agent(&cfg, Mulberry32::new, || RandomAgent).unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.scores.len(), 5);
//! ```

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentConfig, AgentId, ChooseMoveInput};
use crate::engine::{apply_move, compute_game_over, new_game, SpawnConfig};
use crate::error::ConfigError;
use crate::rng::RandomSource;

pub const DEFAULT_SEED_BASE: u32 = 1337;

/// Max-tile thresholds reported as empirical P(max tile >= T).
pub const TILE_THRESHOLDS: [u32; 6] = [2048, 4096, 8192, 16384, 32768, 65536];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    pub games: u32,
    #[serde(default = "default_seed_base")]
    pub seed_base: u32,
    pub agent_config: AgentConfig,
    #[serde(default)]
    pub spawn: SpawnConfig,
}

fn default_seed_base() -> u32 { DEFAULT_SEED_BASE }

impl EvalConfig {
    pub fn new(games: u32, seed_base: u32, agent_config: AgentConfig) -> Self {
        Self { games, seed_base, agent_config, spawn: SpawnConfig::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.games == 0 {
            return Err(ConfigError::NoGames);
        }
        self.spawn.validate()?;
        self.agent_config.validate()
    }

    #[inline]
    pub fn seed_for(&self, game_index: u32) -> u32 { self.seed_base.wrapping_add(game_index) }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The grid became terminal.
    GameOver,
    /// The agent returned no direction on a grid that was not terminal.
    NoMove,
    /// The agent named a direction the engine reported as non-moving.
    AgentDefect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub score: u64,
    pub max_tile: u32,
    pub steps: u32,
    pub termination: Termination,
}

/// Play one game to the end.
pub fn play_game<R, A>(rng: &mut R, agent: &mut A, spawn: &SpawnConfig) -> GameRecord
where
    R: RandomSource,
    A: Agent + ?Sized,
{
    let mut state = new_game(rng, spawn);
    let mut steps = 0u32;
    let termination = loop {
        if state.is_game_over {
            break Termination::GameOver;
        }
        let input = ChooseMoveInput { grid: state.grid, score: state.score };
        let Some(dir) = agent.choose_move(&input, &mut *rng).direction else {
            state.is_game_over = compute_game_over(&state.grid);
            break if state.is_game_over { Termination::GameOver } else { Termination::NoMove };
        };
        let res = apply_move(&state, dir, rng, spawn);
        if !res.moved {
            log::warn!(
                "agent {} chose non-moving direction {} at step {}; ending game",
                agent.id(),
                dir,
                steps
            );
            break Termination::AgentDefect;
        }
        state = res.next;
        steps += 1;
    };
    GameRecord { score: state.score, max_tile: state.grid.highest_tile(), steps, termination }
}

/// Aggregate statistics over a batch of games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub agent: AgentId,
    pub games: u32,
    pub seed_base: u32,
    pub agent_config: AgentConfig,

    pub mean_score: f64,
    pub median_score: f64,
    pub std_score: f64,

    pub mean_steps: f64,
    pub median_steps: f64,
    pub std_steps: f64,

    pub max_tile_histogram: BTreeMap<u32, u32>,
    pub p_at_least: BTreeMap<u32, f64>,

    pub samples: Samples,
    pub abnormal_terminations: u32,

    /// Per-game values in game-index order.
    pub scores: Vec<u64>,
    pub max_tiles: Vec<u32>,
    pub steps: Vec<u32>,
}

/// Sample extremes (0 when there are no games).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Samples {
    pub min_score: u64,
    pub max_score: u64,
    pub min_max_tile: u32,
    pub max_max_tile: u32,
    pub min_steps: u32,
    pub max_steps: u32,
}

impl EvalResult {
    pub fn from_records(cfg: &EvalConfig, agent: AgentId, records: &[GameRecord]) -> Self {
        let scores: Vec<u64> = records.iter().map(|r| r.score).collect();
        let max_tiles: Vec<u32> = records.iter().map(|r| r.max_tile).collect();
        let steps: Vec<u32> = records.iter().map(|r| r.steps).collect();

        let mut sorted_scores = scores.clone();
        sorted_scores.sort_unstable();
        let mut sorted_tiles = max_tiles.clone();
        sorted_tiles.sort_unstable();
        let mut sorted_steps = steps.clone();
        sorted_steps.sort_unstable();

        let score_f: Vec<f64> = sorted_scores.iter().map(|&v| v as f64).collect();
        let steps_f: Vec<f64> = sorted_steps.iter().map(|&v| v as f64).collect();
        let mean_score = mean(&score_f);
        let mean_steps = mean(&steps_f);

        let mut max_tile_histogram = BTreeMap::new();
        for &t in &max_tiles {
            *max_tile_histogram.entry(t).or_insert(0) += 1;
        }
        let n = records.len();
        let p_at_least = TILE_THRESHOLDS
            .iter()
            .map(|&t| {
                let p = if n == 0 { 0.0 } else { count_at_least(&sorted_tiles, t) as f64 / n as f64 };
                (t, p)
            })
            .collect();

        let samples = Samples {
            min_score: sorted_scores.first().copied().unwrap_or(0),
            max_score: sorted_scores.last().copied().unwrap_or(0),
            min_max_tile: sorted_tiles.first().copied().unwrap_or(0),
            max_max_tile: sorted_tiles.last().copied().unwrap_or(0),
            min_steps: sorted_steps.first().copied().unwrap_or(0),
            max_steps: sorted_steps.last().copied().unwrap_or(0),
        };
        let abnormal_terminations =
            records.iter().filter(|r| r.termination == Termination::AgentDefect).count() as u32;

        EvalResult {
            agent,
            games: cfg.games,
            seed_base: cfg.seed_base,
            agent_config: cfg.agent_config,
            mean_score,
            median_score: median_sorted(&score_f),
            std_score: sample_std(&score_f, mean_score),
            mean_steps,
            median_steps: median_sorted(&steps_f),
            std_steps: sample_std(&steps_f, mean_steps),
            max_tile_histogram,
            p_at_least,
            samples,
            abnormal_terminations,
            scores,
            max_tiles,
            steps,
        }
    }
}

/// Run `cfg.games` games sequentially.
pub fn evaluate_agent<R, A, FR, FA>(cfg: &EvalConfig, rng_factory: FR, agent_factory: FA) -> Result<EvalResult, ConfigError>
where
    R: RandomSource,
    A: Agent,
    FR: Fn(u32) -> R,
    FA: Fn() -> A,
{
    evaluate_agent_with(cfg, rng_factory, agent_factory, |_, _| {})
}

/// Like [`evaluate_agent`], calling `on_game` after each finished game.
pub fn evaluate_agent_with<R, A, FR, FA, G>(
    cfg: &EvalConfig,
    rng_factory: FR,
    agent_factory: FA,
    mut on_game: G,
) -> Result<EvalResult, ConfigError>
where
    R: RandomSource,
    A: Agent,
    FR: Fn(u32) -> R,
    FA: Fn() -> A,
    G: FnMut(u32, &GameRecord),
{
    cfg.validate()?;
    let agent_id = agent_factory().id();
    log::info!("evaluating {} over {} games from seed {}", agent_id, cfg.games, cfg.seed_base);
    let mut records = Vec::with_capacity(cfg.games as usize);
    for i in 0..cfg.games {
        let record = run_one(cfg, i, &rng_factory, &agent_factory);
        on_game(i, &record);
        records.push(record);
    }
    Ok(finish(cfg, agent_id, &records))
}

/// Run `cfg.games` games on the rayon pool. Same result as [`evaluate_agent`].
pub fn evaluate_agent_par<R, A, FR, FA>(cfg: &EvalConfig, rng_factory: FR, agent_factory: FA) -> Result<EvalResult, ConfigError>
where
    R: RandomSource,
    A: Agent,
    FR: Fn(u32) -> R + Sync,
    FA: Fn() -> A + Sync,
{
    evaluate_agent_par_with(cfg, rng_factory, agent_factory, |_, _| {})
}

/// Like [`evaluate_agent_par`]; `on_game` may be called from any worker
/// thread and in any order.
pub fn evaluate_agent_par_with<R, A, FR, FA, G>(
    cfg: &EvalConfig,
    rng_factory: FR,
    agent_factory: FA,
    on_game: G,
) -> Result<EvalResult, ConfigError>
where
    R: RandomSource,
    A: Agent,
    FR: Fn(u32) -> R + Sync,
    FA: Fn() -> A + Sync,
    G: Fn(u32, &GameRecord) + Sync,
{
    cfg.validate()?;
    let agent_id = agent_factory().id();
    log::info!(
        "evaluating {} over {} games from seed {} on {} threads",
        agent_id,
        cfg.games,
        cfg.seed_base,
        rayon::current_num_threads()
    );
    let records: Vec<GameRecord> = (0..cfg.games)
        .into_par_iter()
        .map(|i| {
            let record = run_one(cfg, i, &rng_factory, &agent_factory);
            on_game(i, &record);
            record
        })
        .collect();
    Ok(finish(cfg, agent_id, &records))
}

fn run_one<R, A, FR, FA>(cfg: &EvalConfig, index: u32, rng_factory: &FR, agent_factory: &FA) -> GameRecord
where
    R: RandomSource,
    A: Agent,
    FR: Fn(u32) -> R,
    FA: Fn() -> A,
{
    let seed = cfg.seed_for(index);
    let mut rng = rng_factory(seed);
    let mut agent = agent_factory();
    let record = play_game(&mut rng, &mut agent, &cfg.spawn);
    log::debug!(
        "game {} seed {}: score={} max_tile={} steps={} end={:?}",
        index,
        seed,
        record.score,
        record.max_tile,
        record.steps,
        record.termination
    );
    record
}

fn finish(cfg: &EvalConfig, agent_id: AgentId, records: &[GameRecord]) -> EvalResult {
    let result = EvalResult::from_records(cfg, agent_id, records);
    log::info!(
        "{}: mean score {:.1}, median {:.1}, best tile {}",
        agent_id,
        result.mean_score,
        result.median_score,
        result.samples.max_max_tile
    );
    result
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Median of an ascending slice; 0 for an empty slice.
pub fn median_sorted(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    if n % 2 == 1 { xs[mid] } else { (xs[mid - 1] + xs[mid]) / 2.0 }
}

/// Bessel-corrected standard deviation; 0 when `xs.len() <= 1`.
pub fn sample_std(xs: &[f64], mean: f64) -> f64 {
    if xs.len() <= 1 {
        return 0.0;
    }
    let ss: f64 = xs.iter().map(|&x| (x - mean) * (x - mean)).sum();
    (ss / (xs.len() - 1) as f64).sqrt()
}

/// Number of entries `>= t` in an ascending slice (binary search).
pub fn count_at_least(sorted: &[u32], t: u32) -> usize {
    sorted.len() - sorted.partition_point(|&v| v < t)
}
