//! Continuous self-play for live viewers.
//!
//! A [`LabSession`] owns its game, agent and RNG, plus an explicit
//! running/stopped switch. A front end (socket, UI, whatever) calls
//! [`LabSession::tick`] on its own schedule and forwards the returned
//! [`Frame`]s; nothing here does IO.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentConfig, ChooseMoveInput};
use crate::engine::{apply_move, new_game, GameState, Grid, SpawnConfig};
use crate::error::ConfigError;
use crate::rng::Mulberry32;

/// Snapshot emitted after each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub episode: u64,
    pub step: u32,
    pub score: u64,
    pub max_tile: u32,
    pub grid: Grid,
    pub moved: bool,
    /// The game shown in this frame ended; the next tick starts a new episode.
    pub episode_done: bool,
}

pub struct LabSession {
    rng: Mulberry32,
    agent: Box<dyn Agent + Send>,
    spawn: SpawnConfig,
    state: GameState,
    episode: u64,
    step: u32,
    running: bool,
    // last frame closed the episode; the next tick starts a new game
    episode_done: bool,
}

impl LabSession {
    /// Build a stopped session. Nothing advances until [`start`](Self::start).
    pub fn new(seed: u32, agent_config: &AgentConfig, spawn: SpawnConfig) -> Result<Self, ConfigError> {
        let agent = agent_config.build()?;
        Self::with_agent(seed, agent, spawn)
    }

    /// Like [`new`](Self::new) with an already built agent.
    pub fn with_agent(seed: u32, agent: Box<dyn Agent + Send>, spawn: SpawnConfig) -> Result<Self, ConfigError> {
        spawn.validate()?;
        let mut rng = Mulberry32::new(seed);
        let state = new_game(&mut rng, &spawn);
        Ok(Self { rng, agent, spawn, state, episode: 0, step: 0, running: false, episode_done: false })
    }

    pub fn start(&mut self) {
        log::info!("session started at episode {}", self.episode);
        self.running = true;
    }

    pub fn stop(&mut self) {
        log::info!("session stopped at episode {}", self.episode);
        self.running = false;
    }

    #[inline]
    pub fn is_running(&self) -> bool { self.running }

    #[inline]
    pub fn episode(&self) -> u64 { self.episode }

    #[inline]
    pub fn state(&self) -> &GameState { &self.state }

    /// The last frame ended its episode and the next tick will start a new one.
    #[inline]
    pub fn episode_done(&self) -> bool { self.episode_done }

    /// Advance one move while running. Returns `None` when stopped.
    ///
    /// A game that is over, or an agent that cannot or will not move, closes
    /// the episode: the frame reports the final position and the following
    /// tick starts a fresh game.
    pub fn tick(&mut self) -> Option<Frame> {
        if !self.running {
            return None;
        }
        if self.episode_done {
            self.reset_episode();
        }
        let input = ChooseMoveInput { grid: self.state.grid, score: self.state.score };
        let choice = self.agent.choose_move(&input, &mut self.rng);
        let moved = match choice.direction {
            Some(dir) => {
                let res = apply_move(&self.state, dir, &mut self.rng, &self.spawn);
                if res.moved {
                    self.state = res.next;
                    self.step += 1;
                }
                res.moved
            }
            None => false,
        };
        let episode_done = self.state.is_game_over || !moved;
        self.episode_done = episode_done;
        Some(Frame {
            episode: self.episode,
            step: self.step,
            score: self.state.score,
            max_tile: self.state.grid.highest_tile(),
            grid: self.state.grid,
            moved,
            episode_done,
        })
    }

    fn reset_episode(&mut self) {
        log::debug!("episode {} finished: score={} steps={}", self.episode, self.state.score, self.step);
        self.episode += 1;
        self.step = 0;
        self.episode_done = false;
        self.state = new_game(&mut self.rng, &self.spawn);
    }
}
