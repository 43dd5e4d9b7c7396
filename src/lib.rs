//! ai-2048-lab: a 2048 engine, an expectimax policy and an evaluation harness
//!
//! This crate provides:
//! - A `Grid`/`GameState` model with pure transitions (`engine` module)
//! - A pluggable random source with a reference Mulberry32 generator (`rng`)
//! - An expectimax search over the full spawn distribution (`expectimax`)
//! - Random and expectimax agents behind one `Agent` trait (`agent`)
//! - A reproducible many-game evaluation harness with summary statistics (`eval`)
//!
//! Quick start:
//! ```
//! use ai_2048_lab::engine::{apply_move, new_game, Direction, SpawnConfig};
//! use ai_2048_lab::rng::Mulberry32;
//!
//! // Deterministic start from a seed
//! let mut rng = Mulberry32::new(42);
//! let spawn = SpawnConfig::default();
//! let s0 = new_game(&mut rng, &spawn);
//! let res = apply_move(&s0, Direction::Left, &mut rng, &spawn);
//! assert!(res.next.score >= s0.score);
//! ```
//!
//! Full loop with the expectimax agent
//! ```
//! use ai_2048_lab::agent::{Agent, AgentConfig, ChooseMoveInput};
//! use ai_2048_lab::engine::{apply_move, new_game, SpawnConfig};
//! use ai_2048_lab::rng::Mulberry32;
//!
//! let mut agent = AgentConfig::Expectimax { depth: 1, p2: 0.9 }.build().unwrap();
//! let mut rng = Mulberry32::new(123);
//! let spawn = SpawnConfig::default();
//! let mut state = new_game(&mut rng, &spawn);
//! let mut moves = 0;
//!
//! // Keep doctests fast: a handful of moves
//! while !state.is_game_over && moves < 8 {
//!     let input = ChooseMoveInput { grid: state.grid, score: state.score };
//!     let Some(dir) = agent.choose_move(&input, &mut rng).direction else { break };
//!     state = apply_move(&state, dir, &mut rng, &spawn).next;
//!     moves += 1;
//! }
//! assert_eq!(moves, 8);
//! ```
//!
pub mod agent;
pub mod engine;
pub mod error;
pub mod eval;
pub mod expectimax;
pub mod report;
pub mod rng;
pub mod session;

pub use error::ConfigError;
