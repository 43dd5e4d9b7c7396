use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rng::RandomSource;

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

type Tile = u32;
type Score = u64;
type Line = [Tile; 4];

/// 4x4 board of tile values (0 = empty, otherwise a power of two >= 2).
///
/// `Grid` is `Copy`; every transition returns a fresh grid and never aliases
/// the input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Grid([[Tile; 4]; 4]);

impl Grid {
    /// A constant empty grid (all zeros).
    pub const EMPTY: Grid = Grid([[0; 4]; 4]);

    #[inline]
    pub fn from_rows(rows: [[Tile; 4]; 4]) -> Self { Grid(rows) }

    #[inline]
    pub fn rows(&self) -> &[[Tile; 4]; 4] { &self.0 }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> Tile { self.0[r][c] }

    /// Copy of this grid with one cell replaced.
    #[inline]
    pub fn with_tile(mut self, r: usize, c: usize, value: Tile) -> Self {
        self.0[r][c] = value;
        self
    }

    /// Slide/merge in `dir` (no spawn). See [`slide_and_merge`].
    ///
    /// ```
    /// use ai_2048_lab::engine::{Direction, Grid};
    /// let g = Grid::from_rows([[2, 2, 2, 0], [0; 4], [0; 4], [0; 4]]);
    /// let s = g.shift(Direction::Left);
    /// assert_eq!(s.grid.rows()[0], [4, 2, 0, 0]);
    /// assert_eq!(s.score_gained, 4);
    /// assert!(s.moved);
    /// ```
    #[inline]
    pub fn shift(self, dir: Direction) -> Slide { slide_and_merge(self, dir) }

    /// Row-major coordinates of every empty cell.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(16);
        for r in 0..4 {
            for c in 0..4 {
                if self.0[r][c] == 0 {
                    out.push((r, c));
                }
            }
        }
        out
    }

    #[inline]
    pub fn count_empty(&self) -> usize { self.0.iter().flatten().filter(|&&v| v == 0).count() }

    #[inline]
    pub fn count_non_empty(&self) -> usize { 16 - self.count_empty() }

    /// Highest tile value present (0 on an empty grid).
    #[inline]
    pub fn highest_tile(&self) -> Tile { self.0.iter().flatten().copied().max().unwrap_or(0) }

    /// True when the grid is full and no adjacent pair can merge.
    #[inline]
    pub fn is_game_over(&self) -> bool { compute_game_over(self) }

    fn line(&self, idx: usize, dir: Direction) -> Line {
        let mut line = [0; 4];
        for (j, slot) in line.iter_mut().enumerate() {
            let (r, c) = line_cell(idx, j, dir);
            *slot = self.0[r][c];
        }
        line
    }

    fn set_line(&mut self, idx: usize, dir: Direction, line: Line) {
        for (j, &v) in line.iter().enumerate() {
            let (r, c) = line_cell(idx, j, dir);
            self.0[r][c] = v;
        }
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid({:?})", self.0)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for (r, row) in self.0.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
            if r < 3 {
                writeln!(f, "-------------------------------")?;
            }
        }
        Ok(())
    }
}

impl From<[[Tile; 4]; 4]> for Grid { fn from(rows: [[Tile; 4]; 4]) -> Self { Grid(rows) } }

/// Probabilities for the value of a spawned tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub p2: f64,
    pub p4: f64,
}

impl SpawnConfig {
    const SUM_TOLERANCE: f64 = 1e-9;

    pub fn new(p2: f64, p4: f64) -> Result<Self, ConfigError> {
        let cfg = Self { p2, p4 };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.p2 >= 0.0
            && self.p4 >= 0.0
            && (self.p2 + self.p4 - 1.0).abs() <= Self::SUM_TOLERANCE;
        if ok { Ok(()) } else { Err(ConfigError::SpawnProbabilities { p2: self.p2, p4: self.p4 }) }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self { Self { p2: 0.9, p4: 0.1 } }
}

/// A game in progress (or finished). Values are never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub grid: Grid,
    pub score: Score,
    pub is_game_over: bool,
}

impl GameState {
    /// Wrap a grid, deriving the terminal flag from it.
    pub fn from_grid(grid: Grid, score: Score) -> Self {
        Self { grid, score, is_game_over: compute_game_over(&grid) }
    }
}

/// Outcome of a pure slide/merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub moved: bool,
    pub score_gained: Score,
    pub grid: Grid,
}

/// Outcome of [`apply_move`]. `moved == false` implies `score_gained == 0`
/// and `next` equal to the input state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub moved: bool,
    pub score_gained: Score,
    pub next: GameState,
}

/// Start a game: two spawns on an empty grid (four draws).
///
/// ```
/// use ai_2048_lab::engine::{new_game, SpawnConfig};
/// use ai_2048_lab::rng::Mulberry32;
/// let mut rng = Mulberry32::new(42);
/// let s = new_game(&mut rng, &SpawnConfig::default());
/// assert_eq!(s.grid.count_non_empty(), 2);
/// assert_eq!(s.score, 0);
/// assert!(!s.is_game_over);
/// ```
pub fn new_game<R: RandomSource + ?Sized>(rng: &mut R, spawn: &SpawnConfig) -> GameState {
    let state = GameState { grid: Grid::EMPTY, score: 0, is_game_over: false };
    let state = spawn_random_tile(state, rng, spawn);
    let state = spawn_random_tile(state, rng, spawn);
    GameState::from_grid(state.grid, state.score)
}

/// Apply one player move. A non-moving direction consumes no randomness and
/// returns the state untouched; otherwise the score is credited, one tile is
/// spawned and the terminal flag recomputed.
///
/// ```
/// use ai_2048_lab::engine::{apply_move, Direction, GameState, Grid, SpawnConfig};
/// use ai_2048_lab::rng::Mulberry32;
/// let g = Grid::from_rows([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]]);
/// let state = GameState::from_grid(g, 0);
/// let mut rng = Mulberry32::new(1);
/// let res = apply_move(&state, Direction::Left, &mut rng, &SpawnConfig::default());
/// assert!(res.moved);
/// assert_eq!(res.next.grid.count_non_empty(), 2);
/// ```
pub fn apply_move<R: RandomSource + ?Sized>(
    state: &GameState,
    dir: Direction,
    rng: &mut R,
    spawn: &SpawnConfig,
) -> MoveResult {
    let slide = slide_and_merge(state.grid, dir);
    if !slide.moved {
        return MoveResult { moved: false, score_gained: 0, next: *state };
    }
    let next = GameState { grid: slide.grid, score: state.score + slide.score_gained, is_game_over: false };
    let next = spawn_random_tile(next, rng, spawn);
    MoveResult {
        moved: true,
        score_gained: slide.score_gained,
        next: GameState::from_grid(next.grid, next.score),
    }
}

/// Slide every line toward `dir`, merging each equal adjacent pair at most
/// once. No randomness; safe for legality probing.
pub fn slide_and_merge(grid: Grid, dir: Direction) -> Slide {
    let mut out = grid;
    let mut moved = false;
    let mut score_gained = 0;
    for idx in 0..4 {
        let line = grid.line(idx, dir);
        let (merged, gained) = merge_line(line);
        if merged != line {
            moved = true;
        }
        score_gained += gained;
        out.set_line(idx, dir, merged);
    }
    Slide { moved, score_gained, grid: out }
}

/// Insert a 2 (probability `p2`) or 4 into a uniformly chosen empty cell.
///
/// Exactly two draws, in order: cell index, then value. A full grid is
/// returned unchanged and draws nothing.
pub fn spawn_random_tile<R: RandomSource + ?Sized>(state: GameState, rng: &mut R, spawn: &SpawnConfig) -> GameState {
    let empties = state.grid.empty_cells();
    if empties.is_empty() {
        return state;
    }
    let idx = ((rng.next_f64() * empties.len() as f64) as usize).min(empties.len() - 1);
    let (r, c) = empties[idx];
    let value = if rng.next_f64() < spawn.p2 { 2 } else { 4 };
    GameState { grid: state.grid.with_tile(r, c, value), ..state }
}

/// True iff the grid has no empty cell and no horizontally or vertically
/// adjacent equal pair.
pub fn compute_game_over(grid: &Grid) -> bool {
    let g = grid.rows();
    if g.iter().flatten().any(|&v| v == 0) {
        return false;
    }
    for r in 0..4 {
        for c in 0..4 {
            let v = g[r][c];
            if r + 1 < 4 && g[r + 1][c] == v {
                return false;
            }
            if c + 1 < 4 && g[r][c + 1] == v {
                return false;
            }
        }
    }
    true
}

// Cell of line `idx`, position `j` counted from the edge tiles move toward.
#[inline]
fn line_cell(idx: usize, j: usize, dir: Direction) -> (usize, usize) {
    match dir {
        Direction::Left => (idx, j),
        Direction::Right => (idx, 3 - j),
        Direction::Up => (j, idx),
        Direction::Down => (3 - j, idx),
    }
}

fn merge_line(line: Line) -> (Line, Score) {
    let mut out = [0; 4];
    let mut gained = 0;
    let mut len = 0;
    let mut pending: Option<Tile> = None;
    for &v in line.iter().filter(|&&v| v != 0) {
        match pending {
            Some(p) if p == v => {
                out[len] = p + v;
                gained += (p + v) as Score;
                len += 1;
                pending = None;
            }
            Some(p) => {
                out[len] = p;
                len += 1;
                pending = Some(v);
            }
            None => pending = Some(v),
        }
    }
    if let Some(p) = pending {
        out[len] = p;
    }
    (out, gained)
}

fn format_val(val: Tile) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}
