use serde::{Deserialize, Serialize};

use crate::engine::Grid;

/// Weights of the four static signals.
///
/// Hand-tuned; kept as data so they can be retuned without touching the
/// evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicWeights {
    /// Per empty cell.
    pub empty: f64,
    /// Applied (negated) to the summed log2 jumps between neighbours.
    pub smoothness: f64,
    /// Applied to the (non-positive) monotonicity score.
    pub monotonicity: f64,
    /// Applied to log2 of the highest tile.
    pub max_tile: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self { empty: 200.0, smoothness: 1.0, monotonicity: 10.0, max_tile: 100.0 }
    }
}

/// Static value of a grid under the default weights.
#[inline]
pub fn evaluate_grid(grid: &Grid) -> f64 { evaluate_grid_with(grid, &HeuristicWeights::default()) }

/// Static value of a grid. Pure and bit-reproducible.
pub fn evaluate_grid_with(grid: &Grid, w: &HeuristicWeights) -> f64 {
    let logs = log_grid(grid);
    let empty = grid.count_empty() as f64;
    let smooth = -smoothness_penalty(grid, &logs);
    let mono = monotonicity_score(&logs);
    let max_log = (grid.highest_tile().max(2) as f64).log2();
    empty * w.empty + smooth * w.smoothness + mono * w.monotonicity + max_log * w.max_tile
}

fn log_grid(grid: &Grid) -> [[f64; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for (r, row) in grid.rows().iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            out[r][c] = if v == 0 { 0.0 } else { (v as f64).log2() };
        }
    }
    out
}

// Sum of |log2 a - log2 b| over right/down neighbour pairs where both are nonzero.
fn smoothness_penalty(grid: &Grid, logs: &[[f64; 4]; 4]) -> f64 {
    let g = grid.rows();
    let mut pen = 0.0;
    for r in 0..4 {
        for c in 0..4 {
            if g[r][c] == 0 {
                continue;
            }
            let lv = logs[r][c];
            if r + 1 < 4 && g[r + 1][c] != 0 {
                pen += (lv - logs[r + 1][c]).abs();
            }
            if c + 1 < 4 && g[r][c + 1] != 0 {
                pen += (lv - logs[r][c + 1]).abs();
            }
        }
    }
    pen
}

fn monotonicity_score(logs: &[[f64; 4]; 4]) -> f64 {
    let mut score = 0.0;
    for row in logs {
        score += line_monotonicity(row);
    }
    for c in 0..4 {
        let col = [logs[0][c], logs[1][c], logs[2][c], logs[3][c]];
        score += line_monotonicity(&col);
    }
    score
}

fn line_monotonicity(line: &[f64; 4]) -> f64 {
    let mut inc = 0.0;
    let mut dec = 0.0;
    for i in 0..3 {
        let (a, b) = (line[i], line[i + 1]);
        if a <= b {
            inc += b - a;
        }
        if a >= b {
            dec += a - b;
        }
    }
    -f64::min(inc, dec)
}
