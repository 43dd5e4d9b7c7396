use std::collections::HashMap;

use ahash::RandomState as AHasher;

use crate::engine::{Direction, Grid};
use crate::error::ConfigError;

use super::heuristic::evaluate_grid_with;
use super::{BranchEval, ExpectimaxConfig, SearchStats, SEARCH_ORDER, TERMINAL_PENALTY};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Node { Max, Chance }

type Memo = HashMap<(Node, Grid, u32), f64, AHasher>;

// Per-root-call scratch state. Dropped when the root call returns.
struct Ctx {
    memo: Option<Memo>,
    stats: SearchStats,
}

impl Ctx {
    fn new(cache_enabled: bool) -> Self {
        let memo = cache_enabled.then(|| HashMap::with_hasher(AHasher::new()));
        Self { memo, stats: SearchStats::default() }
    }
}

/// Depth-limited expectimax over the full spawn distribution.
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl Expectimax {
    /// Default config: depth 3, p2 = 0.9.
    pub fn new() -> Self { Self { cfg: ExpectimaxConfig::default(), stats: SearchStats::default() } }

    /// Validates `cfg` up front so a bad depth or probability never reaches
    /// the search.
    pub fn with_config(cfg: ExpectimaxConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::from_validated(cfg))
    }

    pub(crate) fn from_validated(cfg: ExpectimaxConfig) -> Self {
        debug_assert!(cfg.validate().is_ok());
        Self { cfg, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Best direction for `grid`, or `None` when no direction moves it.
    ///
    /// ```
    /// use ai_2048_lab::engine::Grid;
    /// use ai_2048_lab::expectimax::Expectimax;
    /// let stuck = Grid::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
    /// assert_eq!(Expectimax::new().best_move(stuck), None);
    /// ```
    pub fn best_move(&mut self, grid: Grid) -> Option<Direction> {
        pick_best(&self.branch_evals(grid)).map(|b| b.dir)
    }

    /// EV of every root direction, in [`SEARCH_ORDER`](super::SEARCH_ORDER).
    ///
    /// A legal branch's EV is its merge gain plus the expectation over the
    /// following spawn at `depth - 1`.
    pub fn branch_evals(&mut self, grid: Grid) -> [BranchEval; 4] {
        let mut ctx = Ctx::new(self.cfg.cache_enabled);
        let depth = self.cfg.depth;
        let mut out = SEARCH_ORDER.map(|dir| BranchEval { dir, ev: 0.0, legal: false });
        for slot in out.iter_mut() {
            let slide = grid.shift(slot.dir);
            if slide.moved {
                let ev = slide.score_gained as f64
                    + self.expectimax(slide.grid, Node::Chance, depth - 1, &mut ctx);
                *slot = BranchEval { dir: slot.dir, ev, legal: true };
            }
        }
        self.stats = ctx.stats;
        log::trace!("expectimax root: depth={} nodes={} hits={}", depth, ctx.stats.nodes, ctx.stats.cache_hits);
        out
    }

    /// EV of the best root branch, or `None` when no direction moves.
    pub fn state_value(&mut self, grid: Grid) -> Option<f64> {
        pick_best(&self.branch_evals(grid)).map(|b| b.ev)
    }

    /// Statistics from the last root call.
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    fn expectimax(&self, grid: Grid, node: Node, depth: u32, ctx: &mut Ctx) -> f64 {
        ctx.stats.nodes += 1;
        if let Some(&v) = ctx.memo.as_ref().and_then(|m| m.get(&(node, grid, depth))) {
            ctx.stats.cache_hits += 1;
            return v;
        }
        let v = match node {
            Node::Max => self.evaluate_max(grid, depth, ctx),
            Node::Chance => self.evaluate_chance(grid, depth, ctx),
        };
        if let Some(memo) = ctx.memo.as_mut() {
            memo.insert((node, grid, depth), v);
        }
        v
    }

    fn evaluate_max(&self, grid: Grid, depth: u32, ctx: &mut Ctx) -> f64 {
        if depth == 0 {
            return evaluate_grid_with(&grid, &self.cfg.weights);
        }
        let mut best: Option<f64> = None;
        for dir in SEARCH_ORDER {
            let slide = grid.shift(dir);
            if !slide.moved {
                continue;
            }
            let v = slide.score_gained as f64 + self.expectimax(slide.grid, Node::Chance, depth - 1, ctx);
            if best.map_or(true, |b| v > b) {
                best = Some(v);
            }
        }
        best.unwrap_or_else(|| evaluate_grid_with(&grid, &self.cfg.weights) - TERMINAL_PENALTY)
    }

    fn evaluate_chance(&self, grid: Grid, depth: u32, ctx: &mut Ctx) -> f64 {
        let empties = grid.empty_cells();
        if empties.is_empty() {
            // nothing spawned, so no ply is consumed
            return self.expectimax(grid, Node::Max, depth, ctx);
        }
        let p2 = self.cfg.p2;
        let p4 = self.cfg.p4();
        let inv_n = 1.0 / empties.len() as f64;
        let mut acc = 0.0;
        for (r, c) in empties {
            acc += inv_n * p2 * self.expectimax(grid.with_tile(r, c, 2), Node::Max, depth, ctx);
            acc += inv_n * p4 * self.expectimax(grid.with_tile(r, c, 4), Node::Max, depth, ctx);
        }
        acc
    }
}

impl Default for Expectimax { fn default() -> Self { Self::new() } }

// First legal branch with the strictly greatest EV.
fn pick_best(branches: &[BranchEval; 4]) -> Option<&BranchEval> {
    let mut best: Option<&BranchEval> = None;
    for b in branches.iter().filter(|b| b.legal) {
        if best.map_or(true, |cur| b.ev > cur.ev) {
            best = Some(b);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectimax::evaluate_grid;

    fn searcher(depth: u32, cache_enabled: bool) -> Expectimax {
        Expectimax::with_config(ExpectimaxConfig { depth, cache_enabled, ..Default::default() }).unwrap()
    }

    fn sample_grid() -> Grid {
        Grid::from_rows([[2, 4, 8, 0], [0, 2, 0, 0], [16, 0, 0, 4], [2, 0, 2, 0]])
    }

    #[test]
    fn rejects_bad_config() {
        assert!(Expectimax::with_config(ExpectimaxConfig { depth: 0, ..Default::default() }).is_err());
        assert!(Expectimax::with_config(ExpectimaxConfig { p2: 1.0, ..Default::default() }).is_err());
    }

    #[test]
    fn no_move_on_stuck_grid() {
        let stuck = Grid::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let mut ex = searcher(2, true);
        assert_eq!(ex.best_move(stuck), None);
        assert_eq!(ex.state_value(stuck), None);
        assert!(ex.branch_evals(stuck).iter().all(|b| !b.legal));
    }

    #[test]
    fn only_legal_direction_is_chosen() {
        // Only Left and Down move this grid
        let g = Grid::from_rows([[2, 4, 8, 16], [4, 8, 16, 32], [8, 16, 32, 64], [0, 0, 0, 128]]);
        let mut ex = searcher(1, false);
        let branches = ex.branch_evals(g);
        let legal: Vec<Direction> = branches.iter().filter(|b| b.legal).map(|b| b.dir).collect();
        assert_eq!(legal, vec![Direction::Left, Direction::Down]);
        assert!(ex.best_move(g).is_some());
    }

    #[test]
    fn depth_one_matches_hand_expectation() {
        // Single 2 in the top-right corner. Left slides it to (0,0) with no gain.
        let g = Grid::from_rows([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]]);
        let mut ex = searcher(1, false);
        let branches = ex.branch_evals(g);
        let left = branches.iter().find(|b| b.dir == Direction::Left).unwrap();
        let after = g.shift(Direction::Left).grid;
        let empties = after.empty_cells();
        let inv_n = 1.0 / empties.len() as f64;
        let mut expected = 0.0;
        for (r, c) in empties {
            expected += inv_n * 0.9 * evaluate_grid(&after.with_tile(r, c, 2));
            expected += inv_n * (1.0 - 0.9) * evaluate_grid(&after.with_tile(r, c, 4));
        }
        assert!(left.legal);
        assert_eq!(left.ev.to_bits(), expected.to_bits());
    }

    #[test]
    fn merge_gain_is_added_to_branch() {
        let g = Grid::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut ex = searcher(1, false);
        let branches = ex.branch_evals(g);
        let left = branches.iter().find(|b| b.dir == Direction::Left).unwrap();
        let right = branches.iter().find(|b| b.dir == Direction::Right).unwrap();
        // Left and right both merge for 4; mirrored grids differ only in placement
        assert!(left.ev > 4.0);
        assert!(right.ev > 4.0);
    }

    #[test]
    fn repeated_calls_are_stable() {
        let g = sample_grid();
        let mut ex = searcher(2, true);
        let first = ex.best_move(g);
        let evs = ex.branch_evals(g);
        for _ in 0..3 {
            assert_eq!(ex.best_move(g), first);
            let again = ex.branch_evals(g);
            for (a, b) in evs.iter().zip(again.iter()) {
                assert_eq!(a.ev.to_bits(), b.ev.to_bits());
            }
        }
    }

    #[test]
    fn cache_does_not_change_values() {
        let g = sample_grid();
        let cached = searcher(2, true).branch_evals(g);
        let mut plain_ex = searcher(2, false);
        let plain = plain_ex.branch_evals(g);
        for (a, b) in cached.iter().zip(plain.iter()) {
            assert_eq!(a.legal, b.legal);
            assert_eq!(a.ev.to_bits(), b.ev.to_bits());
        }
        assert_eq!(plain_ex.last_stats().cache_hits, 0);
    }

    #[test]
    fn cache_reduces_node_count() {
        let g = sample_grid();
        let mut cached = searcher(2, true);
        let mut plain = searcher(2, false);
        cached.branch_evals(g);
        plain.branch_evals(g);
        assert!(cached.last_stats().cache_hits > 0);
        assert!(cached.last_stats().nodes < plain.last_stats().nodes);
    }

    #[test]
    fn terminal_child_never_beats_live_branch() {
        // Left and Up can end the game when a 2 spawns; Right and Down never
        // do, so the best branch stays well clear of the sentinel.
        let g = Grid::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 4]]);
        let mut ex = searcher(2, false);
        let v = ex.state_value(g).unwrap();
        assert!(v > -TERMINAL_PENALTY / 2.0);
    }

    #[test]
    fn stuck_max_node_scores_finite_penalty() {
        let stuck = Grid::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        for depth in [1, 3] {
            let ex = searcher(depth, false);
            let mut ctx = Ctx::new(false);
            let v = ex.expectimax(stuck, Node::Max, depth, &mut ctx);
            assert!(v.is_finite());
            assert_eq!(v.to_bits(), (evaluate_grid(&stuck) - TERMINAL_PENALTY).to_bits());
        }
    }

    #[test]
    fn chance_node_averages_terminal_children() {
        // One empty cell whose neighbours are 8 and 16: either spawn leaves a stuck grid
        let g = Grid::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 16], [4, 2, 8, 0]]);
        let with2 = g.with_tile(3, 3, 2);
        let with4 = g.with_tile(3, 3, 4);
        assert!(with2.is_game_over() && with4.is_game_over());
        let ex = searcher(1, false);
        let mut ctx = Ctx::new(false);
        let v = ex.expectimax(g, Node::Chance, 1, &mut ctx);
        let mut expected = 0.0;
        expected += 1.0 * 0.9 * (evaluate_grid(&with2) - TERMINAL_PENALTY);
        expected += 1.0 * (1.0 - 0.9) * (evaluate_grid(&with4) - TERMINAL_PENALTY);
        assert!(v.is_finite());
        assert_eq!(v.to_bits(), expected.to_bits());
        assert!(v < -TERMINAL_PENALTY / 2.0);
    }

    #[test]
    fn full_grid_chance_keeps_depth() {
        let ex = searcher(1, false);
        let mut ctx = Ctx::new(false);
        let full = Grid::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 4]]);
        // same depth: the max node at depth 1 expands moves instead of evaluating
        let via_chance = ex.expectimax(full, Node::Chance, 1, &mut ctx);
        let via_max = ex.expectimax(full, Node::Max, 1, &mut ctx);
        assert_eq!(via_chance.to_bits(), via_max.to_bits());
        assert_ne!(via_max.to_bits(), evaluate_grid(&full).to_bits());
    }

    #[test]
    fn ties_go_to_first_in_search_order() {
        let branches = [
            BranchEval { dir: Direction::Up, ev: 1.0, legal: false },
            BranchEval { dir: Direction::Left, ev: 5.0, legal: true },
            BranchEval { dir: Direction::Right, ev: 5.0, legal: true },
            BranchEval { dir: Direction::Down, ev: 3.0, legal: true },
        ];
        assert_eq!(pick_best(&branches).map(|b| b.dir), Some(Direction::Left));
    }
}
