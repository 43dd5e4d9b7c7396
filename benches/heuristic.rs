use ai_2048_lab::engine::{new_game, slide_and_merge, spawn_random_tile, Direction, GameState, Grid, SpawnConfig};
use ai_2048_lab::expectimax::evaluate_grid;
use ai_2048_lab::rng::Mulberry32;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn corpus() -> Vec<Grid> {
    let mut rng = Mulberry32::new(1337);
    let spawn = SpawnConfig::default();
    let mut grids = vec![Grid::EMPTY];
    let mut s = new_game(&mut rng, &spawn);
    grids.push(s.grid);
    let seq = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];
    for i in 0..24 {
        let slide = slide_and_merge(s.grid, seq[i % seq.len()]);
        if slide.moved {
            s = spawn_random_tile(GameState::from_grid(slide.grid, s.score), &mut rng, &spawn);
        }
        grids.push(s.grid);
    }
    grids
}

fn bench_heuristic(c: &mut Criterion) {
    let grids = corpus();
    c.bench_function("heuristic/evaluate_grid", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for g in &grids {
                let v = evaluate_grid(black_box(g));
                acc = acc.mul_add(1.000_000_1, v);
            }
            black_box(acc)
        })
    });
}

criterion_group!(heuristic, bench_heuristic);
criterion_main!(heuristic);
