use ai_2048_lab::engine::{apply_move, new_game, Direction, Grid, SpawnConfig};
use ai_2048_lab::expectimax::{Expectimax, ExpectimaxConfig};
use ai_2048_lab::rng::Mulberry32;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn corpus() -> Vec<Grid> {
    let mut rng = Mulberry32::new(7777);
    let spawn = SpawnConfig::default();
    let mut s = new_game(&mut rng, &spawn);
    let mut grids = vec![s.grid];
    let seq = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];
    for i in 0..32 {
        if s.is_game_over {
            break;
        }
        s = apply_move(&s, seq[i % seq.len()], &mut rng, &spawn).next;
        grids.push(s.grid);
    }
    grids
}

fn bench_best_move(c: &mut Criterion) {
    let grids = corpus();
    let mut group = c.benchmark_group("expectimax/best_move");
    for depth in [1u32, 2, 3] {
        for cache in [false, true] {
            let cfg = ExpectimaxConfig { depth, cache_enabled: cache, ..Default::default() };
            let mut ex = Expectimax::with_config(cfg).unwrap();
            let id = BenchmarkId::new(if cache { "cached" } else { "uncached" }, depth);
            group.bench_with_input(id, &grids, |bch, grids| {
                bch.iter(|| {
                    let mut n = 0usize;
                    for &g in grids {
                        if ex.best_move(black_box(g)).is_some() {
                            n += 1;
                        }
                    }
                    black_box(n)
                })
            });
        }
    }
    group.finish();
}

fn bench_branch_evals(c: &mut Criterion) {
    let grids = corpus();
    let mut ex = Expectimax::new();
    c.bench_function("expectimax/branch_evals", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &g in &grids {
                for b in ex.branch_evals(black_box(g)) {
                    if b.legal {
                        acc += b.ev;
                    }
                }
            }
            black_box(acc)
        })
    });
}

criterion_group!(expectimax, bench_best_move, bench_branch_evals);
criterion_main!(expectimax);
