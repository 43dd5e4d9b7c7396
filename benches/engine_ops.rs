use ai_2048_lab::engine::{apply_move, new_game, slide_and_merge, Direction, Grid, SpawnConfig};
use ai_2048_lab::rng::Mulberry32;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn mid_game() -> Grid {
    Grid::from_rows([[2, 4, 8, 16], [0, 2, 2, 32], [4, 0, 4, 64], [128, 256, 0, 2]])
}

fn bench_slide(c: &mut Criterion) {
    let g = mid_game();
    c.bench_function("engine/slide_and_merge_all_dirs", |bch| {
        bch.iter(|| {
            let mut gained = 0u64;
            for dir in Direction::ALL {
                gained += slide_and_merge(black_box(g), dir).score_gained;
            }
            black_box(gained)
        })
    });
}

fn bench_apply(c: &mut Criterion) {
    let spawn = SpawnConfig::default();
    c.bench_function("engine/apply_move_cycle", |bch| {
        bch.iter(|| {
            let mut rng = Mulberry32::new(7);
            let mut s = new_game(&mut rng, &spawn);
            for i in 0..64 {
                if s.is_game_over {
                    break;
                }
                let res = apply_move(&s, Direction::ALL[i % 4], &mut rng, &spawn);
                s = res.next;
            }
            black_box(s.score)
        })
    });
}

criterion_group!(engine_ops, bench_slide, bench_apply);
criterion_main!(engine_ops);
