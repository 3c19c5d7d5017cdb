//! Full level tick throughput with a growing enemy population.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use sidescroll::core::vec2::Vec2;
use sidescroll::game::factory::SpawnDescriptor;
use sidescroll::game::input::InputFrame;
use sidescroll::game::state::{LevelBuilder, LevelState};
use sidescroll::game::tick::tick;
use sidescroll::game::world::TileMap;

const ARCHETYPES: [&str; 5] = ["grunt", "brute", "hound", "archer", "caster"];

fn make_level(enemies: usize) -> LevelState {
    let width = 16 + enemies * 3;
    let air = ".".repeat(width);
    let ground = "#".repeat(width);
    let mut rows: Vec<&str> = vec![air.as_str(); 10];
    rows.push(ground.as_str());

    let spawns = (0..enemies)
        .map(|i| {
            let archetype = ARCHETYPES[i % ARCHETYPES.len()];
            let y = if archetype == "caster" { 80.0 } else { 24.0 };
            SpawnDescriptor::new(archetype, Vec2::new(96.0 + i as f32 * 48.0, y))
        })
        .collect();

    LevelBuilder::new(12345)
        .world(TileMap::from_rows(&rows, 16.0))
        .player_spawn(Vec2::new(32.0, 24.0))
        .spawns(spawns)
        .build()
        .expect("bench level builds")
}

fn make_inputs(count: usize) -> Vec<InputFrame> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            let x = rng.gen_range(-1.0f32..=1.0);
            let flags = rng.gen_range(0u8..16);
            InputFrame::from_axes(x, 0.0).with_flags(flags)
        })
        .collect()
}

fn bench_tick(c: &mut Criterion) {
    let inputs = make_inputs(600);
    let mut group = c.benchmark_group("level_tick");
    for &n in &[1usize, 10, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut level = make_level(n);
            let mut i = 0;
            b.iter(|| {
                let result = tick(&mut level, &inputs[i % inputs.len()]);
                i += 1;
                result.events.len()
            });
        });
    }
    group.finish();
}

fn bench_state_hash(c: &mut Criterion) {
    let level = make_level(200);
    c.bench_function("state_hash_200", |b| b.iter(|| level.compute_hash()));
}

criterion_group!(benches, bench_tick, bench_state_hash);
criterion_main!(benches);
