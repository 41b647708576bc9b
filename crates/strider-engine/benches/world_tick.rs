//! Simulation tick benchmarks.
//!
//! Measures a full frame (physics, arbitration, attack resolution) for a
//! level with a growing crowd of patrolling actors, plus the cost of a raw
//! world tick and a state hash at the same sizes.
//!
//! Run with: `cargo bench --bench world_tick`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use strider_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A long floor with `count` patrolling actors spaced two units apart and a
/// walking player.
fn crowded_level(count: usize) -> Simulation {
    let mut sim = Simulation::new(WorldConfig::default(), ClockConfig::default())
        .expect("default world config is valid");
    let half_width = count as f32 * 2.0 + 10.0;
    sim.world_mut()
        .geometry_mut()
        .add_static_box(Vec2::new(0.0, -0.5), Vec2::new(half_width, 0.5));

    for i in 0..count {
        let x = i as f32 * 2.0 - count as f32;
        let mut grid = ActionGrid::new();
        grid.add(AliveAction::new(100)).add(PatrolAction::new(
            vec![Vec2::new(x, 0.4), Vec2::new(x + 1.0, 0.4)],
            0.2,
        ));
        sim.spawn_actor(
            BodyConfig::new(Profile::AI, Vec2::new(x, 0.4), Vec2::new(0.4, 0.4)),
            grid,
        )
        .expect("actor config is valid");
    }

    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(3))
        .add(IdleAction::new())
        .add(MovementAction::new(4.0))
        .add(AttackAction::default());
    let player = sim
        .spawn_actor(
            BodyConfig::new(Profile::Player, Vec2::new(0.0, 0.5), Vec2::new(0.5, 0.5)),
            grid,
        )
        .expect("player config is valid");
    sim.set_intent(
        player,
        Intent {
            horizontal: 1.0,
            ..Intent::default()
        },
    );

    // Let everything settle onto the floor.
    sim.run_ticks(10);
    sim
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_simulation_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_tick");
    for count in [10usize, 100, 500] {
        let mut sim = crowded_level(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &_count| {
            b.iter(|| {
                black_box(sim.tick().total_time);
            });
        });
    }
    group.finish();
}

fn bench_world_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_tick");
    for count in [10usize, 100, 500] {
        let mut sim = crowded_level(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &_count| {
            b.iter(|| {
                sim.world_mut().tick(black_box(1.0 / 60.0));
            });
        });
    }
    group.finish();
}

fn bench_state_hash(c: &mut Criterion) {
    let sim = crowded_level(100);
    c.bench_function("state_hash_100", |b| {
        b.iter(|| black_box(sim.state_hash()));
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_simulation_tick, bench_world_tick, bench_state_hash);
criterion_main!(benches);
