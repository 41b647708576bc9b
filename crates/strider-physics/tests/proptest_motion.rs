//! Property tests for body motion resolution.
//!
//! These tests drive single bodies with random velocities and tick deltas and
//! check the resolver's invariants: tiny motions never sweep, the reported
//! velocity always matches the applied translation, and a blocked body stops
//! exactly at the obstacle.

use proptest::prelude::*;
use strider_physics::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn empty_world() -> PhysicsWorldHandler {
    PhysicsWorldHandler::new(WorldConfig::default()).unwrap()
}

/// Floating player with a wall whose face is at x = 3.0 (gap 2.5).
fn world_with_wall() -> (PhysicsWorldHandler, BodyHandle) {
    let mut world = empty_world();
    world
        .geometry_mut()
        .add_static_box(Vec2::new(3.5, 0.0), Vec2::new(0.5, 3.0));
    let player = world
        .create_body(BodyConfig::new(Profile::Player, Vec2::zeros(), Vec2::new(0.5, 0.5)))
        .unwrap();
    world.body_mut(player).unwrap().set_gravity_scale(0.0);
    (world, player)
}

fn small_speed() -> impl Strategy<Value = f32> {
    (-100i32..100i32).prop_map(|v| v as f32 * 1e-6)
}

fn speed() -> impl Strategy<Value = f32> {
    (-8000i32..8000i32).prop_map(|v| v as f32 * 0.001)
}

fn tick_delta() -> impl Strategy<Value = f32> {
    (1u32..=10u32).prop_map(|n| n as f32 / 60.0)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Motion below epsilon on both axes issues no sweep and records nothing.
    #[test]
    fn sub_epsilon_motion_never_sweeps(vx in small_speed(), vy in small_speed()) {
        let mut world = empty_world();
        world
            .geometry_mut()
            .add_static_box(Vec2::new(0.6, 0.0), Vec2::new(0.1, 0.1));
        let body = world
            .create_body(BodyConfig::new(Profile::Player, Vec2::zeros(), Vec2::new(0.5, 0.5)))
            .unwrap();
        {
            let body = world.body_mut(body).unwrap();
            body.set_gravity_scale(0.0);
            body.set_velocity(Vec2::new(vx, vy));
        }

        world.tick(1.0 / 60.0);

        let body = world.body(body).unwrap();
        prop_assert_eq!(body.sweep_count(), 0);
        prop_assert!(world.collision_cache().is_empty());
        prop_assert_eq!(body.position(), Vec2::zeros());
    }

    /// Realized velocity times the tick delta equals the applied motion.
    #[test]
    fn realized_velocity_matches_motion(
        vx in speed(),
        vy in speed(),
        dt in tick_delta(),
        ticks in 1usize..20,
    ) {
        let mut world = empty_world();
        world
            .geometry_mut()
            .add_static_box(Vec2::new(0.0, -0.5), Vec2::new(20.0, 0.5));
        world
            .geometry_mut()
            .add_static_box(Vec2::new(6.0, 3.0), Vec2::new(0.5, 3.0));
        let body = world
            .create_body(BodyConfig::new(Profile::Player, Vec2::new(0.0, 1.0), Vec2::new(0.5, 0.5)))
            .unwrap();
        world.body_mut(body).unwrap().set_velocity(Vec2::new(vx, vy));

        for _ in 0..ticks {
            let before = world.body(body).unwrap().position();
            world.tick(dt);
            let body = world.body(body).unwrap();
            let realized = body.realized_motion();
            prop_assert!((body.total_simulated_velocity() * dt - realized).norm() < 1e-4);
            prop_assert!((body.position() - before - realized).norm() < 1e-4);
        }
    }

    /// A body moving toward a wall travels min(gap, motion) and never more.
    #[test]
    fn wall_displacement_is_min_of_gap_and_motion(speed in 100u32..6000u32) {
        let speed = speed as f32 * 0.001;
        let (mut world, player) = world_with_wall();
        world.body_mut(player).unwrap().set_speed_x(speed);

        world.tick(1.0);

        let body = world.body(player).unwrap();
        let expected = speed.min(2.5);
        prop_assert!((body.position().x - expected).abs() < 1e-3,
            "speed {} moved {}", speed, body.position().x);
        prop_assert!(body.bounds().max().x <= 3.0 + 1e-3);
    }
}
