//! Property tests: any recorded intent sequence replays to the same state.

use proptest::prelude::*;
use strider_engine::prelude::*;

fn build() -> (Simulation, ActorId) {
    let mut sim = Simulation::new(WorldConfig::default(), ClockConfig::default()).unwrap();
    sim.world_mut()
        .geometry_mut()
        .add_static_box(Vec2::new(0.0, -0.5), Vec2::new(50.0, 0.5));
    sim.world_mut()
        .geometry_mut()
        .add_static_box(Vec2::new(3.0, 1.0), Vec2::new(0.5, 1.0));

    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(3))
        .add(IdleAction::new())
        .add(MovementAction::new(5.0))
        .add(JumpAction::new(JumpSettings::default()))
        .add(AttackAction::default());
    let player = sim
        .spawn_actor(
            BodyConfig::new(Profile::Player, Vec2::new(0.0, 0.5), Vec2::new(0.5, 0.5)),
            grid,
        )
        .unwrap();
    (sim, player)
}

fn intent() -> impl Strategy<Value = Intent> {
    (-1.5f32..1.5, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(horizontal, jump_pressed, jump_held, attack_pressed)| Intent {
            horizontal,
            jump_pressed,
            jump_held,
            attack_pressed,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Intents set on random frames replay to the recorded hash.
    #[test]
    fn random_intents_replay_exactly(
        script in prop::collection::vec((0u64..4, intent()), 1..20),
        interval in 0u64..8,
    ) {
        let (mut sim, player) = build();
        let mut recorder = ReplayRecorder::new(&sim, interval);
        for (gap, intent) in &script {
            recorder.set_intent(&mut sim, player, *intent);
            for _ in 0..=*gap {
                recorder.tick(&mut sim);
            }
        }
        let log = recorder.finish();

        let (mut fresh, _) = build();
        let result = replay(&mut fresh, &log).unwrap();
        prop_assert!(result.completed);
        prop_assert!(result.first_divergence.is_none());
        prop_assert_eq!(fresh.state_hash(), sim.state_hash());
    }

    /// Pausing for any number of frames never moves a body.
    #[test]
    fn paused_frames_never_move_bodies(warmup in 0u64..30, paused in 1u64..30, intent in intent()) {
        let (mut sim, player) = build();
        sim.set_intent(player, intent);
        sim.run_ticks(warmup);
        let before = sim.actor_body(player).unwrap().kinematic_state();

        sim.clock_mut().pause();
        sim.set_intent(player, intent);
        sim.run_ticks(paused);
        prop_assert_eq!(sim.actor_body(player).unwrap().kinematic_state(), before);
        prop_assert_eq!(sim.tick_count(), warmup + paused);
    }
}
