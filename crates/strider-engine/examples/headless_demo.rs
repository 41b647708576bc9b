//! Headless platformer run -- a scripted player walks, jumps and clears a
//! patrolling guard, then the state hash and a replay check are printed.
//!
//! Run with:
//!   cargo run --example headless_demo -p strider-engine
//!
//! Set `RUST_LOG=strider_engine=debug` to watch spawns, hits and despawns.

use strider_engine::prelude::*;

const TICKS: u64 = 600;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

struct Demo {
    sim: Simulation,
    player: ActorId,
    guard: ActorId,
}

fn build_level() -> Result<Demo, anyhow::Error> {
    let world_config = WorldConfig::from_json_str(r#"{ "gravity": [0.0, -9.81] }"#)?;
    let mut sim = Simulation::new(world_config, ClockConfig::default())?;

    {
        let geometry = sim.world_mut().geometry_mut();
        geometry.add_static_box(Vec2::new(0.0, -0.5), Vec2::new(40.0, 0.5));
        // A ramp up to a ledge.
        geometry.add_static_triangle(Vec2::new(6.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 1.5));
        geometry.add_static_box(Vec2::new(13.0, 0.75), Vec2::new(3.0, 0.75));
        geometry.add_static_box(Vec2::new(20.0, 2.0), Vec2::new(0.5, 2.0));
    }

    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(3))
        .add(IdleAction::new())
        .add(MovementAction::new(5.0))
        .add(JumpAction::new(JumpSettings::default()))
        .add(AttackAction::new(0.25, 2, CollisionLayers::AI));
    let player = sim.spawn_actor(
        BodyConfig::new(Profile::Player, Vec2::new(0.0, 0.5), Vec2::new(0.4, 0.5)),
        grid,
    )?;

    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(2)).add(PatrolAction::new(
        vec![Vec2::new(12.0, 1.9), Vec2::new(15.0, 1.9)],
        0.5,
    ));
    let guard = sim.spawn_actor(
        BodyConfig::new(Profile::AI, Vec2::new(12.0, 1.9), Vec2::new(0.4, 0.4)),
        grid,
    )?;

    Ok(Demo { sim, player, guard })
}

/// The player's scripted input for frame `tick`.
fn script(tick: u64) -> Intent {
    match tick {
        0..=179 => Intent {
            horizontal: 1.0,
            ..Intent::default()
        },
        180..=239 => Intent {
            jump_pressed: tick == 180,
            jump_held: tick < 200,
            ..Intent::default()
        },
        _ => Intent {
            horizontal: if (tick / 60) % 2 == 0 { 1.0 } else { -1.0 },
            attack_pressed: tick % 30 == 0,
            ..Intent::default()
        },
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let Demo {
        mut sim,
        player,
        guard,
    } = build_level()?;
    let mut recorder = ReplayRecorder::new(&sim, 30);

    let mut hits = 0;
    for _ in 0..TICKS {
        let tick = sim.tick_count();
        recorder.set_intent(&mut sim, player, script(tick));
        recorder.tick(&mut sim);
        hits += sim.last_diagnostics().hits;

        if tick % 60 == 0 {
            if let Some(body) = sim.actor_body(player) {
                tracing::info!(
                    tick,
                    x = body.position().x,
                    y = body.position().y,
                    grounded = body.is_grounded(),
                    "player"
                );
            }
            if let Some(actor) = sim.actor(player) {
                tracing::info!(tick, "executing:\n{}", actor.grid());
            }
        }
    }

    let body = sim
        .actor_body(player)
        .ok_or_else(|| anyhow::anyhow!("player despawned"))?;
    println!("frames:        {}", sim.tick_count());
    println!("player:        ({:.3}, {:.3})", body.position().x, body.position().y);
    println!("hits landed:   {hits}");
    println!(
        "guard:         {}",
        if sim.actor(guard).is_some() { "alive" } else { "defeated" }
    );
    println!("state hash:    {}", sim.state_hash());

    let log = recorder.finish();
    let Demo { sim: mut fresh, .. } = build_level()?;
    let result = replay(&mut fresh, &log)?;
    match result.first_divergence {
        None => println!("replay:        {} frames, deterministic", result.ticks_replayed),
        Some(d) => println!("replay:        diverged at frame {}", d.tick),
    }

    Ok(())
}
