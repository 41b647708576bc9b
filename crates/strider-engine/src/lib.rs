//! Strider Engine -- fixed-step simulation driver for the platformer core.
//!
//! This crate ties [`strider_physics`] and [`strider_actions`] together: a
//! pausable [`TickClock`](clock::TickClock) supplies the tick delta, the
//! [`Simulation`](simulation::Simulation) steps the physics world and then
//! every actor's action grid, resolves attack areas into damage, and removes
//! actors that died. Snapshots and replay logs hash the whole state with
//! BLAKE3 for determinism checks.
//!
//! # Quick Start
//!
//! ```
//! use strider_engine::prelude::*;
//!
//! let mut sim = Simulation::new(WorldConfig::default(), ClockConfig::default()).unwrap();
//! sim.world_mut()
//!     .geometry_mut()
//!     .add_static_box(Vec2::new(0.0, -0.5), Vec2::new(50.0, 0.5));
//!
//! let mut grid = ActionGrid::new();
//! grid.add(AliveAction::new(3))
//!     .add(IdleAction::new())
//!     .add(MovementAction::new(4.0))
//!     .add(JumpAction::new(JumpSettings::default()));
//! let player = sim
//!     .spawn_actor(
//!         BodyConfig::new(Profile::Player, Vec2::new(0.0, 0.5), Vec2::new(0.5, 0.5)),
//!         grid,
//!     )
//!     .unwrap();
//!
//! sim.set_intent(player, Intent { horizontal: 1.0, ..Intent::default() });
//! sim.run_ticks(60);
//!
//! assert_eq!(sim.tick_count(), 60);
//! assert!(sim.actor_body(player).unwrap().position().x > 3.5);
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod replay;
pub mod simulation;
pub mod snapshot;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use strider_actions;
pub use strider_physics;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use strider_actions::prelude::*;
    pub use strider_physics::prelude::*;

    pub use crate::clock::{ClockConfig, ClockState, TickClock, HIT_FRAME_TIME_SCALE};
    pub use crate::replay::{
        replay, ReplayDivergence, ReplayEntry, ReplayLog, ReplayRecorder, ReplayResult,
    };
    pub use crate::simulation::{Actor, ActorId, Simulation, TickDiagnostics};
    pub use crate::snapshot::{ActorSnapshot, BodySnapshot, SimulationSnapshot};
}
