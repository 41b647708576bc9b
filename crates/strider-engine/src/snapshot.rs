//! Simulation snapshots with BLAKE3 hashing.
//!
//! A [`SimulationSnapshot`] records the clock, the kinematic state of every
//! registered body and each actor's intent, together with a BLAKE3 digest of
//! that data. Two simulations that went through the same inputs produce the
//! same digest, which makes [`Simulation::state_hash`] the cheapest way to
//! check determinism.
//!
//! # Usage
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
//! grid.add(IdleAction::new()).add(MovementAction::new(3.0));
//! let walker = sim
//!     .spawn_actor(
//!         BodyConfig::new(Profile::Player, Vec2::new(0.0, 0.5), Vec2::new(0.5, 0.5)),
//!         grid,
//!     )
//!     .unwrap();
//! sim.set_intent(walker, Intent { horizontal: 1.0, ..Intent::default() });
//! sim.run_ticks(20);
//!
//! let fork = sim.fork_snapshot();
//! assert_eq!(fork.hash.len(), 64);
//!
//! sim.run_ticks(20);
//! let hash_a = sim.state_hash();
//!
//! sim.restore_kinematics(&fork).unwrap();
//! assert_eq!(sim.tick_count(), 20);
//! sim.run_ticks(20);
//! assert_eq!(sim.state_hash(), hash_a);
//! ```
//!
//! # What Is NOT Restored
//!
//! - **Action state** -- grids keep their current statuses and the private
//!   state of their actions (jump phase, hit points, patrol leg).
//! - **Static geometry** -- level colliders are not part of the snapshot.
//! - **Pending events** -- queued bus messages stay where they are.
//! - **Diagnostics** -- per-tick timing is transient.

use serde::{Deserialize, Serialize};
use strider_actions::context::Intent;
use strider_physics::body::{BodyHandle, KinematicState};

use crate::clock::ClockState;
use crate::simulation::{ActorId, Simulation};

// ---------------------------------------------------------------------------
// SimulationSnapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub state: KinematicState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub body: BodyHandle,
    pub intent: Intent,
}

/// A serializable snapshot of the restorable simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub clock: ClockState,
    /// Registered bodies in registration order.
    pub bodies: Vec<BodySnapshot>,
    /// Actors in spawn order.
    pub actors: Vec<ActorSnapshot>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of the fields above.
    pub hash: String,
}

impl SimulationSnapshot {
    pub fn to_json(&self) -> Result<String, anyhow::Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        serde_json::from_str(json).map_err(|e| anyhow::anyhow!("invalid snapshot JSON: {e}"))
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

fn compute_hash(clock: &ClockState, bodies: &[BodySnapshot], actors: &[ActorSnapshot]) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        clock: &'a ClockState,
        bodies: &'a [BodySnapshot],
        actors: &'a [ActorSnapshot],
    }

    let hashable = HashableState {
        clock,
        bodies,
        actors,
    };

    let json_bytes = serde_json::to_vec(&hashable)
        .expect("simulation state should always be JSON-serializable");

    blake3::hash(&json_bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Simulation snapshot/restore methods
// ---------------------------------------------------------------------------

impl Simulation {
    fn snapshot_parts(&self) -> (ClockState, Vec<BodySnapshot>, Vec<ActorSnapshot>) {
        let bodies = self
            .world()
            .bodies()
            .map(|body| BodySnapshot {
                handle: body.handle(),
                state: body.kinematic_state(),
            })
            .collect();
        let actors = self
            .actors()
            .iter()
            .map(|actor| ActorSnapshot {
                id: actor.id(),
                body: actor.body(),
                intent: actor.intent(),
            })
            .collect();
        (self.clock().state(), bodies, actors)
    }

    pub fn capture_snapshot(&self) -> SimulationSnapshot {
        let (clock, bodies, actors) = self.snapshot_parts();
        let hash = compute_hash(&clock, &bodies, &actors);
        tracing::debug!(frame = clock.frame, %hash, "snapshot captured");
        SimulationSnapshot {
            clock,
            bodies,
            actors,
            hash,
        }
    }

    /// BLAKE3 digest of the current state, without building a snapshot.
    pub fn state_hash(&self) -> String {
        let (clock, bodies, actors) = self.snapshot_parts();
        compute_hash(&clock, &bodies, &actors)
    }

    /// Capture a branch point to restore later, possibly more than once.
    pub fn fork_snapshot(&self) -> SimulationSnapshot {
        self.capture_snapshot()
    }

    /// Put the clock, every snapshotted body and every actor intent back.
    ///
    /// Fails without touching anything if the snapshot is corrupted or
    /// refers to a body or actor that no longer exists.
    pub fn restore_kinematics(&mut self, snapshot: &SimulationSnapshot) -> Result<(), anyhow::Error> {
        let fixed_dt = snapshot.clock.fixed_dt;
        if !(fixed_dt > 0.0 && fixed_dt.is_finite()) {
            return Err(anyhow::anyhow!(
                "snapshot has invalid fixed_dt: {fixed_dt}. Must be positive and finite."
            ));
        }

        let expected_hash = compute_hash(&snapshot.clock, &snapshot.bodies, &snapshot.actors);
        if expected_hash != snapshot.hash {
            return Err(anyhow::anyhow!(
                "snapshot hash mismatch: recorded {} but recomputed {}. \
                 The snapshot may be corrupted or tampered with.",
                snapshot.hash,
                expected_hash
            ));
        }

        if let Some(missing) = snapshot
            .bodies
            .iter()
            .find(|b| self.world().body(b.handle).is_none())
        {
            return Err(anyhow::anyhow!("snapshot references unknown body {}", missing.handle));
        }
        if let Some(missing) = snapshot.actors.iter().find(|a| self.actor(a.id).is_none()) {
            return Err(anyhow::anyhow!("snapshot references unknown actor {}", missing.id));
        }

        for body in &snapshot.bodies {
            self.world_mut()
                .restore_kinematic_state(body.handle, &body.state)
                .map_err(|e| anyhow::anyhow!("failed to restore {}: {e}", body.handle))?;
        }
        for actor in &snapshot.actors {
            self.restore_intent(actor.id, actor.intent);
        }
        self.restore_clock(&snapshot.clock);

        tracing::debug!(frame = snapshot.clock.frame, hash = %snapshot.hash, "snapshot restored");
        Ok(())
    }
}
