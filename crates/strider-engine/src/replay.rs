//! Deterministic replay of recorded intents.
//!
//! A [`ReplayRecorder`] wraps a running [`Simulation`]: every intent routed
//! through it is logged with its frame, and every `checkpoint_interval`
//! frames the state hash is logged before the tick runs. [`replay`] feeds the
//! same intents to a simulation built the same way and reports the first
//! checkpoint whose hash differs.
//!
//! ```
//! use strider_engine::prelude::*;
//! use strider_engine::replay::{replay, ReplayRecorder};
//!
//! fn build() -> (Simulation, ActorId) {
//!     let mut sim = Simulation::new(WorldConfig::default(), ClockConfig::default()).unwrap();
//!     sim.world_mut()
//!         .geometry_mut()
//!         .add_static_box(Vec2::new(0.0, -0.5), Vec2::new(50.0, 0.5));
//!     let mut grid = ActionGrid::new();
//!     grid.add(IdleAction::new()).add(MovementAction::new(3.0));
//!     let id = sim
//!         .spawn_actor(
//!             BodyConfig::new(Profile::Player, Vec2::new(0.0, 0.5), Vec2::new(0.5, 0.5)),
//!             grid,
//!         )
//!         .unwrap();
//!     (sim, id)
//! }
//!
//! let (mut sim, walker) = build();
//! let mut recorder = ReplayRecorder::new(&sim, 10);
//! recorder.set_intent(&mut sim, walker, Intent { horizontal: 1.0, ..Intent::default() });
//! for _ in 0..30 {
//!     recorder.tick(&mut sim);
//! }
//! let log = recorder.finish();
//!
//! let (mut fresh, _) = build();
//! let result = replay(&mut fresh, &log).unwrap();
//! assert!(result.completed);
//! assert!(result.first_divergence.is_none());
//! assert_eq!(fresh.state_hash(), sim.state_hash());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strider_actions::context::Intent;

use crate::simulation::{ActorId, Simulation};
use crate::snapshot::SimulationSnapshot;

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// Initial snapshot plus the ordered intents and checkpoints of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    pub initial_snapshot: SimulationSnapshot,
    /// Frames to run from the initial snapshot.
    pub total_ticks: u64,
    pub entries: Vec<ReplayEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// An intent set before the tick at `tick` ran.
    Intent { tick: u64, actor: ActorId, intent: Intent },
    /// State hash taken before the tick at `tick` ran, after its intents.
    Checkpoint { tick: u64, state_hash: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    pub completed: bool,
    pub ticks_replayed: u64,
    /// First checkpoint that did not match. `None` when the run was
    /// deterministic.
    pub first_divergence: Option<ReplayDivergence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub tick: u64,
    pub expected_hash: String,
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

pub struct ReplayRecorder {
    log: ReplayLog,
    /// 0 checkpoints every tick.
    checkpoint_interval: u64,
}

impl ReplayRecorder {
    /// Start recording from the current state of `sim`.
    pub fn new(sim: &Simulation, checkpoint_interval: u64) -> Self {
        Self {
            log: ReplayLog {
                initial_snapshot: sim.capture_snapshot(),
                total_ticks: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
        }
    }

    /// Set an actor's intent and log it for the upcoming tick.
    pub fn set_intent(&mut self, sim: &mut Simulation, actor: ActorId, intent: Intent) -> bool {
        if !sim.set_intent(actor, intent) {
            return false;
        }
        let tick = sim.tick_count();
        // A later intent for the same actor and frame replaces the earlier one.
        self.log.entries.retain(|entry| {
            !matches!(entry, ReplayEntry::Intent { tick: t, actor: a, .. } if *t == tick && *a == actor)
        });
        self.log.entries.push(ReplayEntry::Intent {
            tick,
            actor,
            intent,
        });
        true
    }

    /// Checkpoint if due, then tick `sim`.
    pub fn tick(&mut self, sim: &mut Simulation) {
        let tick = sim.tick_count();
        let due = self.checkpoint_interval == 0 || tick % self.checkpoint_interval == 0;
        if due {
            self.log.entries.push(ReplayEntry::Checkpoint {
                tick,
                state_hash: sim.state_hash(),
            });
        }
        sim.tick();
        self.log.total_ticks += 1;
    }

    pub fn finish(self) -> ReplayLog {
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Re-run `log` on `sim`, checking every checkpoint.
///
/// `sim` must hold the same actors, bodies and level as the recorded one
/// did. The log is validated before `sim` is touched.
pub fn replay(sim: &mut Simulation, log: &ReplayLog) -> Result<ReplayResult, anyhow::Error> {
    let mut intents: BTreeMap<u64, Vec<(ActorId, Intent)>> = BTreeMap::new();
    let mut checkpoints: BTreeMap<u64, &str> = BTreeMap::new();

    for entry in &log.entries {
        match entry {
            ReplayEntry::Intent {
                tick,
                actor,
                intent,
            } => {
                let frame = intents.entry(*tick).or_default();
                if frame.iter().any(|(a, _)| a == actor) {
                    return Err(anyhow::anyhow!(
                        "replay log contains duplicate intent for {actor} at tick {tick}"
                    ));
                }
                frame.push((*actor, *intent));
            }
            ReplayEntry::Checkpoint { tick, state_hash } => {
                if checkpoints.insert(*tick, state_hash).is_some() {
                    return Err(anyhow::anyhow!(
                        "replay log contains duplicate checkpoint at tick {tick}"
                    ));
                }
            }
        }
    }

    let start_tick = log.initial_snapshot.clock.frame;
    let total_ticks = log.total_ticks;
    let end_tick = start_tick.checked_add(total_ticks).ok_or_else(|| {
        anyhow::anyhow!(
            "tick range overflow: start_tick ({start_tick}) + total_ticks ({total_ticks}) exceeds u64::MAX"
        )
    })?;

    sim.restore_kinematics(&log.initial_snapshot)
        .map_err(|e| anyhow::anyhow!("failed to restore initial snapshot for replay: {e}"))?;

    let mut ticks_replayed = 0;
    for tick in start_tick..end_tick {
        for (actor, intent) in intents.get(&tick).into_iter().flatten() {
            sim.set_intent(*actor, *intent);
        }

        if let Some(expected) = checkpoints.get(&tick) {
            let actual = sim.state_hash();
            if actual != *expected {
                tracing::warn!(tick, expected = %expected, actual = %actual, "replay diverged");
                return Ok(ReplayResult {
                    completed: false,
                    ticks_replayed,
                    first_divergence: Some(ReplayDivergence {
                        tick,
                        expected_hash: expected.to_string(),
                        actual_hash: actual,
                    }),
                });
            }
        }

        sim.tick();
        ticks_replayed += 1;
    }

    Ok(ReplayResult {
        completed: true,
        ticks_replayed,
        first_divergence: None,
    })
}
