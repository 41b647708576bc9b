//! The simulation driver.
//!
//! [`Simulation`] owns the physics world, the event bus, the clock and every
//! actor. One call to [`Simulation::tick`] runs these phases in order:
//!
//! 1. **Physics** -- the world moves every registered body by the clock delta.
//! 2. **Actions** -- each actor's grid arbitrates against the fresh physics
//!    state, in spawn order, and writes velocities for the next tick.
//! 3. **Attacks** -- attack areas published during phase 2 become
//!    `DamageReceived` events for every overlapping body except the attacker.
//! 4. **Despawns** -- actors whose actions requested it are disabled and
//!    their bodies destroyed.
//!
//! While the clock is paused a tick only counts the frame.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use strider_actions::prelude::*;
use strider_physics::prelude::*;

use crate::clock::{ClockConfig, ClockState, TickClock};

// ---------------------------------------------------------------------------
// ActorId
// ---------------------------------------------------------------------------

/// Stable identifier of an actor, never reused within a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// A body driven by an action grid.
#[derive(Debug)]
pub struct Actor {
    id: ActorId,
    body: BodyHandle,
    grid: ActionGrid,
    intent: Intent,
    despawn_requested: bool,
}

impl Actor {
    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn grid(&self) -> &ActionGrid {
        &self.grid
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timings and counters for a single tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Frame number of this tick.
    pub frame: u64,
    /// Delta the tick ran with. Zero when paused.
    pub dt: f32,
    pub physics_time: Duration,
    pub actions_time: Duration,
    pub attacks_time: Duration,
    pub despawn_time: Duration,
    pub total_time: Duration,
    /// `DamageReceived` events published by attack resolution.
    pub hits: usize,
    /// Actors removed at the end of the tick.
    pub despawned: Vec<ActorId>,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

pub struct Simulation {
    world: PhysicsWorldHandler,
    events: EventBus,
    clock: TickClock,
    actors: Vec<Actor>,
    next_actor: u32,
    attack_listener: Subscription,
    last_diagnostics: TickDiagnostics,
}

impl Simulation {
    pub fn new(world_config: WorldConfig, clock_config: ClockConfig) -> Result<Self, PhysicsError> {
        let world = PhysicsWorldHandler::new(world_config)?;
        let mut events = EventBus::new();
        let attack_listener = events.subscribe();
        Ok(Self {
            world,
            events,
            clock: TickClock::new(clock_config),
            actors: Vec::new(),
            next_actor: 0,
            attack_listener,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn world(&self) -> &PhysicsWorldHandler {
        &self.world
    }

    /// Mutable world access, for level geometry and bodies without actors.
    pub fn world_mut(&mut self) -> &mut PhysicsWorldHandler {
        &mut self.world
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut TickClock {
        &mut self.clock
    }

    /// Actors in spawn order.
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    /// Body of an actor, if both still exist.
    pub fn actor_body(&self, id: ActorId) -> Option<&PhysicsBody> {
        self.actor(id).and_then(|a| self.world.body(a.body))
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Frames counted so far, paused ones included.
    pub fn tick_count(&self) -> u64 {
        self.clock.frame()
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    // -----------------------------------------------------------------------
    // Actors
    // -----------------------------------------------------------------------

    /// Create a body for `config` and attach `grid` to it.
    pub fn spawn_actor(&mut self, config: BodyConfig, grid: ActionGrid) -> Result<ActorId, PhysicsError> {
        let body = self.world.create_body(config)?;
        let id = ActorId(self.next_actor);
        self.next_actor += 1;
        self.actors.push(Actor {
            id,
            body,
            grid,
            intent: Intent::default(),
            despawn_requested: false,
        });
        tracing::debug!(actor = %id, %body, "actor spawned");
        Ok(id)
    }

    /// Replace an actor's intent. Returns `false` for unknown actors.
    ///
    /// Pressed flags are consumed by the next running tick.
    pub fn set_intent(&mut self, id: ActorId, intent: Intent) -> bool {
        match self.actors.iter_mut().find(|a| a.id == id) {
            Some(actor) => {
                actor.intent = intent;
                true
            }
            None => {
                tracing::warn!(actor = %id, "intent ignored for unknown actor");
                false
            }
        }
    }

    /// Stop the actor's actions and destroy its body. Returns `false` for
    /// unknown actors.
    pub fn despawn_actor(&mut self, id: ActorId) -> bool {
        let Some(index) = self.actors.iter().position(|a| a.id == id) else {
            return false;
        };
        let mut actor = self.actors.remove(index);
        let dt = self.clock.delta();
        let frame = self.clock.frame();
        if let Some((body, config)) = self.world.body_and_config_mut(actor.body) {
            let mut ctx = ActionContext::new(body, config, &mut self.events, dt);
            ctx.intent = actor.intent;
            ctx.frame = frame;
            actor.grid.disable(&mut ctx);
        }
        self.world.destroy_body(actor.body);
        tracing::debug!(actor = %id, body = %actor.body, "actor despawned");
        true
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run one frame.
    pub fn tick(&mut self) -> &TickDiagnostics {
        let tick_start = Instant::now();
        let dt = self.clock.advance();
        let mut diagnostics = TickDiagnostics {
            frame: self.clock.frame(),
            dt,
            ..TickDiagnostics::default()
        };

        if dt <= 0.0 {
            tracing::trace!(frame = diagnostics.frame, "tick skipped while paused");
            diagnostics.total_time = tick_start.elapsed();
            self.last_diagnostics = diagnostics;
            return &self.last_diagnostics;
        }

        let start = Instant::now();
        self.world.tick(dt);
        diagnostics.physics_time = start.elapsed();

        let start = Instant::now();
        self.run_actions(dt);
        diagnostics.actions_time = start.elapsed();

        let start = Instant::now();
        diagnostics.hits = self.resolve_attacks();
        diagnostics.attacks_time = start.elapsed();

        let start = Instant::now();
        let doomed: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|a| a.despawn_requested)
            .map(|a| a.id)
            .collect();
        for id in &doomed {
            self.despawn_actor(*id);
        }
        diagnostics.despawned = doomed;
        diagnostics.despawn_time = start.elapsed();

        diagnostics.total_time = tick_start.elapsed();
        self.last_diagnostics = diagnostics;
        &self.last_diagnostics
    }

    /// Run `count` frames and return the diagnostics of each.
    pub fn run_ticks(&mut self, count: u64) -> Vec<TickDiagnostics> {
        (0..count).map(|_| self.tick().clone()).collect()
    }

    fn run_actions(&mut self, dt: f32) {
        let frame = self.clock.frame();
        for actor in &mut self.actors {
            let Some((body, config)) = self.world.body_and_config_mut(actor.body) else {
                tracing::warn!(actor = %actor.id, body = %actor.body, "actor has no body");
                continue;
            };
            let mut ctx = ActionContext::new(body, config, &mut self.events, dt);
            ctx.intent = actor.intent;
            ctx.frame = frame;
            actor.grid.tick(&mut ctx);
            actor.despawn_requested |= ctx.despawn_requested;

            actor.intent.jump_pressed = false;
            actor.intent.attack_pressed = false;
        }
    }

    /// Turn this tick's attack areas into damage events. Returns the number
    /// of hits.
    fn resolve_attacks(&mut self) -> usize {
        let mut hits = 0;
        for event in self.attack_listener.drain() {
            let GameEvent::AttackArea {
                source,
                area,
                mask,
                damage,
            } = event
            else {
                continue;
            };
            for target in self.world.overlapping_bodies(&area, mask) {
                if target == source {
                    continue;
                }
                tracing::debug!(%source, %target, damage, "attack hit");
                self.events.publish(GameEvent::DamageReceived {
                    target,
                    source,
                    damage,
                });
                hits += 1;
            }
        }
        hits
    }

    pub(crate) fn restore_clock(&mut self, state: &ClockState) {
        self.clock.restore(state);
    }

    pub(crate) fn restore_intent(&mut self, id: ActorId, intent: Intent) {
        if let Some(actor) = self.actors.iter_mut().find(|a| a.id == id) {
            actor.intent = intent;
        }
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.clock.frame())
            .field("paused", &self.clock.is_paused())
            .field("actors", &self.actors.len())
            .field("bodies", &self.world.body_count())
            .finish()
    }
}
