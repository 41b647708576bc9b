//! What actions see and touch during a grid tick.

use serde::{Deserialize, Serialize};
use strider_physics::body::PhysicsBody;
use strider_physics::config::WorldConfig;

use crate::action::ActionStatus;
use crate::events::EventBus;
use crate::grid::GridQuery;

/// Raw directional and button intent for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Intent {
    /// -1 left, 0 none, 1 right.
    pub horizontal: f32,
    /// Jump went down this tick.
    pub jump_pressed: bool,
    /// Jump is being held.
    pub jump_held: bool,
    /// Attack went down this tick.
    pub attack_pressed: bool,
}

impl Intent {
    /// Horizontal axis clamped to `[-1, 1]`.
    pub fn horizontal_axis(&self) -> f32 {
        if self.horizontal.is_finite() {
            self.horizontal.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Mutable state handed to action hooks.
pub struct ActionContext<'a> {
    pub body: &'a mut PhysicsBody,
    pub intent: Intent,
    pub events: &'a mut EventBus,
    pub dt: f32,
    /// Vertical world gravity (negative pulls down).
    pub gravity: f32,
    pub epsilon: f32,
    pub frame: u64,
    /// Set by an action that wants its entity removed.
    pub despawn_requested: bool,
}

impl<'a> ActionContext<'a> {
    /// Context for one grid tick of `body`, with gravity and epsilon taken
    /// from the world the body lives in.
    pub fn new(
        body: &'a mut PhysicsBody,
        config: &WorldConfig,
        events: &'a mut EventBus,
        dt: f32,
    ) -> Self {
        Self {
            body,
            intent: Intent::default(),
            events,
            dt,
            gravity: config.gravity.y,
            epsilon: config.epsilon,
            frame: 0,
            despawn_requested: false,
        }
    }
}

/// Read-only view handed to action predicates.
pub struct ActionView<'a> {
    pub body: &'a PhysicsBody,
    pub intent: &'a Intent,
    /// Status of the action being asked.
    pub status: &'a ActionStatus,
    /// Cross-action queries over the same grid.
    pub grid: GridQuery<'a>,
    pub epsilon: f32,
}
