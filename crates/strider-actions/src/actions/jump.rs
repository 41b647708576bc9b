//! Variable-height jump.
//!
//! The jump is a small state machine advanced once per `execute`:
//!
//! - **Rising**: launched with `height / (0.5 * rise_time)` and a gravity
//!   scale that stops the body after `rise_time`. Releasing jump cancels the
//!   remaining rise.
//! - **Falling**: gravity is rescaled so a fall from `height` takes
//!   `fall_time`. Ends when the body is supported again.
//! - **Done**: the action reports it cannot continue.

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionInfo, ActionPriority, ActionStatus, CanQuery, QueryResult};
use crate::context::{ActionContext, ActionView};

/// Shape of the jump arc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpSettings {
    pub height: f32,
    pub rise_time: f32,
    pub fall_time: f32,
}

impl Default for JumpSettings {
    fn default() -> Self {
        Self {
            height: 2.5,
            rise_time: 0.4,
            fall_time: 0.45,
        }
    }
}

impl JumpSettings {
    pub fn launch_speed(&self) -> f32 {
        self.height / (0.5 * self.rise_time)
    }

    /// Downward acceleration while rising.
    pub fn rise_gravity(&self) -> f32 {
        self.launch_speed() / self.rise_time
    }

    /// Downward acceleration while falling.
    pub fn fall_gravity(&self) -> f32 {
        self.height * 2.0 / (self.fall_time * self.fall_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JumpPhase {
    Rising,
    Falling,
    #[default]
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct JumpAction {
    settings: JumpSettings,
    phase: JumpPhase,
}

impl JumpAction {
    pub const NAME: &'static str = "jump";

    pub fn new(settings: JumpSettings) -> Self {
        Self {
            settings,
            phase: JumpPhase::Done,
        }
    }

    pub fn settings(&self) -> &JumpSettings {
        &self.settings
    }

    pub fn phase(&self) -> JumpPhase {
        self.phase
    }

    fn gravity_scale_for(acceleration: f32, world_gravity: f32) -> f32 {
        if world_gravity == 0.0 {
            return 0.0;
        }
        (acceleration / world_gravity).abs()
    }

    fn begin_fall(&mut self, ctx: &mut ActionContext<'_>) {
        let scale = Self::gravity_scale_for(self.settings.fall_gravity(), ctx.gravity);
        ctx.body.set_gravity_scale(scale);
        self.phase = JumpPhase::Falling;
    }
}

impl Action for JumpAction {
    fn info(&self) -> ActionInfo {
        ActionInfo::new(Self::NAME, ActionPriority::Ability)
    }

    fn can_execute(&self, view: &ActionView<'_>) -> bool {
        view.grid.can(CanQuery::Jump) == QueryResult::Yes
            && view.body.is_grounded()
            && view.intent.jump_pressed
    }

    fn can_continue_to_execute(&self, _view: &ActionView<'_>) -> bool {
        self.phase != JumpPhase::Done
    }

    fn can_execute_simultaneously(&self, _other: &ActionInfo) -> bool {
        true
    }

    fn start_execution(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        let scale = Self::gravity_scale_for(self.settings.rise_gravity(), ctx.gravity);
        ctx.body.set_gravity_scale(scale);
        ctx.body.set_speed_y(self.settings.launch_speed());
        self.phase = JumpPhase::Rising;
    }

    fn execute(&mut self, status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        match self.phase {
            JumpPhase::Rising => {
                let held = ctx.intent.jump_held || ctx.intent.jump_pressed;
                if !held {
                    ctx.body.set_speed_y(0.0);
                    self.begin_fall(ctx);
                } else if ctx.body.speed_y() <= 0.0 {
                    self.begin_fall(ctx);
                }
            }
            JumpPhase::Falling => {
                if ctx.body.is_grounded() && ctx.body.speed_y() <= 0.0 {
                    self.phase = JumpPhase::Done;
                    status.terminated = true;
                }
            }
            JumpPhase::Done => {}
        }
    }

    fn stop_execution(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        self.phase = JumpPhase::Done;
        ctx.body.set_speed_x(0.0);
    }
}
