//! Horizontal locomotion driven by the directional intent.

use crate::action::{
    Action, ActionInfo, ActionPriority, ActionStatus, ActionTags, CanQuery, QueryResult,
};
use crate::context::{ActionContext, ActionView};

/// Sets the body's horizontal speed from the intent while a direction is
/// held. Replaces idle.
#[derive(Debug, Clone)]
pub struct MovementAction {
    speed: f32,
}

impl MovementAction {
    pub const NAME: &'static str = "movement";

    /// `speed` is clamped to `1..=10` units per second.
    pub fn new(speed: f32) -> Self {
        Self {
            speed: speed.clamp(1.0, 10.0),
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl Default for MovementAction {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl Action for MovementAction {
    fn info(&self) -> ActionInfo {
        ActionInfo::new(Self::NAME, ActionPriority::Movement).with_tags(ActionTags::LOCOMOTION)
    }

    fn can_execute(&self, view: &ActionView<'_>) -> bool {
        view.intent.horizontal_axis().abs() > view.epsilon
    }

    fn can_continue_to_execute(&self, view: &ActionView<'_>) -> bool {
        self.can_execute(view)
    }

    fn can_execute_simultaneously(&self, other: &ActionInfo) -> bool {
        !other.tags.contains(ActionTags::IDLE)
    }

    fn execute(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        let speed = ctx.intent.horizontal_axis() * self.speed;
        ctx.body.set_speed_x(speed);
    }

    fn stop_execution(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        ctx.body.set_speed_x(0.0);
    }

    fn can(&self, query: CanQuery) -> QueryResult {
        match query {
            CanQuery::Jump | CanQuery::Attack => QueryResult::Yes,
        }
    }
}
