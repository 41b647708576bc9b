//! A timed melee swing.

use strider_physics::layers::CollisionLayers;
use strider_physics::motion::Bounds;
use strider_physics::Vec2;

use crate::action::{
    Action, ActionInfo, ActionPriority, ActionStatus, ActionTags, CanQuery, IsQuery, QueryResult,
};
use crate::context::{ActionContext, ActionView};
use crate::events::GameEvent;

/// Publishes one attack area in front of the body when it starts and
/// terminates after `attack_time` seconds.
#[derive(Debug, Clone)]
pub struct AttackAction {
    attack_time: f32,
    damage: i32,
    reach: Vec2,
    half_extents: Vec2,
    mask: CollisionLayers,
    facing: f32,
}

impl AttackAction {
    pub const NAME: &'static str = "attack";

    /// `attack_time` is clamped to `0..=1` seconds and `damage` to `1..=10`.
    pub fn new(attack_time: f32, damage: i32, mask: CollisionLayers) -> Self {
        Self {
            attack_time: attack_time.clamp(0.0, 1.0),
            damage: damage.clamp(1, 10),
            reach: Vec2::new(1.0, 0.0),
            half_extents: Vec2::new(0.5, 0.5),
            mask,
            facing: 1.0,
        }
    }

    /// Offset of the area center from the body, mirrored by facing.
    pub fn with_area(mut self, reach: Vec2, half_extents: Vec2) -> Self {
        self.reach = reach;
        self.half_extents = half_extents;
        self
    }

    pub fn attack_time(&self) -> f32 {
        self.attack_time
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    /// Area the next swing covers for a body at `position`.
    pub fn area(&self, position: Vec2) -> Bounds {
        let offset = Vec2::new(self.reach.x * self.facing, self.reach.y);
        Bounds::new(position + offset, self.half_extents)
    }
}

impl Default for AttackAction {
    fn default() -> Self {
        Self::new(0.25, 1, CollisionLayers::AI)
    }
}

impl Action for AttackAction {
    fn info(&self) -> ActionInfo {
        ActionInfo::new(Self::NAME, ActionPriority::Ability).with_tags(ActionTags::COMBAT)
    }

    fn can_execute(&self, view: &ActionView<'_>) -> bool {
        view.grid.can(CanQuery::Attack) == QueryResult::Yes && view.intent.attack_pressed
    }

    fn can_continue_to_execute(&self, view: &ActionView<'_>) -> bool {
        !view.status.terminated
    }

    fn can_execute_simultaneously(&self, _other: &ActionInfo) -> bool {
        true
    }

    fn start_execution(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        let horizontal = ctx.intent.horizontal_axis();
        if horizontal.abs() > ctx.epsilon {
            self.facing = horizontal.signum();
        }
        let source = ctx.body.handle();
        let area = self.area(ctx.body.position());
        ctx.events.publish(GameEvent::AttackArea {
            source,
            area,
            mask: self.mask,
            damage: self.damage,
        });
    }

    fn execute(&mut self, status: &mut ActionStatus, _ctx: &mut ActionContext<'_>) {
        status.terminated = status.execution_time >= self.attack_time;
    }

    fn is(&self, query: IsQuery) -> QueryResult {
        match query {
            IsQuery::UsingWeapon => QueryResult::Yes,
            _ => QueryResult::Undefined,
        }
    }
}
