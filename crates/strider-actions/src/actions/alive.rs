//! Hit points and death.

use crate::action::{Action, ActionInfo, ActionPriority, ActionStatus, IsQuery, QueryResult};
use crate::context::{ActionContext, ActionView};
use crate::events::{GameEvent, Subscription};

/// Executes while hit points remain. Listens for damage aimed at its body
/// only while executing and asks for the entity to be despawned when it
/// stops.
#[derive(Debug)]
pub struct AliveAction {
    hp: i32,
    subscription: Option<Subscription>,
}

impl AliveAction {
    pub const NAME: &'static str = "alive";

    pub fn new(hp: i32) -> Self {
        Self {
            hp: hp.clamp(0, 100),
            subscription: None,
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp;
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Action for AliveAction {
    fn info(&self) -> ActionInfo {
        ActionInfo::new(Self::NAME, ActionPriority::Status)
    }

    fn can_execute(&self, _view: &ActionView<'_>) -> bool {
        self.hp > 0
    }

    fn can_continue_to_execute(&self, view: &ActionView<'_>) -> bool {
        self.can_execute(view)
    }

    fn can_execute_simultaneously(&self, _other: &ActionInfo) -> bool {
        true
    }

    fn start_execution(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        self.subscription = Some(ctx.events.subscribe());
    }

    fn execute(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        let Some(subscription) = &self.subscription else {
            return;
        };
        let me = ctx.body.handle();
        for event in subscription.drain() {
            if let GameEvent::DamageReceived { target, damage, source } = event {
                if target == me {
                    self.hp -= damage;
                    tracing::debug!(body = %me, %source, damage, hp = self.hp, "damage received");
                }
            }
        }
    }

    fn stop_execution(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        if let Some(subscription) = self.subscription.take() {
            ctx.events.unsubscribe(subscription.id());
        }
        ctx.despawn_requested = true;
    }

    fn is(&self, query: IsQuery) -> QueryResult {
        match query {
            IsQuery::Alive => QueryResult::Yes,
            IsQuery::Dead => QueryResult::No,
            _ => QueryResult::Undefined,
        }
    }
}
