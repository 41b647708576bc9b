//! Standing still.

use crate::action::{Action, ActionInfo, ActionPriority, ActionTags, CanQuery, QueryResult};
use crate::context::ActionView;

/// Executes while the body has no horizontal speed. Allows jumping and
/// attacking.
#[derive(Debug, Clone, Default)]
pub struct IdleAction;

impl IdleAction {
    pub const NAME: &'static str = "idle";

    pub fn new() -> Self {
        Self
    }
}

impl Action for IdleAction {
    fn info(&self) -> ActionInfo {
        ActionInfo::new(Self::NAME, ActionPriority::Movement)
            .with_order(1)
            .with_tags(ActionTags::IDLE)
    }

    fn can_execute(&self, view: &ActionView<'_>) -> bool {
        view.body.speed_x().abs() <= view.epsilon
    }

    fn can_continue_to_execute(&self, view: &ActionView<'_>) -> bool {
        self.can_execute(view)
    }

    fn can_execute_simultaneously(&self, _other: &ActionInfo) -> bool {
        true
    }

    fn can(&self, query: CanQuery) -> QueryResult {
        match query {
            CanQuery::Jump | CanQuery::Attack => QueryResult::Yes,
        }
    }
}
