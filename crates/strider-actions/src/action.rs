//! The [`Action`] trait and the value types shared by every action.
//!
//! An action is one behavior capability of an entity: walking, jumping,
//! staying alive. Actions never start or stop themselves. The owning
//! [`ActionGrid`](crate::grid::ActionGrid) evaluates their predicates each
//! tick and drives the lifecycle hooks.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::context::{ActionContext, ActionView};

// ---------------------------------------------------------------------------
// Priority and state
// ---------------------------------------------------------------------------

/// Priority class of an action. Lower classes are evaluated first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ActionPriority {
    Status,
    Interaction,
    Ability,
    Movement,
}

impl fmt::Display for ActionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    Inactive,
    Executing,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Answer of an action to an [`IsQuery`] or [`CanQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResult {
    Yes,
    No,
    /// No opinion. The next executing action is asked instead.
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsQuery {
    Alive,
    Dead,
    UsingWeapon,
    UsingItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanQuery {
    Jump,
    Attack,
}

// ---------------------------------------------------------------------------
// ActionTags
// ---------------------------------------------------------------------------

/// Capabilities an action declares about itself. Other actions consult these
/// in [`Action::can_execute_simultaneously`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActionTags(pub u8);

impl ActionTags {
    pub const NONE: ActionTags = ActionTags(0);
    /// Standing still. Locomotion replaces it.
    pub const IDLE: ActionTags = ActionTags(1 << 0);
    /// Drives the body's horizontal speed.
    pub const LOCOMOTION: ActionTags = ActionTags(1 << 1);
    /// Produces attack areas.
    pub const COMBAT: ActionTags = ActionTags(1 << 2);

    pub fn contains(self, other: ActionTags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: ActionTags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ActionTags {
    type Output = ActionTags;

    fn bitor(self, rhs: ActionTags) -> ActionTags {
        ActionTags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ActionTags {
    fn bitor_assign(&mut self, rhs: ActionTags) {
        self.0 |= rhs.0;
    }
}

// ---------------------------------------------------------------------------
// ActionInfo / ActionStatus
// ---------------------------------------------------------------------------

/// Static description of an action. Read once when the action is added to
/// a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionInfo {
    pub name: &'static str,
    pub priority: ActionPriority,
    /// Secondary order inside the priority class.
    pub order: i32,
    pub tags: ActionTags,
}

impl ActionInfo {
    pub fn new(name: &'static str, priority: ActionPriority) -> Self {
        Self {
            name,
            priority,
            order: 0,
            tags: ActionTags::NONE,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_tags(mut self, tags: ActionTags) -> Self {
        self.tags = tags;
        self
    }
}

/// Lifecycle bookkeeping the grid keeps for each action.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionStatus {
    pub state: ActionState,
    /// Seconds spent executing, accrued after each `execute`.
    pub execution_time: f32,
    /// Frame on which the current execution started.
    pub execution_frame: u64,
    /// Set by an action that has finished its work.
    pub terminated: bool,
}

impl ActionStatus {
    pub fn is_executing(&self) -> bool {
        self.state == ActionState::Executing
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One behavior of an entity.
///
/// The predicates take `&self` and must not have side effects: the grid
/// re-evaluates them freely, and restarts its continuation scan whenever an
/// action stops.
///
/// The hooks run after the grid has updated the [`ActionStatus`]:
/// `start_execution` sees a reset execution time and a cleared terminated
/// flag, `stop_execution` sees the action already inactive.
pub trait Action {
    fn info(&self) -> ActionInfo;

    /// Whether the action may start this tick.
    fn can_execute(&self, view: &ActionView<'_>) -> bool;

    /// Evaluated every tick while executing. `false` stops the action.
    fn can_continue_to_execute(&self, view: &ActionView<'_>) -> bool;

    /// Whether this action tolerates `other` running at the same time.
    fn can_execute_simultaneously(&self, other: &ActionInfo) -> bool;

    fn start_execution(&mut self, _status: &mut ActionStatus, _ctx: &mut ActionContext<'_>) {}

    /// Called once per tick while executing.
    fn execute(&mut self, _status: &mut ActionStatus, _ctx: &mut ActionContext<'_>) {}

    fn stop_execution(&mut self, _status: &mut ActionStatus, _ctx: &mut ActionContext<'_>) {}

    fn is(&self, _query: IsQuery) -> QueryResult {
        QueryResult::Undefined
    }

    fn can(&self, _query: CanQuery) -> QueryResult {
        QueryResult::Undefined
    }
}
