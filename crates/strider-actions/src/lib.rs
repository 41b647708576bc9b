//! Strider Actions -- priority arbitration of entity behaviors.
//!
//! Each entity owns an [`ActionGrid`](grid::ActionGrid) holding its
//! [`Action`](action::Action)s. Once per tick the grid decides which actions
//! stop, which start and which run, using each action's priority class and
//! its declared compatibility with the others. Actions read the entity's
//! [`PhysicsBody`](strider_physics::body::PhysicsBody) and write the velocity
//! it will use on the next physics tick.
//!
//! # Quick Start
//!
//! ```
//! use strider_actions::prelude::*;
//! use strider_physics::prelude::*;
//!
//! let mut world = PhysicsWorldHandler::new(WorldConfig::default()).unwrap();
//! let handle = world
//!     .create_body(BodyConfig::new(Profile::Player, Vec2::zeros(), Vec2::new(0.5, 0.5)))
//!     .unwrap();
//!
//! let mut grid = ActionGrid::new();
//! grid.add(AliveAction::new(3))
//!     .add(IdleAction::new())
//!     .add(MovementAction::new(4.0));
//!
//! let mut events = EventBus::new();
//! let (body, config) = world.body_and_config_mut(handle).unwrap();
//! let mut ctx = ActionContext::new(body, config, &mut events, 1.0 / 60.0);
//! ctx.intent.horizontal = 1.0;
//! grid.tick(&mut ctx);
//!
//! assert_eq!(grid.is(IsQuery::Alive), QueryResult::Yes);
//! assert!(grid.is_executing("movement"));
//! assert_eq!(world.body(handle).unwrap().speed_x(), 4.0);
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod actions;
pub mod context;
pub mod events;
pub mod grid;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::action::{
        Action, ActionInfo, ActionPriority, ActionState, ActionStatus, ActionTags, CanQuery,
        IsQuery, QueryResult,
    };
    pub use crate::actions::{
        AliveAction, AttackAction, IdleAction, JumpAction, JumpPhase, JumpSettings,
        MovementAction, PatrolAction, PatrolPhase,
    };
    pub use crate::context::{ActionContext, ActionView, Intent};
    pub use crate::events::{EventBus, GameEvent, SubscriberId, Subscription};
    pub use crate::grid::{ActionGrid, GridQuery};
}
