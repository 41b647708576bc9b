//! Concrete actions for platformer entities.

pub mod alive;
pub mod attack;
pub mod idle;
pub mod jump;
pub mod movement;
pub mod patrol;

pub use alive::AliveAction;
pub use attack::AttackAction;
pub use idle::IdleAction;
pub use jump::{JumpAction, JumpPhase, JumpSettings};
pub use movement::MovementAction;
pub use patrol::{PatrolAction, PatrolPhase};
