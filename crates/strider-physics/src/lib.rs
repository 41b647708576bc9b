//! Strider Physics -- sequential-axis kinematic movement for 2D platformers.
//!
//! Bodies in this crate are boxes that move by sweeping. Every tick the
//! [`PhysicsWorldHandler`](world::PhysicsWorldHandler) drives all registered
//! [`PhysicsBody`](body::PhysicsBody) instances through three phases
//! (prepare, simulate, submit). Each body splits its desired motion into
//! single-axis requests and resolves them one at a time against the level
//! geometry, recording blocked motions in a shared
//! [`CollisionCache`](collision::CollisionCache) and deriving its ground
//! contact from a short downward probe.
//!
//! rapier2d provides collider storage and shape casting only. Nothing is
//! integrated by rapier's solver.
//!
//! # Quick Start
//!
//! ```
//! use strider_physics::prelude::*;
//!
//! let mut world = PhysicsWorldHandler::new(WorldConfig::default()).unwrap();
//! world.geometry_mut().add_static_box(Vec2::new(0.0, -0.5), Vec2::new(20.0, 0.5));
//!
//! let player = world
//!     .create_body(BodyConfig::new(Profile::Player, Vec2::new(0.0, 0.5), Vec2::new(0.5, 0.5)))
//!     .unwrap();
//! world.body_mut(player).unwrap().set_speed_x(3.0);
//!
//! for _ in 0..60 {
//!     world.tick(1.0 / 60.0);
//! }
//! let body = world.body(player).unwrap();
//! assert!(body.is_grounded());
//! assert!((body.position().x - 3.0).abs() < 0.05);
//! ```

#![deny(unsafe_code)]

pub mod body;
pub mod collision;
pub mod config;
pub mod geometry;
pub mod layers;
pub mod motion;
pub mod parabola;
pub mod surface;
pub mod world;

pub use body::BodyHandle;

/// 2D vector type used throughout the crate.
pub type Vec2 = rapier2d::prelude::Vector<rapier2d::prelude::Real>;

/// World up direction.
pub fn up() -> Vec2 {
    Vec2::new(0.0, 1.0)
}

/// World down direction.
pub fn down() -> Vec2 {
    Vec2::new(0.0, -1.0)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by world and body operations.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// The handle does not refer to a body in this world.
    #[error("{0} does not exist")]
    UnknownBody(BodyHandle),

    /// A body's profile can only be re-assigned once.
    #[error("profile of {0} was already assigned")]
    ProfileAlreadyAssigned(BodyHandle),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::body::{transform_motion, BodyHandle, KinematicState, PhysicsBody};
    pub use crate::collision::{CollisionCache, CollisionData, CollisionFlags};
    pub use crate::config::{BodyConfig, WorldConfig};
    pub use crate::geometry::{CollisionGeometry, SweepHit, SweepQuery};
    pub use crate::layers::{CollisionLayers, Profile};
    pub use crate::motion::{angle_between, signed_angle, Axis, Bounds, MotionRequest, MotionResult};
    pub use crate::surface::{BodyState, SurfaceInfo, SurfaceState};
    pub use crate::world::PhysicsWorldHandler;
    pub use crate::{down, up, PhysicsError, Vec2};
}
