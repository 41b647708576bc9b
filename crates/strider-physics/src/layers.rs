//! Collision layers and body profiles.
//!
//! A [`Profile`] decides which layer a body lives on, which layers its sweeps
//! collide with, its default gravity scale and whether it tracks the surface
//! below it.

use std::ops::BitOr;

use rapier2d::prelude::{Group, InteractionGroups};
use serde::{Deserialize, Serialize};

/// Bitmask of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CollisionLayers(pub u32);

impl CollisionLayers {
    pub const NONE: CollisionLayers = CollisionLayers(0);
    /// Level geometry and solid movers.
    pub const SOLID: CollisionLayers = CollisionLayers(1 << 0);
    pub const PLAYER: CollisionLayers = CollisionLayers(1 << 1);
    pub const AI: CollisionLayers = CollisionLayers(1 << 2);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, other: CollisionLayers) -> bool {
        self.0 & other.0 != 0
    }

    pub(crate) fn group(self) -> Group {
        Group::from_bits_truncate(self.0)
    }

    /// Groups for a collider that lives on these layers. Colliders accept
    /// queries from every layer; the query side does the filtering.
    pub(crate) fn membership_groups(self) -> InteractionGroups {
        InteractionGroups::new(self.group(), Group::ALL)
    }

    /// Groups for a query that only reports colliders on these layers.
    pub(crate) fn query_groups(self) -> InteractionGroups {
        InteractionGroups::new(Group::ALL, self.group())
    }
}

impl BitOr for CollisionLayers {
    type Output = CollisionLayers;

    fn bitor(self, rhs: Self) -> Self::Output {
        CollisionLayers(self.0 | rhs.0)
    }
}

/// Collision profile of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Profile {
    /// Moving platforms and other solid movers.
    Solid,
    #[default]
    Player,
    AI,
}

impl Profile {
    /// The layer the body is a member of.
    pub fn layer(self) -> CollisionLayers {
        match self {
            Profile::Solid => CollisionLayers::SOLID,
            Profile::Player => CollisionLayers::PLAYER,
            Profile::AI => CollisionLayers::AI,
        }
    }

    /// The layers the body's sweeps collide with.
    pub fn collision_mask(self) -> CollisionLayers {
        match self {
            Profile::Solid => CollisionLayers::SOLID | CollisionLayers::PLAYER,
            Profile::Player | Profile::AI => CollisionLayers::SOLID,
        }
    }

    pub fn default_gravity_scale(self) -> f32 {
        1.0
    }

    /// Whether `submit` runs the downward surface probe.
    pub fn resolves_surface_info(self) -> bool {
        !matches!(self, Profile::Solid)
    }
}
