//! Ground and ceiling contact state derived once per tick.

use serde::{Deserialize, Serialize};

use crate::{down, up, BodyHandle, Vec2};
use rapier2d::prelude::ColliderHandle;

/// Whether the body stands on something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurfaceState {
    Supported,
    #[default]
    Unsupported,
}

/// Discrete movement state of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyState {
    Grounded,
    #[default]
    InAir,
}

/// Contact information for the surface below (and above) a body.
///
/// The default value is the "falling, no surface" state: unsupported, normal
/// pointing up, top normal pointing down and an unbounded excess distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceInfo {
    pub state: SurfaceState,
    /// Normal of the supporting surface. Always up unless a probe hit a slope.
    pub normal: Vec2,
    /// Average normal of this tick's upward contacts, zero when none.
    pub top_normal: Vec2,
    /// Gap between the skin and the surface below. Negative values mean the
    /// skin penetrates the surface.
    pub excess_distance: f32,
    /// Contact point of the probe.
    pub point: Vec2,
    pub collider: Option<ColliderHandle>,
    /// Supporting body, `None` for static geometry.
    pub body: Option<BodyHandle>,
    pub sort_order: i32,
}

impl Default for SurfaceInfo {
    fn default() -> Self {
        Self {
            state: SurfaceState::Unsupported,
            normal: up(),
            top_normal: down(),
            excess_distance: f32::MAX,
            point: Vec2::zeros(),
            collider: None,
            body: None,
            sort_order: 0,
        }
    }
}

impl SurfaceInfo {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_supported(&self) -> bool {
        self.state == SurfaceState::Supported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_falling_without_surface() {
        let info = SurfaceInfo::default();
        assert!(!info.is_supported());
        assert_eq!(info.normal, up());
        assert_eq!(info.top_normal, down());
        assert_eq!(info.excess_distance, f32::MAX);
        assert!(info.body.is_none());
    }

    #[test]
    fn reset_discards_contact() {
        let mut info = SurfaceInfo {
            state: SurfaceState::Supported,
            excess_distance: 0.01,
            body: Some(BodyHandle(2)),
            ..SurfaceInfo::default()
        };
        info.reset();
        assert_eq!(info, SurfaceInfo::default());
    }
}
