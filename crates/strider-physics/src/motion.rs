//! Sweep primitives: axes, per-axis motion requests and their results, and
//! the axis-aligned [`Bounds`] the sweeps are launched from.
//!
//! A [`MotionRequest`] is an intent to move along exactly one axis. The body
//! resolves requests one at a time and records the outcome of each sweep in a
//! [`MotionResult`]. Neither outlives a single `simulate` call.

use serde::{Deserialize, Serialize};

use crate::{up, BodyHandle, Vec2};
use rapier2d::prelude::ColliderHandle;

// ---------------------------------------------------------------------------
// Axis
// ---------------------------------------------------------------------------

/// Simulation axis. The discriminant doubles as the vector component index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// The x axis.
    Horizontal = 0,
    /// The y axis.
    Vertical = 1,
}

impl Axis {
    /// Unit vector pointing along the positive direction of this axis.
    pub fn unit(self) -> Vec2 {
        match self {
            Axis::Horizontal => Vec2::new(1.0, 0.0),
            Axis::Vertical => Vec2::new(0.0, 1.0),
        }
    }

    /// The other axis.
    pub fn perpendicular(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    /// The component of `v` along this axis.
    pub fn component(self, v: &Vec2) -> f32 {
        v[self as usize]
    }
}

// ---------------------------------------------------------------------------
// MotionRequest
// ---------------------------------------------------------------------------

/// A signed motion along a single axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRequest {
    /// The axis the motion applies to.
    pub axis: Axis,
    /// Signed distance along `axis`.
    pub motion: f32,
    /// Set on requests produced by re-projecting a remainder along a slope.
    /// Such requests are never re-projected a second time.
    pub slope_projected: bool,
}

impl MotionRequest {
    pub fn new(axis: Axis, motion: f32) -> Self {
        Self {
            axis,
            motion,
            slope_projected: false,
        }
    }

    pub(crate) fn projected(axis: Axis, motion: f32) -> Self {
        Self {
            axis,
            motion,
            slope_projected: true,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.axis == Axis::Horizontal
    }

    pub fn is_vertical(&self) -> bool {
        self.axis == Axis::Vertical
    }

    /// Unit vector in the direction of travel.
    pub fn direction(&self) -> Vec2 {
        self.axis.unit() * self.direction_sign()
    }

    /// `1.0` for positive (and zero) motion, `-1.0` otherwise.
    pub fn direction_sign(&self) -> f32 {
        if self.motion >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }
}

// ---------------------------------------------------------------------------
// MotionResult
// ---------------------------------------------------------------------------

/// The resolved outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionResult {
    /// Distance of the blocking hit, or the full sweep length when nothing
    /// blocked. Includes the skin width.
    pub distance: f32,
    /// The body that was hit, `None` for static geometry or no hit.
    pub body: Option<BodyHandle>,
    /// The collider that was hit.
    pub collider: Option<ColliderHandle>,
    /// Surface normal at the hit.
    pub normal: Vec2,
    /// World-space contact point.
    pub point: Vec2,
}

impl Default for MotionResult {
    fn default() -> Self {
        Self {
            distance: 0.0,
            body: None,
            collider: None,
            normal: up(),
            point: Vec2::zeros(),
        }
    }
}

impl MotionResult {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// An axis-aligned box described by its center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Bounds {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Full width and height.
    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    /// Grow the total size by `amount` (negative values shrink). Each side
    /// moves by half of `amount`. Extents never go below zero.
    pub fn expand(&mut self, amount: Vec2) {
        self.half_extents += amount * 0.5;
        self.half_extents.x = self.half_extents.x.max(0.0);
        self.half_extents.y = self.half_extents.y.max(0.0);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    /// Overlap test. Touching edges do not count.
    pub fn intersects(&self, other: &Bounds) -> bool {
        let d = other.center - self.center;
        let reach = self.half_extents + other.half_extents;
        d.x.abs() < reach.x && d.y.abs() < reach.y
    }
}

// ---------------------------------------------------------------------------
// Angles
// ---------------------------------------------------------------------------

/// Unsigned angle in degrees between two vectors. Zero when either is
/// degenerate.
pub fn angle_between(from: &Vec2, to: &Vec2) -> f32 {
    let denominator = (from.norm_squared() * to.norm_squared()).sqrt();
    if denominator < 1e-15 {
        return 0.0;
    }
    (from.dot(to) / denominator).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Signed angle in degrees from `from` to `to`, counter-clockwise positive.
pub fn signed_angle(from: &Vec2, to: &Vec2) -> f32 {
    let cross = from.x * to.y - from.y * to.x;
    let sign = if cross >= 0.0 { 1.0 } else { -1.0 };
    angle_between(from, to) * sign
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
