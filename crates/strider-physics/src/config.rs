//! World and body configuration.
//!
//! Both structs are plain serde data with defaults matching the tuning the
//! movement code was designed around. Use [`WorldConfig::from_json_str`] to
//! load a world configuration from disk content; it validates after parsing.
//!
//! # Example
//!
//! ```
//! use strider_physics::config::WorldConfig;
//!
//! let config = WorldConfig::from_json_str(r#"{ "gravity": [0.0, -20.0] }"#).unwrap();
//! assert_eq!(config.gravity.y, -20.0);
//! assert_eq!(config.collision_cache_capacity, 128);
//! ```

use serde::{Deserialize, Serialize};

use crate::{layers::Profile, PhysicsError, Vec2};

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Tuning shared by every body in a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity acceleration in world units per second squared.
    pub gravity: Vec2,
    /// Motions and speeds below this magnitude are treated as zero.
    pub epsilon: f32,
    /// Lower clamp for vertical speed.
    pub min_terminal_velocity: f32,
    /// Upper clamp for vertical speed.
    pub max_terminal_velocity: f32,
    /// Maximum number of contacts recorded per tick.
    pub collision_cache_capacity: usize,
    /// A probe gap at or below this distance counts as standing on ground.
    pub supported_distance_threshold: f32,
    /// Contacts this close to the bottom of a body count as a slope entrance.
    pub slope_distance_threshold: f32,
    /// Length of the downward ground probe beyond the skin.
    pub surface_probe_distance: f32,
    /// Thickness of the box swept from the leading edge.
    pub sweep_thickness: f32,
    /// Maximum number of hits one sweep reports.
    pub max_sweep_hits: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            epsilon: 1e-5,
            min_terminal_velocity: -20.0,
            max_terminal_velocity: 100.0,
            collision_cache_capacity: 128,
            supported_distance_threshold: 0.1,
            slope_distance_threshold: 0.1,
            surface_probe_distance: 0.1,
            sweep_thickness: 0.005,
            max_sweep_hits: 4,
        }
    }
}

impl WorldConfig {
    /// Parse a JSON document and validate it. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PhysicsError> {
        let config: WorldConfig =
            serde_json::from_str(json).map_err(|e| PhysicsError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn epsilon_sqr(&self) -> f32 {
        self.epsilon * self.epsilon
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.gravity.x.is_finite() && self.gravity.y.is_finite()) {
            return Err(PhysicsError::InvalidConfig("gravity must be finite".into()));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(PhysicsError::InvalidConfig(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.min_terminal_velocity > self.max_terminal_velocity {
            return Err(PhysicsError::InvalidConfig(format!(
                "min terminal velocity {} exceeds max terminal velocity {}",
                self.min_terminal_velocity, self.max_terminal_velocity
            )));
        }
        if self.collision_cache_capacity == 0 {
            return Err(PhysicsError::InvalidConfig(
                "collision cache capacity must be non-zero".into(),
            ));
        }
        if self.max_sweep_hits == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max sweep hits must be non-zero".into(),
            ));
        }
        for (name, value) in [
            ("supported distance threshold", self.supported_distance_threshold),
            ("slope distance threshold", self.slope_distance_threshold),
            ("surface probe distance", self.surface_probe_distance),
            ("sweep thickness", self.sweep_thickness),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(PhysicsError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BodyConfig
// ---------------------------------------------------------------------------

/// Construction parameters for a [`PhysicsBody`](crate::body::PhysicsBody).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub profile: Profile,
    /// Initial world position of the body origin.
    pub position: Vec2,
    /// Half extents of the box collider.
    pub half_extents: Vec2,
    /// Collider center relative to the body origin.
    pub offset: Vec2,
    /// Skin width as a fraction of the collider half width.
    pub skin_width_ratio: f32,
    /// Multiplier applied to the skin width on the vertical axis.
    pub skin_width_ratio_y_factor: f32,
    /// Steepest walkable slope in degrees.
    pub max_slope_angle: f32,
    /// Per-body lower clamp for vertical speed. Zero uses the world value.
    pub min_terminal_velocity: f32,
    pub keep_speed_on_collision: bool,
    pub ignore_collisions: bool,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Player,
            position: Vec2::zeros(),
            half_extents: Vec2::new(0.5, 0.5),
            offset: Vec2::zeros(),
            skin_width_ratio: 0.1,
            skin_width_ratio_y_factor: 1.0,
            max_slope_angle: 45.0,
            min_terminal_velocity: 0.0,
            keep_speed_on_collision: false,
            ignore_collisions: false,
        }
    }
}

impl BodyConfig {
    pub fn new(profile: Profile, position: Vec2, half_extents: Vec2) -> Self {
        Self {
            profile,
            position,
            half_extents,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.half_extents.x > 0.0 && self.half_extents.y > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "collider half extents must be positive, got ({}, {})",
                self.half_extents.x, self.half_extents.y
            )));
        }
        if !(0.1..=0.95).contains(&self.skin_width_ratio) {
            return Err(PhysicsError::InvalidConfig(format!(
                "skin width ratio {} outside 0.1..=0.95",
                self.skin_width_ratio
            )));
        }
        if !(1.0..=2.0).contains(&self.skin_width_ratio_y_factor) {
            return Err(PhysicsError::InvalidConfig(format!(
                "skin width y factor {} outside 1..=2",
                self.skin_width_ratio_y_factor
            )));
        }
        if !(0.0..90.0).contains(&self.max_slope_angle) {
            return Err(PhysicsError::InvalidConfig(format!(
                "max slope angle {} outside 0..90",
                self.max_slope_angle
            )));
        }
        if self.min_terminal_velocity > 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "min terminal velocity override must not be positive".into(),
            ));
        }
        Ok(())
    }

    /// Horizontal skin width.
    pub fn skin_width(&self) -> f32 {
        self.half_extents.x * self.skin_width_ratio
    }

    /// Vertical skin width.
    pub fn skin_width_y(&self) -> f32 {
        self.skin_width() * self.skin_width_ratio_y_factor
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
