//! Ballistic trajectory helpers.
//!
//! Used to launch a body so that, under constant gravity, it passes an apex
//! `apex_height` above the higher of its start and end points and lands on
//! the destination.
//!
//! # Example
//!
//! ```
//! use strider_physics::parabola;
//! use strider_physics::Vec2;
//!
//! let origin = Vec2::new(0.0, 0.0);
//! let destination = Vec2::new(4.0, 0.0);
//! let (velocity, arrival) = parabola::initial_velocity(origin, destination, 2.0, 9.81).unwrap();
//! let landing = parabola::position_at_time(origin, velocity, 9.81, arrival);
//! assert!((landing - destination).norm() < 1e-3);
//! ```

use crate::Vec2;

/// Launch velocity and time of arrival for a hop from `origin` to
/// `destination`. `gravity` is the magnitude of the downward acceleration.
///
/// Returns `None` when gravity is not positive or the hop takes no time.
pub fn initial_velocity(
    origin: Vec2,
    destination: Vec2,
    apex_height: f32,
    gravity: f32,
) -> Option<(Vec2, f32)> {
    if !(gravity > 0.0 && gravity.is_finite()) {
        return None;
    }

    let apex = origin.y.max(destination.y) + apex_height;
    let mut speed_y = 0.0;
    let mut time_to_apex = 0.0;
    if apex > origin.y {
        speed_y = (2.0 * gravity * (apex - origin.y)).sqrt();
        time_to_apex = speed_y / gravity;
    }
    let time_to_target = (2.0 * (apex - destination.y).max(0.0) / gravity).sqrt();

    let arrival = time_to_apex + time_to_target;
    if !(arrival > 0.0 && arrival.is_finite()) {
        return None;
    }

    let dx = destination.x - origin.x;
    let speed_x = dx.abs() / arrival * if dx >= 0.0 { 1.0 } else { -1.0 };
    Some((Vec2::new(speed_x, speed_y), arrival))
}

/// Position along the trajectory `time` seconds after launch.
pub fn position_at_time(origin: Vec2, velocity: Vec2, gravity: f32, time: f32) -> Vec2 {
    Vec2::new(
        origin.x + velocity.x * time,
        origin.y + velocity.y * time - 0.5 * gravity * time * time,
    )
}
