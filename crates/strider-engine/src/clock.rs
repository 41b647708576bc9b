//! Pausable fixed-timestep clock.
//!
//! [`TickClock`] is the only source of tick deltas in the simulation. While
//! paused it still counts frames but reports a delta of zero, so anything
//! that waits on elapsed time simply stops advancing.
//!
//! # Example
//!
//! ```
//! use strider_engine::clock::{ClockConfig, TickClock};
//!
//! let mut clock = TickClock::new(ClockConfig::default());
//! assert!((clock.advance() - 1.0 / 60.0).abs() < 1e-6);
//!
//! clock.pause();
//! assert_eq!(clock.advance(), 0.0);
//! assert_eq!(clock.frame(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Time scale used while a hit-frame pause is active.
pub const HIT_FRAME_TIME_SCALE: f32 = 0.001;

// ---------------------------------------------------------------------------
// ClockConfig
// ---------------------------------------------------------------------------

/// Configuration for the tick clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Multiplier applied to `fixed_dt`. Zero freezes time.
    pub time_scale: f32,
}

impl Default for ClockConfig {
    /// Defaults to 60 Hz at normal speed.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            time_scale: 1.0,
        }
    }
}

/// Everything a clock needs to resume where it stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    pub fixed_dt: f64,
    pub time_scale: f32,
    pub paused: bool,
    pub frame: u64,
    pub elapsed: f64,
}

// ---------------------------------------------------------------------------
// TickClock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TickClock {
    fixed_dt: f64,
    time_scale: f32,
    paused: bool,
    frame: u64,
    elapsed: f64,
}

impl TickClock {
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(config: ClockConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        let mut clock = Self {
            fixed_dt: config.fixed_dt,
            time_scale: 1.0,
            paused: false,
            frame: 0,
            elapsed: 0.0,
        };
        clock.set_time_scale(config.time_scale);
        clock
    }

    /// Delta the next tick will use. Zero while paused or frozen.
    pub fn delta(&self) -> f32 {
        if self.paused || self.time_scale.abs() < f32::EPSILON {
            return 0.0;
        }
        (self.fixed_dt * self.time_scale as f64) as f32
    }

    /// Count one frame and return its delta.
    pub fn advance(&mut self) -> f32 {
        let dt = self.delta();
        self.frame += 1;
        self.elapsed += dt as f64;
        dt
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Negative or non-finite scales are treated as zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    /// Nearly freeze time for a few frames of impact, or resume normal speed.
    pub fn hit_frame_pause(&mut self, pause: bool) {
        self.time_scale = if pause { HIT_FRAME_TIME_SCALE } else { 1.0 };
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Frames counted so far, paused ones included.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Scaled simulation time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn state(&self) -> ClockState {
        ClockState {
            fixed_dt: self.fixed_dt,
            time_scale: self.time_scale,
            paused: self.paused,
            frame: self.frame,
            elapsed: self.elapsed,
        }
    }

    /// Callers validate `state.fixed_dt` first.
    pub(crate) fn restore(&mut self, state: &ClockState) {
        self.fixed_dt = state.fixed_dt;
        self.set_time_scale(state.time_scale);
        self.paused = state.paused;
        self.frame = state.frame;
        self.elapsed = state.elapsed;
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_clock_counts_frames_without_time() {
        let mut clock = TickClock::default();
        clock.advance();
        clock.pause();
        for _ in 0..5 {
            assert_eq!(clock.advance(), 0.0);
        }
        assert_eq!(clock.frame(), 6);
        assert!((clock.elapsed() - 1.0 / 60.0).abs() < 1e-9);

        clock.resume();
        assert!(clock.advance() > 0.0);
    }

    #[test]
    fn hit_frame_pause_slows_time() {
        let mut clock = TickClock::default();
        clock.hit_frame_pause(true);
        assert!((clock.delta() - (1.0 / 60.0) * 0.001).abs() < 1e-9);
        clock.hit_frame_pause(false);
        assert!((clock.delta() - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn zero_and_invalid_scales_freeze() {
        let mut clock = TickClock::default();
        clock.set_time_scale(0.0);
        assert_eq!(clock.delta(), 0.0);
        clock.set_time_scale(-2.0);
        assert_eq!(clock.delta(), 0.0);
        clock.set_time_scale(f32::NAN);
        assert_eq!(clock.delta(), 0.0);
    }

    #[test]
    #[should_panic(expected = "fixed_dt must be positive")]
    fn rejects_non_positive_dt() {
        TickClock::new(ClockConfig {
            fixed_dt: 0.0,
            ..ClockConfig::default()
        });
    }

    #[test]
    fn config_from_json() {
        let config: ClockConfig = serde_json::from_str(r#"{ "time_scale": 0.5 }"#).unwrap();
        assert_eq!(config.fixed_dt, 1.0 / 60.0);
        assert_eq!(config.time_scale, 0.5);
    }
}
