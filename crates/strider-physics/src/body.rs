//! The per-entity kinematic mover.
//!
//! A [`PhysicsBody`] never integrates forces or resolves contacts
//! simultaneously. Each tick the world drives it through three phases:
//!
//! 1. **prepare** resets per-tick state, shrinks the collider bounds by the
//!    skin width, turns velocity into a desired motion and integrates gravity.
//! 2. **simulate** splits the motion into single-axis [`MotionRequest`]s on a
//!    LIFO stack and resolves them one by one with box sweeps launched from
//!    the leading edge of the simulation bounds. The accumulated translation
//!    is applied to the body position once at the end.
//! 3. **submit** probes the ground, folds this tick's collision flags into the
//!    body and cancels speed on blocked axes.
//!
//! Resolving one axis at a time keeps the result predictable at the cost of
//! some multi-contact corner cases.

use std::fmt;

use rapier2d::prelude::ColliderHandle;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionCache, CollisionFlags};
use crate::config::{BodyConfig, WorldConfig};
use crate::geometry::{CollisionGeometry, SweepHit, SweepQuery};
use crate::layers::{CollisionLayers, Profile};
use crate::motion::{angle_between, Axis, Bounds, MotionRequest, MotionResult};
use crate::surface::{BodyState, SurfaceInfo, SurfaceState};
use crate::{down, up, Vec2};

// ---------------------------------------------------------------------------
// BodyHandle
// ---------------------------------------------------------------------------

/// Stable identifier of a body inside one [`PhysicsWorldHandler`].
///
/// [`PhysicsWorldHandler`]: crate::world::PhysicsWorldHandler
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BodyHandle(pub u32);

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SweepContext
// ---------------------------------------------------------------------------

/// Read-only world state a body needs while sweeping.
pub struct SweepContext<'a> {
    pub config: &'a WorldConfig,
    pub geometry: &'a CollisionGeometry,
    /// Bodies whose colliders every sweep skips.
    pub ignored: &'a [BodyHandle],
}

/// A prepared sweep and its raw hits.
#[derive(Debug, Clone)]
pub(crate) struct Sweep {
    pub direction: Vec2,
    pub sign: f32,
    pub distance: f32,
    pub hits: Vec<SweepHit>,
}

// ---------------------------------------------------------------------------
// KinematicState
// ---------------------------------------------------------------------------

/// The persistent part of a body's state, enough to resume a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub external_velocity: Vec2,
    pub gravity_scale: f32,
    pub state: BodyState,
    pub surface_state: SurfaceState,
    pub surface_normal: Vec2,
    pub excess_distance: f32,
}

// ---------------------------------------------------------------------------
// PhysicsBody
// ---------------------------------------------------------------------------

/// A kinematic box that moves by sweeping.
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    handle: BodyHandle,
    collider: ColliderHandle,
    profile: Profile,
    profile_assigned: bool,

    position: Vec2,
    offset: Vec2,
    half_extents: Vec2,
    skin_width_ratio: f32,
    skin_width_ratio_y_factor: f32,
    max_slope_angle: f32,
    min_terminal_override: f32,
    world_min_terminal: f32,

    velocity: Vec2,
    external_velocity: Vec2,
    debug_velocity: Vec2,
    gravity_scale: f32,
    default_gravity_scale: f32,

    state: BodyState,
    surface: SurfaceInfo,
    time_grounded: f64,
    time_in_air: f64,

    ignore_collisions: bool,
    resolve_surface_info: bool,
    keep_surface_info: bool,
    keep_speed_on_collision: bool,

    teleport_request: Option<Vec2>,
    simulated_teleport_request: Option<Vec2>,
    /// Position changed outside a tick; the world still has to move the
    /// collider.
    collider_moved: bool,

    // Per-tick working state, reset in `prepare`.
    simulation_bounds: Bounds,
    motion: Vec2,
    simulated_motion: Vec2,
    realized_motion: Vec2,
    total_simulated_velocity: Vec2,
    simulated_velocity: Vec2,
    simulated_teleport_motion: Vec2,
    requests: Vec<MotionRequest>,
    collision_indices: Vec<usize>,
    collision_flags: CollisionFlags,
    sweep_count: u32,
}

impl PhysicsBody {
    pub(crate) fn new(
        handle: BodyHandle,
        collider: ColliderHandle,
        config: &BodyConfig,
        world: &WorldConfig,
    ) -> Self {
        let mut body = Self {
            handle,
            collider,
            profile: config.profile,
            profile_assigned: false,
            position: config.position,
            offset: config.offset,
            half_extents: config.half_extents,
            skin_width_ratio: config.skin_width_ratio,
            skin_width_ratio_y_factor: config.skin_width_ratio_y_factor,
            max_slope_angle: config.max_slope_angle,
            min_terminal_override: config.min_terminal_velocity,
            world_min_terminal: world.min_terminal_velocity,
            velocity: Vec2::zeros(),
            external_velocity: Vec2::zeros(),
            debug_velocity: Vec2::zeros(),
            gravity_scale: 1.0,
            default_gravity_scale: 1.0,
            state: BodyState::InAir,
            surface: SurfaceInfo::default(),
            time_grounded: 0.0,
            time_in_air: 0.0,
            ignore_collisions: config.ignore_collisions,
            resolve_surface_info: true,
            keep_surface_info: false,
            keep_speed_on_collision: config.keep_speed_on_collision,
            teleport_request: None,
            simulated_teleport_request: None,
            collider_moved: false,
            simulation_bounds: Bounds::new(config.position + config.offset, config.half_extents),
            motion: Vec2::zeros(),
            simulated_motion: Vec2::zeros(),
            realized_motion: Vec2::zeros(),
            total_simulated_velocity: Vec2::zeros(),
            simulated_velocity: Vec2::zeros(),
            simulated_teleport_motion: Vec2::zeros(),
            requests: Vec::with_capacity(8),
            collision_indices: Vec::with_capacity(8),
            collision_flags: CollisionFlags::NONE,
            sweep_count: 0,
        };
        body.initialize_profile();
        body
    }

    fn initialize_profile(&mut self) {
        self.default_gravity_scale = self.profile.default_gravity_scale();
        self.resolve_surface_info = self.profile.resolves_surface_info();
        self.reset_gravity_scale();
    }

    /// Switch to `profile`. Allowed once after construction.
    pub(crate) fn assign_profile(&mut self, profile: Profile) -> Result<(), crate::PhysicsError> {
        if self.profile_assigned {
            return Err(crate::PhysicsError::ProfileAlreadyAssigned(self.handle));
        }
        self.profile = profile;
        self.profile_assigned = true;
        self.initialize_profile();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Identity and geometry
    // -----------------------------------------------------------------------

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// The layer this body's collider lives on.
    pub fn layer(&self) -> CollisionLayers {
        self.profile.layer()
    }

    /// The layers this body's sweeps report. Empty while ignoring collisions.
    pub fn collision_mask(&self) -> CollisionLayers {
        if self.ignore_collisions {
            CollisionLayers::NONE
        } else {
            self.profile.collision_mask()
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn collider_center(&self) -> Vec2 {
        self.position + self.offset
    }

    /// Collider bounds at the current position.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.collider_center(), self.half_extents)
    }

    /// Collider bounds shrunk by the skin width, as of the last prepare.
    pub fn simulation_bounds(&self) -> Bounds {
        self.simulation_bounds
    }

    pub fn skin_width(&self) -> f32 {
        self.half_extents.x * self.skin_width_ratio
    }

    pub fn skin_width_y(&self) -> f32 {
        self.skin_width() * self.skin_width_ratio_y_factor
    }

    fn skin_width_for(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.skin_width(),
            Axis::Vertical => self.skin_width_y(),
        }
    }

    pub fn max_slope_angle(&self) -> f32 {
        self.max_slope_angle
    }

    pub fn set_max_slope_angle(&mut self, degrees: f32) {
        self.max_slope_angle = degrees;
    }

    // -----------------------------------------------------------------------
    // Velocity
    // -----------------------------------------------------------------------

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn speed_x(&self) -> f32 {
        self.velocity.x
    }

    pub fn set_speed_x(&mut self, speed: f32) {
        self.velocity.x = speed;
    }

    pub fn speed_y(&self) -> f32 {
        self.velocity.y
    }

    pub fn set_speed_y(&mut self, speed: f32) {
        self.velocity.y = speed;
    }

    /// Velocity applied for one tick only. Cleared in submit.
    pub fn external_velocity(&self) -> Vec2 {
        self.external_velocity
    }

    pub fn add_external_velocity(&mut self, velocity: Vec2) {
        self.external_velocity += velocity;
    }

    pub fn debug_velocity(&self) -> Vec2 {
        self.debug_velocity
    }

    pub fn set_debug_velocity(&mut self, velocity: Vec2) {
        self.debug_velocity = velocity;
    }

    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
    }

    pub fn default_gravity_scale(&self) -> f32 {
        self.default_gravity_scale
    }

    pub fn reset_gravity_scale(&mut self) {
        self.gravity_scale = self.default_gravity_scale;
    }

    /// Lower vertical speed clamp: the body override when negative, the
    /// world value otherwise.
    pub fn min_terminal_velocity(&self) -> f32 {
        if self.min_terminal_override < 0.0 {
            self.min_terminal_override
        } else {
            self.world_min_terminal
        }
    }

    pub fn set_min_terminal_velocity(&mut self, velocity: f32) {
        self.min_terminal_override = velocity;
    }

    // -----------------------------------------------------------------------
    // Contact state
    // -----------------------------------------------------------------------

    pub fn state(&self) -> BodyState {
        self.state
    }

    /// Standing on a surface according to the last probe.
    pub fn is_grounded(&self) -> bool {
        self.surface.is_supported()
    }

    pub fn is_in_air(&self) -> bool {
        !self.surface.is_supported()
    }

    pub fn surface_info(&self) -> &SurfaceInfo {
        &self.surface
    }

    /// Simulation time of the last transition to [`BodyState::Grounded`].
    pub fn time_grounded(&self) -> f64 {
        self.time_grounded
    }

    /// Simulation time of the last transition to [`BodyState::InAir`].
    pub fn time_in_air(&self) -> f64 {
        self.time_in_air
    }

    /// Grounded on a surface steeper than the max slope angle.
    pub fn is_above_max_slope(&self) -> bool {
        self.is_grounded() && angle_between(&up(), &self.surface.normal) > self.max_slope_angle
    }

    pub fn collision_flags(&self) -> CollisionFlags {
        self.collision_flags
    }

    /// Indices of the collision cache entries this body produced this tick.
    pub fn collision_indices(&self) -> &[usize] {
        &self.collision_indices
    }

    // -----------------------------------------------------------------------
    // Behaviour flags
    // -----------------------------------------------------------------------

    pub fn ignore_collisions(&self) -> bool {
        self.ignore_collisions
    }

    /// Ignored bodies report no sweep hits and are skipped by other bodies.
    pub fn set_ignore_collisions(&mut self, ignore: bool) {
        self.ignore_collisions = ignore;
    }

    pub fn resolve_surface_info(&self) -> bool {
        self.resolve_surface_info
    }

    pub fn set_resolve_surface_info(&mut self, resolve: bool) {
        self.resolve_surface_info = resolve;
    }

    pub fn keep_surface_info(&self) -> bool {
        self.keep_surface_info
    }

    /// Freeze the surface info at its current value.
    pub fn set_keep_surface_info(&mut self, keep: bool) {
        self.keep_surface_info = keep;
    }

    pub fn keep_speed_on_collision(&self) -> bool {
        self.keep_speed_on_collision
    }

    pub fn set_keep_speed_on_collision(&mut self, keep: bool) {
        self.keep_speed_on_collision = keep;
    }

    // -----------------------------------------------------------------------
    // Teleports
    // -----------------------------------------------------------------------

    /// Move to `destination` during the next prepare without sweeping.
    pub fn teleport(&mut self, destination: Vec2) {
        self.teleport_request = Some(destination);
    }

    pub fn pending_teleport(&self) -> Option<Vec2> {
        self.teleport_request
    }

    /// Move to `destination` right away, dropping any pending teleport.
    /// Reads of the position see the move at once; the world moves the
    /// collider before its next tick or query.
    pub fn instant_teleport(&mut self, destination: Vec2) {
        self.position = destination;
        self.teleport_request = None;
        self.refresh_simulation_bounds();
        self.collider_moved = true;
    }

    pub(crate) fn take_collider_moved(&mut self) -> bool {
        std::mem::take(&mut self.collider_moved)
    }

    /// Move to `destination` during the next simulate, sweeping the way
    /// there like regular motion.
    pub fn simulated_teleport(&mut self, destination: Vec2) {
        self.simulated_teleport_request = Some(destination);
    }

    /// Add `delta` to the pending simulated teleport, starting from the
    /// current position if none is pending.
    pub fn simulated_teleport_delta(&mut self, delta: Vec2) {
        if delta == Vec2::zeros() {
            return;
        }
        let base = self.simulated_teleport_request.unwrap_or(self.position);
        self.simulated_teleport_request = Some(base + delta);
    }

    // -----------------------------------------------------------------------
    // Tick outputs
    // -----------------------------------------------------------------------

    /// Desired motion computed by the last prepare.
    pub fn motion(&self) -> Vec2 {
        self.motion
    }

    /// Translation applied by the last simulate.
    pub fn realized_motion(&self) -> Vec2 {
        self.realized_motion
    }

    /// Realized motion divided by the tick delta.
    pub fn total_simulated_velocity(&self) -> Vec2 {
        self.total_simulated_velocity
    }

    /// Base velocity plus the simulated teleport contribution.
    pub fn simulated_velocity(&self) -> Vec2 {
        self.simulated_velocity
    }

    /// Number of sweep queries issued since the last prepare.
    pub fn sweep_count(&self) -> u32 {
        self.sweep_count
    }

    pub fn kinematic_state(&self) -> KinematicState {
        KinematicState {
            position: self.position,
            velocity: self.velocity,
            external_velocity: self.external_velocity,
            gravity_scale: self.gravity_scale,
            state: self.state,
            surface_state: self.surface.state,
            surface_normal: self.surface.normal,
            excess_distance: self.surface.excess_distance,
        }
    }

    pub(crate) fn apply_kinematic_state(&mut self, state: &KinematicState) {
        self.position = state.position;
        self.velocity = state.velocity;
        self.external_velocity = state.external_velocity;
        self.gravity_scale = state.gravity_scale;
        self.state = state.state;
        self.surface.reset();
        self.surface.state = state.surface_state;
        self.surface.normal = state.surface_normal;
        self.surface.excess_distance = state.excess_distance;
        self.teleport_request = None;
        self.simulated_teleport_request = None;
    }

    // -----------------------------------------------------------------------
    // Phase 1: prepare
    // -----------------------------------------------------------------------

    pub(crate) fn prepare(&mut self, config: &WorldConfig, dt: f32) {
        self.collision_indices.clear();
        self.collision_flags = CollisionFlags::NONE;
        self.requests.clear();
        self.sweep_count = 0;
        self.simulated_motion = Vec2::zeros();
        self.simulated_teleport_motion = Vec2::zeros();

        self.refresh_simulation_bounds();

        if let Some(destination) = self.teleport_request.take() {
            self.submit_motion(destination - self.position, config.epsilon_sqr());
        }

        self.motion = (self.velocity + self.external_velocity + self.debug_velocity) * dt;

        if self.speed_y() > 0.0 || !self.is_grounded() {
            let gravity = config.gravity.y * self.gravity_scale;
            self.motion.y += 0.5 * gravity * dt * dt;
            let speed_y = (self.speed_y() + gravity * dt)
                .clamp(self.min_terminal_velocity(), config.max_terminal_velocity);
            self.set_speed_y(speed_y);
        }

        if let Some(destination) = self.simulated_teleport_request.take() {
            self.simulated_teleport_motion = destination - self.position;
            self.motion += self.simulated_teleport_motion;
        }
    }

    // -----------------------------------------------------------------------
    // Phase 2: simulate
    // -----------------------------------------------------------------------

    pub(crate) fn simulate(&mut self, ctx: &SweepContext<'_>, cache: &mut CollisionCache, dt: f32) {
        self.build_motion_requests(ctx.config);

        while let Some(request) = self.requests.pop() {
            self.simulate_request(ctx, cache, request);
        }

        if dt > 0.0 {
            self.total_simulated_velocity = self.simulated_motion / dt;
        }
        self.realized_motion = self.simulated_motion;

        if self.total_simulated_velocity.norm_squared() > ctx.config.epsilon_sqr() {
            self.position += self.simulated_motion;
        }
    }

    /// Fill the request stack. Requests pushed last resolve first.
    fn build_motion_requests(&mut self, config: &WorldConfig) {
        let epsilon = config.epsilon;
        self.requests.clear();

        if self.is_grounded() && self.surface.excess_distance.abs() > epsilon {
            self.requests
                .push(MotionRequest::new(Axis::Vertical, -self.surface.excess_distance));
        }

        let motion = self.motion;
        if motion.norm_squared() <= config.epsilon_sqr() {
            return;
        }

        if motion.y.abs() > epsilon {
            self.requests.push(MotionRequest::new(Axis::Vertical, motion.y));
        }

        if motion.x.abs() > epsilon {
            let on_surface = transform_motion(motion.x, &self.surface.normal, true, epsilon);
            if !self.surface.is_supported() || on_surface.y.abs() <= epsilon {
                self.requests.push(MotionRequest::new(Axis::Horizontal, motion.x));
            } else if on_surface.y > 0.0 {
                self.requests.push(MotionRequest::new(Axis::Horizontal, on_surface.x));
                self.requests.push(MotionRequest::new(Axis::Vertical, on_surface.y));
            } else {
                self.requests.push(MotionRequest::new(Axis::Vertical, on_surface.y));
                self.requests.push(MotionRequest::new(Axis::Horizontal, on_surface.x));
            }
        }
    }

    fn simulate_request(
        &mut self,
        ctx: &SweepContext<'_>,
        cache: &mut CollisionCache,
        request: MotionRequest,
    ) {
        let epsilon = ctx.config.epsilon;
        let Some(sweep) = self.sweep(ctx, &request, 0.0) else {
            return;
        };
        let skin = self.skin_width_for(request.axis);

        let mut result = MotionResult {
            distance: sweep.distance,
            ..MotionResult::default()
        };
        if let Some(hit) = self.first_valid_hit(ctx, &sweep.hits) {
            result.distance = hit.distance;
            result.body = hit.body;
            result.collider = Some(hit.collider);
            result.normal = hit.normal;
            result.point = hit.point;
        }

        if result.distance.abs() > epsilon {
            self.submit_motion(sweep.direction * (result.distance - skin), ctx.config.epsilon_sqr());
        }

        let remaining = sweep.distance - result.distance;
        if remaining <= epsilon {
            tracing::trace!(body = %self.handle, axis = ?request.axis, motion = request.motion, "motion resolved");
            return;
        }

        if request.is_horizontal() && self.is_valid_slope(&result, ctx.config) {
            tracing::trace!(body = %self.handle, remaining, "slope absorbed horizontal motion");
            if !request.slope_projected {
                self.project_remainder(remaining * sweep.sign, &result.normal, epsilon);
            }
            return;
        }

        let flags = CollisionFlags::from_motion(request.axis, sweep.sign);
        let index = cache.add(self.handle, result.body, result.point, result.normal, flags);
        self.collision_indices.push(index);
        tracing::trace!(
            body = %self.handle,
            other = ?result.body,
            %flags,
            distance = result.distance,
            "collision recorded"
        );
    }

    /// Push the unconsumed part of a horizontal request back on the stack,
    /// redirected along the slope it ran into.
    fn project_remainder(&mut self, remaining: f32, normal: &Vec2, epsilon: f32) {
        let projected = transform_motion(remaining, normal, true, epsilon);
        if projected.y.abs() <= epsilon {
            self.requests.push(MotionRequest::projected(Axis::Horizontal, projected.x));
        } else if projected.y > 0.0 {
            self.requests.push(MotionRequest::projected(Axis::Horizontal, projected.x));
            self.requests.push(MotionRequest::projected(Axis::Vertical, projected.y));
        } else {
            self.requests.push(MotionRequest::projected(Axis::Vertical, projected.y));
            self.requests.push(MotionRequest::projected(Axis::Horizontal, projected.x));
        }
    }

    /// Slope entered from its foot and within the max angle, or a downward
    /// facing surface within the max angle of straight down.
    fn is_valid_slope(&self, result: &MotionResult, config: &WorldConfig) -> bool {
        let entrance = self.is_slope_entrance(&result.point, config.slope_distance_threshold);
        (entrance && angle_between(&up(), &result.normal) <= self.max_slope_angle)
            || angle_between(&down(), &result.normal) <= self.max_slope_angle
    }

    /// Whether `point` lies within `threshold` of the bottom of the
    /// simulation bounds.
    pub(crate) fn is_slope_entrance(&self, point: &Vec2, threshold: f32) -> bool {
        point.y - self.simulation_bounds.min().y <= threshold
    }

    /// Recompute the simulation bounds from the current position.
    pub(crate) fn refresh_simulation_bounds(&mut self) {
        let mut bounds = self.bounds();
        bounds.expand(Vec2::new(self.skin_width(), self.skin_width_y()) * -2.0);
        self.simulation_bounds = bounds;
    }

    fn submit_motion(&mut self, motion: Vec2, epsilon_sqr: f32) {
        if motion.norm_squared() > epsilon_sqr {
            self.simulation_bounds.translate(motion);
            self.simulated_motion += motion;
        }
    }

    // -----------------------------------------------------------------------
    // Sweeps
    // -----------------------------------------------------------------------

    /// Set up and run the sweep for `request`. `None` when the motion is too
    /// small to sweep at all.
    pub(crate) fn sweep(
        &mut self,
        ctx: &SweepContext<'_>,
        request: &MotionRequest,
        offset: f32,
    ) -> Option<Sweep> {
        let magnitude = request.motion.abs();
        if magnitude < ctx.config.epsilon {
            return None;
        }

        let axis = request.axis;
        let axis_unit = axis.unit();
        let perpendicular = axis.perpendicular();
        let sign = request.direction_sign();
        let direction = axis_unit * sign;
        let distance = magnitude + self.skin_width_for(axis) + offset;
        let thickness = ctx.config.sweep_thickness;

        let bounds = self.simulation_bounds;
        let extent = axis.component(&bounds.size()).abs();
        let mut origin = if sign > 0.0 {
            bounds.center + axis_unit * 0.5 * extent - axis_unit * thickness * 0.5
        } else {
            bounds.center - axis_unit * 0.5 * extent + axis_unit * thickness * 0.5
        };
        origin -= direction * offset;

        let size = perpendicular.unit() * perpendicular.component(&bounds.size()).abs()
            + axis_unit * thickness;

        let mask = self.collision_mask();
        let hits = if mask.is_empty() {
            Vec::new()
        } else {
            self.sweep_count += 1;
            ctx.geometry.sweep(&SweepQuery {
                origin,
                size,
                direction,
                distance,
                mask,
                max_hits: ctx.config.max_sweep_hits,
                exclude: Some(self.collider),
            })
        };

        Some(Sweep {
            direction,
            sign,
            distance,
            hits,
        })
    }

    /// The nearest hit that is neither this body nor an ignored body.
    fn first_valid_hit(&self, ctx: &SweepContext<'_>, hits: &[SweepHit]) -> Option<SweepHit> {
        hits.iter()
            .find(|hit| {
                hit.collider != self.collider
                    && hit.body != Some(self.handle)
                    && !hit.body.is_some_and(|b| ctx.ignored.contains(&b))
            })
            .copied()
    }

    /// True when nothing blocks `motion` along `axis`.
    pub(crate) fn probe(&mut self, ctx: &SweepContext<'_>, axis: Axis, motion: f32) -> bool {
        match self.sweep(ctx, &MotionRequest::new(axis, motion), 0.0) {
            Some(sweep) => sweep.hits.is_empty(),
            None => false,
        }
    }

    /// Distance to the nearest hit along `axis`, skin included.
    pub(crate) fn probe_distance(
        &mut self,
        ctx: &SweepContext<'_>,
        axis: Axis,
        motion: f32,
    ) -> Option<f32> {
        self.sweep(ctx, &MotionRequest::new(axis, motion), 0.0)?
            .hits
            .first()
            .map(|hit| hit.distance)
    }

    // -----------------------------------------------------------------------
    // Phase 3: submit
    // -----------------------------------------------------------------------

    pub(crate) fn submit(
        &mut self,
        ctx: &SweepContext<'_>,
        cache: &CollisionCache,
        dt: f32,
        time: f64,
    ) {
        self.update_surface_info(ctx, cache, time);

        self.simulated_velocity = if dt > 0.0 {
            self.velocity + self.simulated_teleport_motion / dt
        } else {
            self.velocity
        };

        self.collision_flags |= cache.combined_flags(&self.collision_indices);

        if !self.keep_speed_on_collision {
            let epsilon = ctx.config.epsilon;
            if self.collision_flags.intersects(CollisionFlags::VERTICAL) {
                self.set_speed_y(0.0);
            }
            let speed_x = self.speed_x();
            if (speed_x > epsilon && self.collision_flags.contains(CollisionFlags::HORIZONTAL_POS))
                || (speed_x < -epsilon
                    && self.collision_flags.contains(CollisionFlags::HORIZONTAL_NEG))
            {
                self.set_speed_x(0.0);
            }
        }

        self.simulated_teleport_motion = Vec2::zeros();
        self.simulated_motion = Vec2::zeros();
        self.external_velocity = Vec2::zeros();
    }

    fn update_surface_info(&mut self, ctx: &SweepContext<'_>, cache: &CollisionCache, time: f64) {
        if self.keep_surface_info {
            return;
        }

        let config = ctx.config;
        self.surface.reset();
        self.surface.top_normal =
            cache.average_normal(&self.collision_indices, CollisionFlags::VERTICAL_POS);

        if !self.resolve_surface_info
            || self.gravity_scale == 0.0
            || self.speed_y() > config.epsilon
        {
            return;
        }

        let probe = MotionRequest::new(Axis::Vertical, -config.surface_probe_distance);
        let hit = self
            .sweep(ctx, &probe, 0.0)
            .and_then(|sweep| self.first_valid_hit(ctx, &sweep.hits));

        if let Some(hit) = hit {
            let distance = hit.distance - self.skin_width_y();
            let supported = distance <= config.supported_distance_threshold;
            self.surface.state = if supported {
                SurfaceState::Supported
            } else {
                SurfaceState::Unsupported
            };
            self.surface.normal = hit.normal;
            self.surface.excess_distance = distance;
            self.surface.point = hit.point;
            self.surface.collider = Some(hit.collider);
            self.surface.body = hit.body;

            // Edge and penetration artifacts of the box sweep.
            let ny = self.surface.normal.y;
            if ny.abs() <= config.epsilon || (ny + 1.0).abs() <= config.epsilon {
                self.surface.normal = up();
            }

            if supported {
                self.reset_gravity_scale();
            }
        }

        match self.state {
            BodyState::Grounded if !self.surface.is_supported() => {
                self.state = BodyState::InAir;
                self.time_in_air = time;
                tracing::trace!(body = %self.handle, "left the ground");
            }
            BodyState::InAir if self.surface.is_supported() && self.speed_y() < config.epsilon => {
                self.state = BodyState::Grounded;
                self.time_grounded = time;
                tracing::trace!(body = %self.handle, "landed");
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Surface projection
// ---------------------------------------------------------------------------

fn sign(value: f32) -> f32 {
    if value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Redirect a scalar motion along the surface with the given normal.
///
/// The result has length `|motion|` and points along the surface tangent
/// whose horizontal (or vertical, when `is_horizontal` is false) component
/// has the sign of `motion`. A flat or degenerate normal leaves the motion
/// purely horizontal. Vertical components below `epsilon` are zeroed.
pub fn transform_motion(motion: f32, normal: &Vec2, is_horizontal: bool, epsilon: f32) -> Vec2 {
    if *normal == up() || normal.norm_squared() <= f32::EPSILON {
        return Vec2::new(motion, 0.0);
    }

    let tangent = Vec2::new(normal.y, -normal.x);
    let reference = if is_horizontal { tangent.x } else { tangent.y };
    let mut transformed = if sign(reference) == sign(motion) {
        tangent
    } else {
        -tangent
    };
    transformed *= motion.abs();

    if transformed.y.abs() < epsilon {
        transformed.y = 0.0;
    }
    transformed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
