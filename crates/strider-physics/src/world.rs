//! The world tick driver.
//!
//! [`PhysicsWorldHandler`] owns every [`PhysicsBody`], the shared
//! [`CollisionCache`] and the [`CollisionGeometry`] the bodies sweep against.
//! One call to [`tick`](PhysicsWorldHandler::tick) runs, in this order:
//!
//! 1. clear the collision cache,
//! 2. `prepare` every registered body,
//! 3. `simulate` every registered body,
//! 4. push all body positions into the geometry and sync it once,
//! 5. `submit` every registered body.
//!
//! Bodies are visited in registration order within each phase. During
//! `simulate` every sweep sees the collider positions from the end of the
//! previous tick.
//!
//! # Example
//!
//! ```
//! use strider_physics::prelude::*;
//!
//! let mut world = PhysicsWorldHandler::new(WorldConfig::default()).unwrap();
//! world.geometry_mut().add_static_box(Vec2::new(0.0, -0.5), Vec2::new(20.0, 0.5));
//! let player = world
//!     .create_body(BodyConfig::new(Profile::Player, Vec2::new(0.0, 0.6), Vec2::new(0.5, 0.5)))
//!     .unwrap();
//!
//! for _ in 0..120 {
//!     world.tick(1.0 / 60.0);
//! }
//! assert!(world.body(player).unwrap().is_grounded());
//! ```

use std::collections::HashMap;

use crate::body::{BodyHandle, KinematicState, PhysicsBody, SweepContext};
use crate::collision::CollisionCache;
use crate::config::{BodyConfig, WorldConfig};
use crate::geometry::CollisionGeometry;
use crate::layers::{CollisionLayers, Profile};
use crate::motion::{Axis, Bounds};
use crate::{PhysicsError, Vec2};

/// Owner of all bodies and the per-tick simulation driver.
pub struct PhysicsWorldHandler {
    config: WorldConfig,
    geometry: CollisionGeometry,
    cache: CollisionCache,
    bodies: HashMap<BodyHandle, PhysicsBody>,
    /// Registered bodies in registration order.
    active: Vec<BodyHandle>,
    /// Scratch list of bodies ignoring collisions, rebuilt every tick.
    ignored: Vec<BodyHandle>,
    next_handle: u32,
    time: f64,
    tick_count: u64,
}

impl Default for PhysicsWorldHandler {
    fn default() -> Self {
        Self::with_valid_config(WorldConfig::default())
    }
}

impl PhysicsWorldHandler {
    /// Create an empty world after validating `config`.
    pub fn new(config: WorldConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: WorldConfig) -> Self {
        let cache = CollisionCache::new(config.collision_cache_capacity);
        Self {
            config,
            geometry: CollisionGeometry::new(),
            cache,
            bodies: HashMap::new(),
            active: Vec::new(),
            ignored: Vec::new(),
            next_handle: 0,
            time: 0.0,
            tick_count: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn geometry(&self) -> &CollisionGeometry {
        &self.geometry
    }

    /// Mutable access for adding and removing static level geometry.
    pub fn geometry_mut(&mut self) -> &mut CollisionGeometry {
        &mut self.geometry
    }

    /// Contacts recorded during the last tick.
    pub fn collision_cache(&self) -> &CollisionCache {
        &self.cache
    }

    /// Accumulated simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // -----------------------------------------------------------------------
    // Body lifecycle
    // -----------------------------------------------------------------------

    /// Create a body and register it.
    pub fn create_body(&mut self, config: BodyConfig) -> Result<BodyHandle, PhysicsError> {
        config.validate()?;
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        let collider = self.geometry.insert_body_collider(
            handle,
            config.position + config.offset,
            config.half_extents,
        );
        let body = PhysicsBody::new(handle, collider, &config, &self.config);
        self.bodies.insert(handle, body);
        tracing::debug!(body = %handle, profile = ?config.profile, "body created");

        self.register(handle)?;
        Ok(handle)
    }

    /// Unregister a body and drop it together with its collider. Returns
    /// `false` if the handle is unknown.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        self.unregister(handle);
        let Some(body) = self.bodies.remove(&handle) else {
            return false;
        };
        self.geometry.remove_collider(body.collider());
        tracing::debug!(body = %handle, "body destroyed");
        true
    }

    /// Add a body to the simulation. Registering an already registered body
    /// does nothing.
    pub fn register(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let body = self
            .bodies
            .get(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        if self.active.contains(&handle) {
            return Ok(());
        }
        self.geometry.set_collider_center(body.collider(), body.collider_center());
        self.geometry.set_collider_layers(body.collider(), body.layer());
        self.active.push(handle);
        tracing::debug!(body = %handle, "body registered");
        Ok(())
    }

    /// Remove a body from the simulation without destroying it. Returns
    /// whether it was registered.
    pub fn unregister(&mut self, handle: BodyHandle) -> bool {
        let Some(index) = self.active.iter().position(|h| *h == handle) else {
            if !self.bodies.contains_key(&handle) {
                tracing::warn!(body = %handle, "unregister ignored for unknown body");
            }
            return false;
        };
        self.active.remove(index);
        if let Some(body) = self.bodies.get(&handle) {
            self.geometry.set_collider_layers(body.collider(), CollisionLayers::NONE);
        }
        tracing::debug!(body = %handle, "body unregistered");
        true
    }

    pub fn is_registered(&self, handle: BodyHandle) -> bool {
        self.active.contains(&handle)
    }

    /// Re-assign a body's profile. Allowed once per body.
    pub fn set_profile(&mut self, handle: BodyHandle, profile: Profile) -> Result<(), PhysicsError> {
        let body = self
            .bodies
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        body.assign_profile(profile)?;
        if self.active.contains(&handle) {
            self.geometry.set_collider_layers(body.collider(), body.layer());
        }
        tracing::debug!(body = %handle, ?profile, "profile assigned");
        Ok(())
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&PhysicsBody> {
        self.bodies.get(&handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut PhysicsBody> {
        self.bodies.get_mut(&handle)
    }

    /// A body together with the world tuning, borrowed at the same time.
    pub fn body_and_config_mut(
        &mut self,
        handle: BodyHandle,
    ) -> Option<(&mut PhysicsBody, &WorldConfig)> {
        let body = self.bodies.get_mut(&handle)?;
        Some((body, &self.config))
    }

    /// Registered bodies in registration order.
    pub fn bodies(&self) -> impl Iterator<Item = &PhysicsBody> + '_ {
        self.active.iter().filter_map(|h| self.bodies.get(h))
    }

    /// Registered body handles in registration order.
    pub fn registered(&self) -> &[BodyHandle] {
        &self.active
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance every registered body by `dt` seconds. A non-positive `dt`
    /// means the simulation is paused and nothing happens.
    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.time += dt as f64;
        self.tick_count += 1;

        self.cache.clear();
        self.sync_moved_colliders();
        if self.geometry.is_dirty() {
            self.geometry.sync();
        }

        for handle in &self.active {
            if let Some(body) = self.bodies.get_mut(handle) {
                body.prepare(&self.config, dt);
            }
        }

        self.collect_ignored();
        let ctx = SweepContext {
            config: &self.config,
            geometry: &self.geometry,
            ignored: &self.ignored,
        };
        for handle in &self.active {
            if let Some(body) = self.bodies.get_mut(handle) {
                body.simulate(&ctx, &mut self.cache, dt);
            }
        }

        self.sync_transforms();

        let ctx = SweepContext {
            config: &self.config,
            geometry: &self.geometry,
            ignored: &self.ignored,
        };
        for handle in &self.active {
            if let Some(body) = self.bodies.get_mut(handle) {
                body.submit(&ctx, &self.cache, dt, self.time);
            }
        }

        tracing::trace!(
            tick = self.tick_count,
            bodies = self.active.len(),
            collisions = self.cache.len(),
            "world tick"
        );
    }

    /// Push every registered body position into its collider and rebuild the
    /// query structure once.
    fn sync_transforms(&mut self) {
        for handle in &self.active {
            if let Some(body) = self.bodies.get(handle) {
                self.geometry.set_collider_center(body.collider(), body.collider_center());
            }
        }
        self.geometry.sync();
    }

    /// Push the colliders of bodies teleported between ticks.
    fn sync_moved_colliders(&mut self) {
        for body in self.bodies.values_mut() {
            if body.take_collider_moved() {
                self.geometry
                    .set_collider_center(body.collider(), body.collider_center());
            }
        }
    }

    fn collect_ignored(&mut self) {
        self.ignored.clear();
        for handle in &self.active {
            if self.bodies.get(handle).is_some_and(|b| b.ignore_collisions()) {
                self.ignored.push(*handle);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries and immediate operations
    // -----------------------------------------------------------------------

    /// Move a body to `destination` right away and make the move visible to
    /// queries.
    pub fn instant_teleport(&mut self, handle: BodyHandle, destination: Vec2) -> Result<(), PhysicsError> {
        self.bodies
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?
            .instant_teleport(destination);
        self.sync_moved_colliders();
        self.geometry.sync();
        Ok(())
    }

    /// True when nothing blocks `motion` along `axis` from the body's
    /// current position. Motions below epsilon report `false`.
    pub fn probe(&mut self, handle: BodyHandle, axis: Axis, motion: f32) -> Result<bool, PhysicsError> {
        self.prepare_query(handle)?;
        let ctx = SweepContext {
            config: &self.config,
            geometry: &self.geometry,
            ignored: &self.ignored,
        };
        let body = self
            .bodies
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        Ok(body.probe(&ctx, axis, motion))
    }

    /// Distance to the nearest collider along `axis`, skin included. `None`
    /// when nothing is within reach.
    pub fn probe_distance(
        &mut self,
        handle: BodyHandle,
        axis: Axis,
        motion: f32,
    ) -> Result<Option<f32>, PhysicsError> {
        self.prepare_query(handle)?;
        let ctx = SweepContext {
            config: &self.config,
            geometry: &self.geometry,
            ignored: &self.ignored,
        };
        let body = self
            .bodies
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        Ok(body.probe_distance(&ctx, axis, motion))
    }

    fn prepare_query(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        self.bodies
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?
            .refresh_simulation_bounds();
        self.sync_moved_colliders();
        if self.geometry.is_dirty() {
            self.geometry.sync();
        }
        self.collect_ignored();
        Ok(())
    }

    /// Realized velocity of the body supporting `handle`. Zero for static
    /// ground or no ground.
    pub fn surface_velocity(&self, handle: BodyHandle) -> Vec2 {
        self.bodies
            .get(&handle)
            .and_then(|body| body.surface_info().body)
            .and_then(|support| self.bodies.get(&support))
            .map(|support| support.total_simulated_velocity())
            .unwrap_or_else(Vec2::zeros)
    }

    /// Registered bodies on `mask` whose collider overlaps `bounds`, in
    /// registration order.
    pub fn overlapping_bodies(&self, bounds: &Bounds, mask: CollisionLayers) -> Vec<BodyHandle> {
        self.bodies()
            .filter(|body| body.layer().intersects(mask) && body.bounds().intersects(bounds))
            .map(|body| body.handle())
            .collect()
    }

    /// Overwrite a body's persistent state, for example from a snapshot.
    pub fn restore_kinematic_state(
        &mut self,
        handle: BodyHandle,
        state: &KinematicState,
    ) -> Result<(), PhysicsError> {
        let body = self
            .bodies
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        body.apply_kinematic_state(state);
        body.refresh_simulation_bounds();
        let (collider, center) = (body.collider(), body.collider_center());
        self.geometry.set_collider_center(collider, center);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_floor() -> PhysicsWorldHandler {
        let mut world = PhysicsWorldHandler::new(WorldConfig::default()).unwrap();
        world
            .geometry_mut()
            .add_static_box(Vec2::new(0.0, -0.5), Vec2::new(50.0, 0.5));
        world
    }

    fn player_at(x: f32, y: f32) -> BodyConfig {
        BodyConfig::new(Profile::Player, Vec2::new(x, y), Vec2::new(0.5, 0.5))
    }

    #[test]
    fn create_body_registers_it() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 2.0)).unwrap();
        let b = world.create_body(player_at(3.0, 2.0)).unwrap();
        assert_ne!(a, b);
        assert!(world.is_registered(a));
        assert_eq!(world.registered(), &[a, b]);
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn create_body_rejects_invalid_config() {
        let mut world = world_with_floor();
        let mut config = player_at(0.0, 0.0);
        config.skin_width_ratio = 2.0;
        assert!(matches!(
            world.create_body(config),
            Err(PhysicsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn register_is_idempotent() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 2.0)).unwrap();
        world.register(a).unwrap();
        world.register(a).unwrap();
        assert_eq!(world.registered().len(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 2.0)).unwrap();
        let b = world.create_body(player_at(2.0, 2.0)).unwrap();
        assert!(world.unregister(a));
        assert!(!world.unregister(a));
        assert_eq!(world.registered(), &[b]);
        // Still alive, can come back at the end of the order.
        world.register(a).unwrap();
        assert_eq!(world.registered(), &[b, a]);
    }

    #[test]
    fn register_unknown_body_fails() {
        let mut world = world_with_floor();
        let err = world.register(BodyHandle(42)).unwrap_err();
        assert!(matches!(err, PhysicsError::UnknownBody(BodyHandle(42))));
        assert!(!world.unregister(BodyHandle(42)));
    }

    #[test]
    fn unregistered_body_does_not_move() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 5.0)).unwrap();
        world.unregister(a);
        for _ in 0..10 {
            world.tick(1.0 / 60.0);
        }
        assert_eq!(world.body(a).unwrap().position(), Vec2::new(0.0, 5.0));
    }

    #[test]
    fn destroy_body_removes_collider() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 2.0)).unwrap();
        assert_eq!(world.geometry().collider_count(), 2);
        assert!(world.destroy_body(a));
        assert!(!world.destroy_body(a));
        assert_eq!(world.geometry().collider_count(), 1);
        assert!(world.body(a).is_none());
    }

    #[test]
    fn paused_tick_does_nothing() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 5.0)).unwrap();
        world.tick(0.0);
        world.tick(-1.0);
        assert_eq!(world.tick_count(), 0);
        assert_eq!(world.time(), 0.0);
        assert_eq!(world.body(a).unwrap().position(), Vec2::new(0.0, 5.0));
    }

    #[test]
    fn falling_body_lands_on_floor() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 2.0)).unwrap();
        for _ in 0..180 {
            world.tick(1.0 / 60.0);
        }
        let body = world.body(a).unwrap();
        assert!(body.is_grounded());
        assert_eq!(body.speed_y(), 0.0);
        let bottom = body.bounds().min().y;
        assert!(bottom.abs() < 0.02, "bottom {bottom}");
    }

    #[test]
    fn set_profile_once() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 2.0)).unwrap();
        world.set_profile(a, Profile::AI).unwrap();
        assert_eq!(world.body(a).unwrap().profile(), Profile::AI);
        assert!(matches!(
            world.set_profile(a, Profile::Player),
            Err(PhysicsError::ProfileAlreadyAssigned(_))
        ));
        assert!(matches!(
            world.set_profile(BodyHandle(9), Profile::Player),
            Err(PhysicsError::UnknownBody(_))
        ));
    }

    #[test]
    fn instant_teleport_is_visible_to_probes() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 5.0)).unwrap();
        // 4.5 units above the floor, a 1 unit probe reaches nothing.
        assert!(world.probe(a, Axis::Vertical, -1.0).unwrap());
        world.instant_teleport(a, Vec2::new(0.0, 0.8)).unwrap();
        assert_eq!(world.body(a).unwrap().position(), Vec2::new(0.0, 0.8));
        assert!(!world.probe(a, Axis::Vertical, -1.0).unwrap());

        let distance = world.probe_distance(a, Axis::Vertical, -1.0).unwrap().unwrap();
        // Gap of 0.3 plus the vertical skin.
        assert!((distance - 0.35).abs() < 1e-3, "distance {distance}");
        assert_eq!(world.probe_distance(a, Axis::Vertical, 1.0).unwrap(), None);
    }

    #[test]
    fn body_teleport_moves_collider_before_next_query() {
        let mut world = world_with_floor();
        let player = world.create_body(player_at(0.0, 0.5)).unwrap();
        let platform = world
            .create_body(BodyConfig::new(Profile::Solid, Vec2::new(10.0, 5.0), Vec2::new(1.0, 0.2)))
            .unwrap();
        assert!(world.probe(player, Axis::Vertical, 2.0).unwrap());

        world
            .body_mut(platform)
            .unwrap()
            .instant_teleport(Vec2::new(0.0, 2.0));
        assert!(!world.probe(player, Axis::Vertical, 2.0).unwrap());
    }

    #[test]
    fn body_and_config_are_borrowed_together() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 2.0)).unwrap();
        let (body, config) = world.body_and_config_mut(a).unwrap();
        body.set_speed_x(2.0);
        assert_eq!(config.gravity, Vec2::new(0.0, -9.81));
        assert_eq!(world.body(a).unwrap().speed_x(), 2.0);
        assert!(world.body_and_config_mut(BodyHandle(99)).is_none());
    }

    #[test]
    fn tiny_probe_reports_blocked() {
        let mut world = world_with_floor();
        let a = world.create_body(player_at(0.0, 5.0)).unwrap();
        assert!(!world.probe(a, Axis::Horizontal, 1e-7).unwrap());
    }

    #[test]
    fn overlapping_bodies_filters_by_layer() {
        let mut world = world_with_floor();
        let player = world.create_body(player_at(0.0, 2.0)).unwrap();
        let enemy = world
            .create_body(BodyConfig::new(Profile::AI, Vec2::new(0.8, 2.0), Vec2::new(0.5, 0.5)))
            .unwrap();
        let area = Bounds::new(Vec2::new(0.5, 2.0), Vec2::new(0.5, 0.5));

        assert_eq!(
            world.overlapping_bodies(&area, CollisionLayers::PLAYER | CollisionLayers::AI),
            vec![player, enemy]
        );
        assert_eq!(world.overlapping_bodies(&area, CollisionLayers::AI), vec![enemy]);
        world.unregister(enemy);
        assert!(world.overlapping_bodies(&area, CollisionLayers::AI).is_empty());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = WorldConfig {
            epsilon: 0.0,
            ..WorldConfig::default()
        };
        assert!(PhysicsWorldHandler::new(config).is_err());
    }
}
