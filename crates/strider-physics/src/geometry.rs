//! Collision geometry backed by rapier2d's query pipeline.
//!
//! [`CollisionGeometry`] stores every collider the sweeps can hit: static
//! level geometry (boxes, rotated boxes, triangles for slopes) and one box
//! collider per [`PhysicsBody`](crate::body::PhysicsBody). No rigid bodies
//! are simulated; rapier is used purely as a spatial query structure.
//!
//! Collider positions are only visible to queries after [`sync`] rebuilds the
//! acceleration structure. The world handler calls it once per tick after all
//! bodies have moved.
//!
//! [`sync`]: CollisionGeometry::sync

use rapier2d::parry::query::{ShapeCastOptions, ShapeCastStatus};
use rapier2d::parry::shape::Cuboid;
use rapier2d::prelude::*;

use crate::{layers::CollisionLayers, BodyHandle, Vec2};

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// An axis-aligned box sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepQuery {
    /// Center of the box at the start of the sweep.
    pub origin: Vec2,
    /// Full width and height of the box.
    pub size: Vec2,
    /// Unit direction of travel.
    pub direction: Vec2,
    /// Maximum travel distance.
    pub distance: f32,
    /// Only colliders on these layers are reported.
    pub mask: CollisionLayers,
    /// Maximum number of hits to report.
    pub max_hits: usize,
    /// Collider never reported, usually the sweeping body's own.
    pub exclude: Option<ColliderHandle>,
}

/// One collider reached by a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Travel distance at which the box touches the collider.
    pub distance: f32,
    /// World-space contact point on the collider.
    pub point: Vec2,
    /// Outward surface normal of the collider at `point`.
    pub normal: Vec2,
    pub collider: ColliderHandle,
    /// Owning body, `None` for static geometry.
    pub body: Option<BodyHandle>,
    /// The box already overlapped the collider at the start of the sweep.
    pub penetrating: bool,
}

// ---------------------------------------------------------------------------
// CollisionGeometry
// ---------------------------------------------------------------------------

/// Collider storage and sweep queries.
pub struct CollisionGeometry {
    colliders: ColliderSet,
    /// Always empty. rapier's query API requires one.
    rigid_bodies: RigidBodySet,
    islands: IslandManager,
    pipeline: QueryPipeline,
    dirty: bool,
}

impl Default for CollisionGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionGeometry {
    pub fn new() -> Self {
        Self {
            colliders: ColliderSet::new(),
            rigid_bodies: RigidBodySet::new(),
            islands: IslandManager::new(),
            pipeline: QueryPipeline::new(),
            dirty: false,
        }
    }

    // -- static geometry ----------------------------------------------------

    /// Add an axis-aligned static box on the [`CollisionLayers::SOLID`] layer.
    pub fn add_static_box(&mut self, center: Vec2, half_extents: Vec2) -> ColliderHandle {
        self.add_static_collider(
            ColliderBuilder::cuboid(half_extents.x, half_extents.y).translation(center),
        )
    }

    /// Add a static box rotated by `angle` radians.
    pub fn add_static_rotated_box(
        &mut self,
        center: Vec2,
        half_extents: Vec2,
        angle: f32,
    ) -> ColliderHandle {
        self.add_static_collider(
            ColliderBuilder::cuboid(half_extents.x, half_extents.y)
                .translation(center)
                .rotation(angle),
        )
    }

    /// Add a static triangle, the usual shape for slopes.
    pub fn add_static_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) -> ColliderHandle {
        self.add_static_collider(ColliderBuilder::triangle(
            Point::from(a),
            Point::from(b),
            Point::from(c),
        ))
    }

    /// Add any static collider. Its collision groups and user data are
    /// overwritten so that it sits on the solid layer and belongs to no body.
    pub fn add_static_collider(&mut self, builder: impl Into<Collider>) -> ColliderHandle {
        let mut collider: Collider = builder.into();
        collider.set_collision_groups(CollisionLayers::SOLID.membership_groups());
        collider.user_data = 0;
        self.dirty = true;
        self.colliders.insert(collider)
    }

    /// Remove a collider. Returns `false` if it did not exist.
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> bool {
        let removed = self
            .colliders
            .remove(handle, &mut self.islands, &mut self.rigid_bodies, false)
            .is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    // -- body colliders -----------------------------------------------------

    pub(crate) fn insert_body_collider(
        &mut self,
        body: BodyHandle,
        center: Vec2,
        half_extents: Vec2,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .translation(center)
            .collision_groups(InteractionGroups::none())
            .user_data(body.0 as u128 + 1)
            .build();
        self.dirty = true;
        self.colliders.insert(collider)
    }

    pub(crate) fn set_collider_center(&mut self, handle: ColliderHandle, center: Vec2) {
        if let Some(collider) = self.colliders.get_mut(handle) {
            collider.set_translation(center);
            self.dirty = true;
        }
    }

    /// Put a collider on `layers`, or take it out of every query with
    /// [`CollisionLayers::NONE`].
    pub(crate) fn set_collider_layers(&mut self, handle: ColliderHandle, layers: CollisionLayers) {
        if let Some(collider) = self.colliders.get_mut(handle) {
            let groups = if layers.is_empty() {
                InteractionGroups::none()
            } else {
                layers.membership_groups()
            };
            collider.set_collision_groups(groups);
            self.dirty = true;
        }
    }

    /// The body that owns `handle`, `None` for static colliders.
    pub fn body_of(&self, handle: ColliderHandle) -> Option<BodyHandle> {
        let data = self.colliders.get(handle)?.user_data;
        if data == 0 {
            None
        } else {
            Some(BodyHandle((data - 1) as u32))
        }
    }

    // -- queries ------------------------------------------------------------

    /// Whether colliders changed since the last [`sync`](Self::sync).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the query acceleration structure from the current colliders.
    pub fn sync(&mut self) {
        self.pipeline.update(&self.colliders);
        self.dirty = false;
    }

    /// Sweep a box and return up to `query.max_hits` hits ordered nearest
    /// first. Each collider is reported at most once.
    pub fn sweep(&self, query: &SweepQuery) -> Vec<SweepHit> {
        let mut hits = Vec::new();
        if query.max_hits == 0 || query.mask.is_empty() || query.distance < 0.0 {
            return hits;
        }
        let shape = Cuboid::new(query.size * 0.5);
        let shape_pos = Isometry::translation(query.origin.x, query.origin.y);
        let options = ShapeCastOptions {
            max_time_of_impact: query.distance,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        };

        let mut reported: Vec<ColliderHandle> = Vec::with_capacity(query.max_hits);
        while hits.len() < query.max_hits {
            let not_reported = |handle: ColliderHandle, _: &Collider| !reported.contains(&handle);
            let mut filter = QueryFilter::new()
                .groups(query.mask.query_groups())
                .predicate(&not_reported);
            if let Some(exclude) = query.exclude {
                filter = filter.exclude_collider(exclude);
            }

            let Some((handle, hit)) = self.pipeline.cast_shape(
                &self.rigid_bodies,
                &self.colliders,
                &shape_pos,
                &query.direction,
                &shape,
                options,
                filter,
            ) else {
                break;
            };

            reported.push(handle);
            hits.push(SweepHit {
                distance: hit.time_of_impact,
                point: hit.witness1.coords,
                normal: hit.normal1.into_inner(),
                collider: handle,
                body: self.body_of(handle),
                penetrating: hit.status == ShapeCastStatus::PenetratingOrWithinTargetDist,
            });
        }

        tracing::trace!(
            origin_x = query.origin.x,
            origin_y = query.origin.y,
            distance = query.distance,
            hits = hits.len(),
            "sweep"
        );
        hits
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
