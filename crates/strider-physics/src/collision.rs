//! Per-tick collision ledger.
//!
//! Every blocking sweep a body resolves during `simulate` is recorded in the
//! world's [`CollisionCache`] as a [`CollisionData`] entry. Bodies keep the
//! indices of the entries they produced and fold the entry flags into their
//! own [`CollisionFlags`] during `submit`. The cache is cleared at the start of
//! every world tick.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::{motion::Axis, BodyHandle, Vec2};

// ---------------------------------------------------------------------------
// CollisionFlags
// ---------------------------------------------------------------------------

/// Bitmask of the axis/direction pairs a collision was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CollisionFlags(pub u8);

impl CollisionFlags {
    pub const NONE: CollisionFlags = CollisionFlags(0);
    pub const HORIZONTAL_POS: CollisionFlags = CollisionFlags(0x1);
    pub const HORIZONTAL_NEG: CollisionFlags = CollisionFlags(0x2);
    pub const VERTICAL_POS: CollisionFlags = CollisionFlags(0x4);
    pub const VERTICAL_NEG: CollisionFlags = CollisionFlags(0x8);
    pub const HORIZONTAL: CollisionFlags = CollisionFlags(0x1 | 0x2);
    pub const VERTICAL: CollisionFlags = CollisionFlags(0x4 | 0x8);
    pub const ALL: CollisionFlags = CollisionFlags(0xF);

    /// The flag for a motion along `axis` with the given sign.
    pub fn from_motion(axis: Axis, sign: f32) -> CollisionFlags {
        match (axis, sign >= 0.0) {
            (Axis::Horizontal, true) => Self::HORIZONTAL_POS,
            (Axis::Horizontal, false) => Self::HORIZONTAL_NEG,
            (Axis::Vertical, true) => Self::VERTICAL_POS,
            (Axis::Vertical, false) => Self::VERTICAL_NEG,
        }
    }

    /// True when every bit of `other` is set.
    pub fn contains(self, other: CollisionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    pub fn intersects(self, other: CollisionFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CollisionFlags {
    type Output = CollisionFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        CollisionFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CollisionFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CollisionFlags {
    type Output = CollisionFlags;

    fn bitand(self, rhs: Self) -> Self::Output {
        CollisionFlags(self.0 & rhs.0)
    }
}

impl fmt::Display for CollisionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names = [
            (Self::HORIZONTAL_POS, "+x"),
            (Self::HORIZONTAL_NEG, "-x"),
            (Self::VERTICAL_POS, "+y"),
            (Self::VERTICAL_NEG, "-y"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CollisionData
// ---------------------------------------------------------------------------

/// One recorded contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionData {
    /// The body whose sweep was blocked.
    pub body: BodyHandle,
    /// The body that blocked it. `None` for static geometry.
    pub other_body: Option<BodyHandle>,
    /// World-space contact point.
    pub position: Vec2,
    /// Surface normal at the contact.
    pub normal: Vec2,
    /// Axis and direction of the blocked motion.
    pub flags: CollisionFlags,
}

// ---------------------------------------------------------------------------
// CollisionCache
// ---------------------------------------------------------------------------

/// Fixed-capacity list of the contacts discovered in the current tick.
#[derive(Debug, Clone)]
pub struct CollisionCache {
    entries: Vec<CollisionData>,
    capacity: usize,
}

impl CollisionCache {
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "collision cache capacity must be non-zero");
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a contact and return its index.
    ///
    /// # Panics
    ///
    /// Panics when the cache is full. Running out of slots means too many
    /// simultaneous contacts for the configured capacity.
    pub fn add(
        &mut self,
        body: BodyHandle,
        other_body: Option<BodyHandle>,
        position: Vec2,
        normal: Vec2,
        flags: CollisionFlags,
    ) -> usize {
        assert!(
            self.entries.len() < self.capacity,
            "collision cache overflow: more than {} contacts in one tick",
            self.capacity
        );
        self.entries.push(CollisionData {
            body,
            other_body,
            position,
            normal,
            flags,
        });
        self.entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&CollisionData> {
        self.entries.get(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionData> {
        self.entries.iter()
    }

    /// Average normal of the entries at `indices` whose flags intersect
    /// `flags`. Zero when nothing matches.
    pub fn average_normal(&self, indices: &[usize], flags: CollisionFlags) -> Vec2 {
        let mut sum = Vec2::zeros();
        let mut count = 0u32;
        for entry in indices.iter().filter_map(|&i| self.entries.get(i)) {
            if entry.flags.intersects(flags) {
                sum += entry.normal;
                count += 1;
            }
        }
        if count == 0 {
            Vec2::zeros()
        } else {
            sum / count as f32
        }
    }

    /// Union of the flags of the entries at `indices`.
    pub fn combined_flags(&self, indices: &[usize]) -> CollisionFlags {
        indices
            .iter()
            .filter_map(|&i| self.entries.get(i))
            .fold(CollisionFlags::NONE, |acc, e| acc | e.flags)
    }

    /// Every entry where `handle` is either side of the contact.
    pub fn collisions_involving(
        &self,
        handle: BodyHandle,
    ) -> impl Iterator<Item = &CollisionData> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.body == handle || e.other_body == Some(handle))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
