//! Physics bodies and the category/mask collision model
//!
//! Every body carries one category plus two independent bitmasks: the
//! contact mask decides which touches are reported to the dispatcher, the
//! collision mask decides which bodies it cannot overlap. A bullet, for
//! example, reports contact with units but collides with nothing.

use glam::Vec2;

/// Category tag carried by every physical body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Category {
    Unit = 1 << 0,
    Ground = 1 << 1,
    Player = 1 << 2,
    Bullet = 1 << 3,
    HoleSensor = 1 << 4,
    Bonus = 1 << 5,
}

impl Category {
    #[inline]
    pub fn bit(self) -> u32 {
        self as u32
    }
}

/// A set of categories, used for both contact and collision masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mask(u32);

impl Mask {
    pub const EMPTY: Mask = Mask(0);

    pub const fn of(categories: &[Category]) -> Mask {
        let mut bits = 0;
        let mut i = 0;
        while i < categories.len() {
            bits |= categories[i] as u32;
            i += 1;
        }
        Mask(bits)
    }

    #[inline]
    pub fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }
}

/// What a static Ground body is part of. The dispatcher needs to tell the
/// platform and floor segments apart for direction commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundKind {
    Wall,
    Ceiling,
    Floor,
    Platform,
}

/// Stable handle into the body table. Never reused within a world instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// An axis-aligned body in the world. Static bodies have `dynamic = false`
/// and never move; sensors have an empty collision mask and never block.
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub category: Category,
    pub contact_mask: Mask,
    pub collision_mask: Mask,
    /// Center position.
    pub pos: Vec2,
    pub vel: Vec2,
    /// Half extents.
    pub half: Vec2,
    pub gravity: bool,
    pub dynamic: bool,
    pub ground_kind: Option<GroundKind>,
}

impl Body {
    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.half
    }

    /// Strict AABB overlap (touching edges do not count).
    pub fn overlaps(&self, other: &Body) -> bool {
        let a_min = self.min();
        let a_max = self.max();
        let b_min = other.min();
        let b_max = other.max();
        a_min.x < b_max.x && b_min.x < a_max.x && a_min.y < b_max.y && b_min.y < a_max.y
    }

    /// Penetration depth along each axis, positive only while overlapping.
    pub fn penetration(&self, other: &Body) -> Vec2 {
        let d = (other.pos - self.pos).abs();
        let reach = self.half + other.half;
        reach - d
    }
}

/// Whether a vertical downward ray from `(x, y_top)` of length `probe`
/// intersects any Ground-tagged body. Used for the jump ground check.
pub fn ray_hits_ground(bodies: &[Body], x: f32, y_top: f32, probe: f32) -> bool {
    let y_bottom = y_top - probe;
    bodies.iter().any(|b| {
        b.category == Category::Ground
            && x >= b.min().x
            && x <= b.max().x
            && y_bottom <= b.max().y
            && y_top >= b.min().y
    })
}
