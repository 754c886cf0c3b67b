//! Core type definitions shared by every VIGIL subsystem.
//!
//! All types are serializable so the world inspector can dump them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for any entity (agent, player, structure) in the world.
///
/// Ids are weak references: holding one never keeps the entity alive, and
/// every lookup through an id must tolerate the entity being gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an ID from a fixed integer, for deterministic fixtures.
    #[must_use]
    pub fn from_raw(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A 3D position (or direction) in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Location {
    /// Construct a location from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another location.
    #[must_use]
    pub fn distance(&self, other: &Location) -> f32 {
        (*other - *self).length()
    }

    /// Vector length.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Dot product, treating both locations as vectors.
    #[must_use]
    pub fn dot(&self, other: &Location) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalized(&self) -> Location {
        let len = self.length();
        if len <= f32::EPSILON {
            return Location::default();
        }
        Location::new(self.x / len, self.y / len, self.z / len)
    }
}

impl Add for Location {
    type Output = Location;

    fn add(self, rhs: Location) -> Location {
        Location::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Location {
    type Output = Location;

    fn sub(self, rhs: Location) -> Location {
        Location::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Up/down tilt.
    pub pitch: f32,
    /// Heading around the vertical axis; 0 faces +X.
    pub yaw: f32,
    /// Tilt around the forward axis. Carried for completeness, unused by scoring.
    pub roll: f32,
}

impl Rotation {
    /// A pure heading with no pitch or roll.
    #[must_use]
    pub const fn from_yaw(yaw: f32) -> Self {
        Self { pitch: 0.0, yaw, roll: 0.0 }
    }

    /// Heading that looks from `from` towards `to`.
    #[must_use]
    pub fn looking_at(from: &Location, to: &Location) -> Self {
        let d = *to - *from;
        Self::from_yaw(d.y.atan2(d.x).to_degrees())
    }

    /// Unit forward vector for this orientation.
    #[must_use]
    pub fn forward(&self) -> Location {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Location::new(pitch.cos() * yaw.cos(), pitch.cos() * yaw.sin(), pitch.sin())
    }
}

/// How closely `facing` points from `from` at `towards`, in `[-1, 1]`.
///
/// 1 means looking straight at the point, -1 means looking directly away.
#[must_use]
pub fn facing_alignment(facing: &Rotation, from: &Location, towards: &Location) -> f32 {
    facing.forward().dot(&(*towards - *from).normalized())
}

// ---------------------------------------------------------------------------
// Equipment categories
// ---------------------------------------------------------------------------

/// Last-known armor category of an observed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArmorType {
    /// Cloth padding.
    #[default]
    Padded,
    /// Leather armor.
    Leather,
    /// Mail armor.
    Chainmail,
    /// Plate armor.
    Plate,
}

/// Last-known weapon category of an observed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponType {
    /// No weapon drawn.
    #[default]
    Unarmed,
    /// Bows and thrown weapons.
    Ranged,
    /// Swords, axes, clubs.
    Melee,
    /// Spellcasting.
    Magic,
}

/// Allegiance used to decide who counts as hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Faction(pub u32);

impl Faction {
    /// Whether two factions fight each other.
    #[must_use]
    pub fn is_hostile_to(self, other: Faction) -> bool {
        self != other
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Location::new(0.0, 0.0, 0.0);
        let b = Location::new(3.0, 4.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        assert_eq!(Location::default().normalized(), Location::default());
    }

    #[test]
    fn facing_towards_point_is_positive_one() {
        let from = Location::new(0.0, 0.0, 0.0);
        let to = Location::new(10.0, 0.0, 0.0);
        let facing = Rotation::looking_at(&from, &to);
        assert!((facing_alignment(&facing, &from, &to) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn facing_away_is_negative_one() {
        let from = Location::new(0.0, 0.0, 0.0);
        let to = Location::new(0.0, 10.0, 0.0);
        let facing = Rotation::from_yaw(-90.0);
        assert!((facing_alignment(&facing, &from, &to) + 1.0).abs() < 1e-5);
    }

    #[test]
    fn raw_ids_are_stable() {
        assert_eq!(EntityId::from_raw(7), EntityId::from_raw(7));
        assert_ne!(EntityId::from_raw(7), EntityId::from_raw(8));
    }
}
