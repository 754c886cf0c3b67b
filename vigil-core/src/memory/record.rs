//! Observed-entity snapshots and the records that remember them.

use serde::{Deserialize, Serialize};

use crate::types::{ArmorType, EntityId, Location, Rotation, WeaponType};

/// What one entity exposes about itself to anyone who looks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Who this snapshot describes.
    pub entity: EntityId,
    /// Current health.
    pub remaining_health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Current stamina.
    pub remaining_stamina: f32,
    /// Armor category.
    pub armor: ArmorType,
    /// Weapon category.
    pub weapon: WeaponType,
    /// Position.
    pub location: Location,
    /// Orientation.
    pub rotation: Rotation,
}

impl EntitySnapshot {
    /// A healthy, unarmored snapshot at `location`.
    #[must_use]
    pub fn new(entity: EntityId, location: Location) -> Self {
        Self {
            entity,
            remaining_health: 100.0,
            max_health: 100.0,
            remaining_stamina: 100.0,
            armor: ArmorType::default(),
            weapon: WeaponType::default(),
            location,
            rotation: Rotation::default(),
        }
    }

    /// Set health and max health.
    #[must_use]
    pub fn with_health(mut self, remaining: f32, max: f32) -> Self {
        self.remaining_health = remaining;
        self.max_health = max;
        self
    }

    /// Set stamina.
    #[must_use]
    pub fn with_stamina(mut self, stamina: f32) -> Self {
        self.remaining_stamina = stamina;
        self
    }

    /// Set orientation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set equipment categories.
    #[must_use]
    pub fn with_equipment(mut self, armor: ArmorType, weapon: WeaponType) -> Self {
        self.armor = armor;
        self.weapon = weapon;
        self
    }

    /// Whether the entity still has health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.remaining_health > 0.0
    }

    /// Remaining health as a fraction of max, 0 when max is not positive.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.remaining_health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// One agent's decaying memory of another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// The remembered entity (weak reference).
    pub entity: EntityId,
    /// Last-known health.
    pub remaining_health: f32,
    /// Last-known max health.
    pub max_health: f32,
    /// Last-known stamina.
    pub remaining_stamina: f32,
    /// Last-known armor.
    pub armor: ArmorType,
    /// Last-known weapon.
    pub weapon: WeaponType,
    /// Last-known position.
    pub last_seen_location: Location,
    /// Last-known orientation.
    pub last_seen_rotation: Rotation,
    /// Whether perception currently reports this entity visible.
    pub is_currently_perceived: bool,
    /// Seconds since the last positive observation.
    pub time_since_perceived: f32,
}

impl MemoryRecord {
    /// Build a fresh record from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &EntitySnapshot, perceived: bool) -> Self {
        Self {
            entity: snapshot.entity,
            remaining_health: snapshot.remaining_health,
            max_health: snapshot.max_health,
            remaining_stamina: snapshot.remaining_stamina,
            armor: snapshot.armor,
            weapon: snapshot.weapon,
            last_seen_location: snapshot.location,
            last_seen_rotation: snapshot.rotation,
            is_currently_perceived: perceived,
            time_since_perceived: 0.0,
        }
    }

    /// Overwrite the remembered state without touching perception bookkeeping.
    pub fn apply(&mut self, snapshot: &EntitySnapshot) {
        self.remaining_health = snapshot.remaining_health;
        self.max_health = snapshot.max_health;
        self.remaining_stamina = snapshot.remaining_stamina;
        self.armor = snapshot.armor;
        self.weapon = snapshot.weapon;
        self.last_seen_location = snapshot.location;
        self.last_seen_rotation = snapshot.rotation;
    }

    /// Mark a positive observation.
    pub fn mark_perceived(&mut self) {
        self.is_currently_perceived = true;
        self.time_since_perceived = 0.0;
    }

    /// Whether the remembered entity was alive when last seen.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.remaining_health > 0.0
    }

    /// The record viewed as a snapshot, e.g. to share with a teammate.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            entity: self.entity,
            remaining_health: self.remaining_health,
            max_health: self.max_health,
            remaining_stamina: self.remaining_stamina,
            armor: self.armor,
            weapon: self.weapon,
            location: self.last_seen_location,
            rotation: self.last_seen_rotation,
        }
    }
}
