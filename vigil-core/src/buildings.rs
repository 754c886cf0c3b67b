//! Remembered structures.
//!
//! Buildings do not move and are not forgotten by time. A record lives
//! from discovery until the structure is destroyed.

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Location};

/// What a structure is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    /// Flammable; favoured by raiders.
    Wood,
    /// Masonry.
    Stone,
    /// Reinforced or metal-clad.
    Metal,
}

/// Cached state of a discovered structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    /// The structure.
    pub building: EntityId,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Position.
    pub location: Location,
    /// Construction material.
    pub material: Material,
}

/// An agent's list of known structures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingMemory {
    records: Vec<BuildingRecord>,
}

impl BuildingMemory {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a discovered structure, refreshing it if already known.
    ///
    /// Returns `true` if the structure was new.
    pub fn discover(&mut self, record: BuildingRecord) -> bool {
        match self.records.iter_mut().find(|r| r.building == record.building) {
            Some(existing) => {
                *existing = record;
                false
            }
            None => {
                self.records.push(record);
                true
            }
        }
    }

    /// Drop a destroyed structure.
    pub fn remove(&mut self, building: EntityId) -> Option<BuildingRecord> {
        let index = self.records.iter().position(|r| r.building == building)?;
        Some(self.records.remove(index))
    }

    /// Remaining health as a fraction of max, or -1 for unknown structures.
    #[must_use]
    pub fn health_fraction(&self, building: EntityId) -> f32 {
        self.get(building)
            .filter(|r| r.max_health > 0.0)
            .map_or(-1.0, |r| r.health / r.max_health)
    }

    /// The record for `building`.
    #[must_use]
    pub fn get(&self, building: EntityId) -> Option<&BuildingRecord> {
        self.records.iter().find(|r| r.building == building)
    }

    /// All records in discovery order.
    #[must_use]
    pub fn records(&self) -> &[BuildingRecord] {
        &self.records
    }

    /// Number of known structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no structure is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
