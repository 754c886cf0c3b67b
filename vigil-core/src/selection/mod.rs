//! Target selection: which enemy or structure to fight.
//!
//! Selection runs in three stages:
//!
//! 1. **Threat preemption.** A pending forced target from the
//!    [`ThreatTracker`], then any source that has dealt more than half the
//!    agent's max health, wins outright.
//! 2. **Filtering.** Dead, excluded, unperceived (when perception is
//!    required), vanished and over-subscribed candidates are dropped.
//! 3. **Rank scoring.** Each criterion is dense-ranked among the remaining
//!    candidates (see [`rank`]) and the weighted ranks are summed. The best
//!    sum wins if it beats the personality's threshold.
//!
//! Because only relative order matters, weights never need retuning for a
//! different map scale or health pool.

pub mod rank;
pub mod scoring;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buildings::BuildingMemory;
use crate::config::SelectionConfig;
use crate::error::{Result, VigilError};
use crate::memory::{MemoryRecord, MemoryStore};
use crate::threat::ThreatTracker;
use crate::types::{EntityId, Location};

pub use scoring::ScoreBreakdown;

// ---------------------------------------------------------------------------
// Weights & personalities
// ---------------------------------------------------------------------------

/// Per-personality criterion weights and minimum winning score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionWeights {
    /// Weight of the remaining-health rank.
    pub health: f32,
    /// Weight of the remaining-stamina rank.
    pub stamina: f32,
    /// Weight of the distance rank.
    pub location: f32,
    /// Weight of the facing-away rank.
    pub rotation: f32,
    /// The winning sum must exceed this.
    pub threshold: f32,
}

impl SelectionWeights {
    /// Build validated weights.
    ///
    /// # Errors
    /// Returns `VigilError::InvalidWeights` for negative or non-finite values.
    pub fn new(health: f32, stamina: f32, location: f32, rotation: f32, threshold: f32) -> Result<Self> {
        for (name, w) in [("health", health), ("stamina", stamina), ("location", location), ("rotation", rotation)] {
            if !w.is_finite() || w < 0.0 {
                return Err(VigilError::InvalidWeights(format!("{name} weight is {w}")));
            }
        }
        if !threshold.is_finite() {
            return Err(VigilError::InvalidWeights(format!("threshold is {threshold}")));
        }
        Ok(Self { health, stamina, location, rotation, threshold })
    }

    /// Multiply every weight and the threshold by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            health: self.health * factor,
            stamina: self.stamina * factor,
            location: self.location * factor,
            rotation: self.rotation * factor,
            threshold: self.threshold * factor,
        }
    }
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Personality::Balanced.weights()
    }
}

/// Stock fighting temperaments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Personality {
    /// Opportunistic: picks on the weak and the close, likes backstabs.
    Goblin,
    /// Lumbering: mostly cares about what is nearest.
    Ogre,
    /// Every criterion counts the same.
    #[default]
    Balanced,
}

impl Personality {
    /// The weights this personality fights with.
    #[must_use]
    pub fn weights(self) -> SelectionWeights {
        let (health, stamina, location, rotation, threshold) = match self {
            Self::Goblin => (1.0, 0.25, 1.0, 0.5, 5.0),
            Self::Ogre => (0.5, 0.25, 2.0, 0.25, 0.0),
            Self::Balanced => (1.0, 1.0, 1.0, 1.0, 0.0),
        };
        SelectionWeights { health, stamina, location, rotation, threshold }
    }
}

// ---------------------------------------------------------------------------
// World view
// ---------------------------------------------------------------------------

/// What selection needs to know about the world beyond memory.
pub trait Surroundings {
    /// Whether the entity still exists.
    fn is_present(&self, entity: EntityId) -> bool;

    /// How many *other* allies are currently attacking `entity`.
    fn attackers_of(&self, entity: EntityId) -> u32;
}

/// Caller options for [`TargetSelector::select_enemy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRequest {
    /// Never return this entity.
    pub excluding: Option<EntityId>,
    /// Only consider entities perceived right now.
    pub require_perceived: bool,
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Stateless scorer bound to one agent's weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSelector {
    weights: SelectionWeights,
    config: SelectionConfig,
}

impl TargetSelector {
    /// Create a selector.
    #[must_use]
    pub fn new(weights: SelectionWeights, config: SelectionConfig) -> Self {
        Self { weights, config }
    }

    /// The weights in use.
    #[must_use]
    pub fn weights(&self) -> &SelectionWeights {
        &self.weights
    }

    /// Pick the enemy to fight, or `None`.
    ///
    /// Consumes the threat tracker's pending forced target when it fires.
    pub fn select_enemy(
        &self,
        memory: &MemoryStore,
        threat: &mut ThreatTracker,
        world: &impl Surroundings,
        request: SelectionRequest,
    ) -> Option<EntityId> {
        let owner = memory.owner();
        let max_health = memory.own_snapshot().max_health;
        let is_valid = |id: EntityId| {
            world.is_present(id) && memory.record(id).is_none_or(MemoryRecord::is_alive)
        };

        if let Some(forced) = threat.take_forced_target(is_valid) {
            debug!(agent = %owner, target = %forced, "Selected forced-engagement target");
            return Some(forced);
        }
        if let Some(heavy) = threat.heavy_damage_source(max_health, is_valid) {
            debug!(agent = %owner, target = %heavy, "Selected heavy-damage source");
            return Some(heavy);
        }

        let candidates = self.candidates(memory, world, request);
        match candidates.as_slice() {
            [] => {
                debug!(agent = %owner, "No enemy candidates");
                None
            }
            [only] => Some(only.entity),
            _ => self.best_scored(memory, &candidates),
        }
    }

    fn candidates<'m>(
        &self,
        memory: &'m MemoryStore,
        world: &impl Surroundings,
        request: SelectionRequest,
    ) -> Vec<&'m MemoryRecord> {
        memory
            .records()
            .iter()
            .filter(|r| r.is_alive())
            .filter(|r| request.excluding != Some(r.entity))
            .filter(|r| !request.require_perceived || r.is_currently_perceived)
            .filter(|r| world.is_present(r.entity))
            .filter(|r| world.attackers_of(r.entity) < self.config.max_attackers)
            .collect()
    }

    fn best_scored(&self, memory: &MemoryStore, candidates: &[&MemoryRecord]) -> Option<EntityId> {
        let scored = self.score(memory, candidates);
        let best = scored.iter().fold(None::<&ScoreBreakdown>, |best, s| match best {
            Some(b) if b.total() >= s.total() => Some(b),
            _ => Some(s),
        })?;

        debug!(
            agent = %memory.owner(),
            target = %best.entity,
            score = best.total(),
            threshold = self.weights.threshold,
            candidates = candidates.len(),
            "Scored enemy candidates"
        );
        (best.total() > self.weights.threshold).then_some(best.entity)
    }

    /// Score breakdown for each candidate, in input order.
    #[must_use]
    pub fn score(&self, memory: &MemoryStore, candidates: &[&MemoryRecord]) -> Vec<ScoreBreakdown> {
        scoring::score_enemies(candidates, &memory.own_snapshot().location, &self.weights)
    }

    /// Pick the structure to attack, or `None` if nothing scores above zero.
    #[must_use]
    pub fn select_building(
        &self,
        buildings: &BuildingMemory,
        from: &Location,
        ignore: Option<EntityId>,
    ) -> Option<EntityId> {
        let candidates: Vec<_> = buildings
            .records()
            .iter()
            .filter(|b| ignore != Some(b.building))
            .collect();
        if candidates.is_empty() {
            debug!("No building candidates");
            return None;
        }

        scoring::score_buildings(&candidates, from, &self.config)
            .into_iter()
            .filter(|(_, total)| *total > 0.0)
            .fold(None::<(EntityId, f32)>, |best, (id, total)| match best {
                Some((_, b)) if b >= total => best,
                _ => Some((id, total)),
            })
            .map(|(id, _)| id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
