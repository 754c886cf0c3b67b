//! Per-criterion rank scores for enemies and structures.
//!
//! Enemy score = w_h·Rank(health) + w_s·Rank(stamina) + w_l·Rank(distance) + w_r·Rank(facing)
//!
//! Every rank prefers the lower value: weaker, more tired, closer, and
//! facing away from the selecting agent.
//!
//! Building score = w_m·Material + w_h·Rank(health) + w_d·Rank(distance),
//! with the material term replaced by a large penalty for destroyed
//! structures.

use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingRecord, Material};
use crate::config::SelectionConfig;
use crate::memory::MemoryRecord;
use crate::selection::SelectionWeights;
use crate::selection::rank::{TOP_SCORE, dense_rank};
use crate::types::{EntityId, Location, facing_alignment};

/// Weighted per-criterion contributions for one enemy candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// The candidate.
    pub entity: EntityId,
    /// Weighted health rank.
    pub health: f32,
    /// Weighted stamina rank.
    pub stamina: f32,
    /// Weighted distance rank.
    pub distance: f32,
    /// Weighted facing rank.
    pub facing: f32,
}

impl ScoreBreakdown {
    /// Sum of all weighted contributions.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.health + self.stamina + self.distance + self.facing
    }
}

/// Score every candidate against the others.
#[must_use]
pub fn score_enemies(
    candidates: &[&MemoryRecord],
    own_location: &Location,
    weights: &SelectionWeights,
) -> Vec<ScoreBreakdown> {
    let health: Vec<f32> = candidates.iter().map(|r| r.remaining_health).collect();
    let stamina: Vec<f32> = candidates.iter().map(|r| r.remaining_stamina).collect();
    let distance: Vec<f32> = candidates
        .iter()
        .map(|r| r.last_seen_location.distance(own_location))
        .collect();
    let facing: Vec<f32> = candidates
        .iter()
        .map(|r| facing_alignment(&r.last_seen_rotation, &r.last_seen_location, own_location))
        .collect();

    let health = dense_rank(&health, TOP_SCORE);
    let stamina = dense_rank(&stamina, TOP_SCORE);
    let distance = dense_rank(&distance, TOP_SCORE);
    let facing = dense_rank(&facing, TOP_SCORE);

    candidates
        .iter()
        .enumerate()
        .map(|(i, r)| ScoreBreakdown {
            entity: r.entity,
            health: weights.health * health[i] as f32,
            stamina: weights.stamina * stamina[i] as f32,
            distance: weights.location * distance[i] as f32,
            facing: weights.rotation * facing[i] as f32,
        })
        .collect()
}

/// Score every structure, returning `(building, total)` in input order.
#[must_use]
pub fn score_buildings(
    candidates: &[&BuildingRecord],
    from: &Location,
    config: &SelectionConfig,
) -> Vec<(EntityId, f32)> {
    let health: Vec<f32> = candidates.iter().map(|b| b.health).collect();
    let distance: Vec<f32> = candidates.iter().map(|b| b.location.distance(from)).collect();
    let health = dense_rank(&health, TOP_SCORE);
    let distance = dense_rank(&distance, TOP_SCORE);
    let w = config.building_weights;

    candidates
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let material = if b.health <= 0.0 {
                config.zero_health_penalty
            } else if b.material == Material::Wood {
                config.wood_material_score
            } else {
                config.other_material_score
            };
            let total = w.material * material + w.health * health[i] as f32 + w.distance * distance[i] as f32;
            (b.building, total)
        })
        .collect()
}
