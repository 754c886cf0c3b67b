//! Configuration for the VIGIL combat AI.
//!
//! Maps directly to the `[memory]`, `[threat]`, `[selection]` and
//! `[combat]` tables of `vigil.toml`. Every field has a default, so an
//! empty document yields the stock tuning.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};

/// Top-level VIGIL configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VigilConfig {
    /// Memory store capacity, decay and tether timing.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Aggro accumulation and escalation.
    #[serde(default)]
    pub threat: ThreatConfig,
    /// Target selection limits and building scoring.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Engagement state machine tuning.
    #[serde(default)]
    pub combat: CombatConfig,
}

impl VigilConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `VigilError::Config` if the TOML is invalid or a value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| VigilError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    /// Returns `VigilError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("memory.forget_horizon_secs", self.memory.forget_horizon_secs),
            ("memory.sync_interval_secs", self.memory.sync_interval_secs),
            ("threat.decay_interval_secs", self.threat.decay_interval_secs),
            ("threat.engaged_cooldown_secs", self.threat.engaged_cooldown_secs),
            ("combat.evaluation_interval_secs", self.combat.evaluation_interval_secs),
            ("combat.sight_radius", self.combat.sight_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(VigilError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if self.memory.capacity == 0 {
            return Err(VigilError::Config("memory.capacity must be at least 1".to_string()));
        }
        if self.memory.combat_entry_delay_min_secs > self.memory.combat_entry_delay_max_secs {
            return Err(VigilError::Config(
                "memory.combat_entry_delay_min_secs exceeds the max".to_string(),
            ));
        }
        let chances = self.combat.block_chance + self.combat.dodge_chance;
        if !(0.0..=1.0).contains(&self.combat.block_chance)
            || !(0.0..=1.0).contains(&self.combat.dodge_chance)
            || chances > 1.0
        {
            return Err(VigilError::Config(format!(
                "combat.block_chance + combat.dodge_chance must lie in [0, 1], got {chances}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Memory store capacity, decay and tether timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum records per agent.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Seconds without perception before a record is forgotten.
    #[serde(default = "default_forget_horizon")]
    pub forget_horizon_secs: f32,
    /// Interval between tether synchronization passes.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: f32,
    /// Tethered agents closer than this notify each other.
    #[serde(default = "default_proximity_radius")]
    pub proximity_radius: f32,
    /// Any remembered hostile within this radius puts the agent in danger.
    #[serde(default = "default_danger_radius")]
    pub danger_radius: f32,
    /// Lower bound of the random delay before entering combat mode.
    #[serde(default = "default_combat_entry_min")]
    pub combat_entry_delay_min_secs: f32,
    /// Upper bound of the random delay before entering combat mode.
    #[serde(default = "default_combat_entry_max")]
    pub combat_entry_delay_max_secs: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            forget_horizon_secs: 60.0,
            sync_interval_secs: 0.5,
            proximity_radius: 100.0,
            danger_radius: 1000.0,
            combat_entry_delay_min_secs: 0.05,
            combat_entry_delay_max_secs: 0.2,
        }
    }
}

/// Aggro accumulation and forced-engagement escalation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatConfig {
    /// Seconds between aggro decay passes.
    #[serde(default = "default_one_sec")]
    pub decay_interval_secs: f32,
    /// Aggro removed from every entry per pass.
    #[serde(default = "default_decay_per_pass")]
    pub decay_per_pass: u32,
    /// Seconds without damage before cumulative damage resets.
    #[serde(default = "default_damage_reset")]
    pub damage_reset_secs: f32,
    /// How long a forced engagement suppresses further escalation.
    #[serde(default = "default_thirty_secs")]
    pub engaged_cooldown_secs: f32,
    /// Aggro threshold for agents spawned without their own.
    #[serde(default = "default_aggro_threshold")]
    pub default_aggro_threshold: u32,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            decay_interval_secs: 1.0,
            decay_per_pass: 1,
            damage_reset_secs: 5.0,
            engaged_cooldown_secs: 30.0,
            default_aggro_threshold: 20,
        }
    }
}

/// Target selection limits and building scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Candidates already attacked by this many other allies are skipped.
    #[serde(default = "default_max_attackers")]
    pub max_attackers: u32,
    /// Material score for flammable (wooden) structures.
    #[serde(default = "default_wood_score")]
    pub wood_material_score: f32,
    /// Material score for every other structure.
    #[serde(default = "default_other_material_score")]
    pub other_material_score: f32,
    /// Score applied to destroyed structures so they never win.
    #[serde(default = "default_zero_health_penalty")]
    pub zero_health_penalty: f32,
    /// Building criterion weights.
    #[serde(default)]
    pub building_weights: BuildingWeights,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_attackers: 4,
            wood_material_score: 10.0,
            other_material_score: 1.0,
            zero_health_penalty: -100.0,
            building_weights: BuildingWeights::default(),
        }
    }
}

/// Weights for the three building criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingWeights {
    /// Material/flammability weight.
    #[serde(default = "default_weight")]
    pub material: f32,
    /// Remaining-health weight (lower health preferred).
    #[serde(default = "default_weight")]
    pub health: f32,
    /// Distance weight (closer preferred).
    #[serde(default = "default_weight")]
    pub distance: f32,
}

impl Default for BuildingWeights {
    fn default() -> Self {
        Self { material: 1.0, health: 1.0, distance: 1.0 }
    }
}

/// Engagement state machine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Seconds between state machine evaluations.
    #[serde(default = "default_one_sec")]
    pub evaluation_interval_secs: f32,
    /// Perception radius; also the leash length near home.
    #[serde(default = "default_sight_radius")]
    pub sight_radius: f32,
    /// Beyond this home distance the leash shrinks to `far_leash`.
    #[serde(default = "default_far_home")]
    pub far_home_distance: f32,
    /// Beyond this home distance the leash halves.
    #[serde(default = "default_mid_home")]
    pub mid_home_distance: f32,
    /// Leash length when far from home.
    #[serde(default = "default_far_leash")]
    pub far_leash: f32,
    /// Consecutive out-of-leash evaluations that trigger a disengage.
    #[serde(default = "default_leash_strikes")]
    pub leash_strikes: u32,
    /// Seconds spent disengaging before returning to idle.
    #[serde(default = "default_one_sec")]
    pub disengage_secs: f32,
    /// Reselection delay after the target slipped the leash.
    #[serde(default = "default_reselect_after_leash")]
    pub reselect_after_leash_secs: f32,
    /// Reselection delay after fleeing.
    #[serde(default = "default_thirty_secs")]
    pub reselect_after_flight_secs: f32,
    /// Seconds after engaging before a better target may replace the current one.
    #[serde(default = "default_thirty_secs")]
    pub retarget_lock_secs: f32,
    /// Own health fraction at or below which the agent flees.
    #[serde(default = "default_flee_fraction")]
    pub flee_health_fraction: f32,
    /// Chance to block an incoming attack.
    #[serde(default = "default_block_chance")]
    pub block_chance: f32,
    /// Chance to dodge an incoming attack when not blocking.
    #[serde(default = "default_dodge_chance")]
    pub dodge_chance: f32,
    /// Minimum facing alignment for a target to count as facing the agent.
    #[serde(default = "default_facing_threshold")]
    pub facing_threshold: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: 1.0,
            sight_radius: 1000.0,
            far_home_distance: 3500.0,
            mid_home_distance: 2500.0,
            far_leash: 10.0,
            leash_strikes: 2,
            disengage_secs: 1.0,
            reselect_after_leash_secs: 15.0,
            reselect_after_flight_secs: 30.0,
            retarget_lock_secs: 30.0,
            flee_health_fraction: 0.2,
            block_chance: 0.5,
            dodge_chance: 0.2,
            facing_threshold: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_capacity() -> usize { 10 }
fn default_forget_horizon() -> f32 { 60.0 }
fn default_sync_interval() -> f32 { 0.5 }
fn default_proximity_radius() -> f32 { 100.0 }
fn default_danger_radius() -> f32 { 1000.0 }
fn default_combat_entry_min() -> f32 { 0.05 }
fn default_combat_entry_max() -> f32 { 0.2 }
fn default_one_sec() -> f32 { 1.0 }
fn default_decay_per_pass() -> u32 { 1 }
fn default_damage_reset() -> f32 { 5.0 }
fn default_thirty_secs() -> f32 { 30.0 }
fn default_aggro_threshold() -> u32 { 20 }
fn default_max_attackers() -> u32 { 4 }
fn default_wood_score() -> f32 { 10.0 }
fn default_other_material_score() -> f32 { 1.0 }
fn default_zero_health_penalty() -> f32 { -100.0 }
fn default_weight() -> f32 { 1.0 }
fn default_sight_radius() -> f32 { 1000.0 }
fn default_far_home() -> f32 { 3500.0 }
fn default_mid_home() -> f32 { 2500.0 }
fn default_far_leash() -> f32 { 10.0 }
fn default_leash_strikes() -> u32 { 2 }
fn default_reselect_after_leash() -> f32 { 15.0 }
fn default_flee_fraction() -> f32 { 0.2 }
fn default_block_chance() -> f32 { 0.5 }
fn default_dodge_chance() -> f32 { 0.2 }
fn default_facing_threshold() -> f32 { 0.5 }

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = VigilConfig::from_toml("").expect("empty config parses");
        assert_eq!(config.memory.capacity, 10);
        assert!((config.memory.forget_horizon_secs - 60.0).abs() < f32::EPSILON);
        assert_eq!(config.selection.max_attackers, 4);
        assert!((config.threat.engaged_cooldown_secs - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = VigilConfig::from_toml(
            "[memory]\ncapacity = 4\n\n[combat]\nblock_chance = 0.1\n",
        )
        .expect("partial config parses");
        assert_eq!(config.memory.capacity, 4);
        assert!((config.memory.sync_interval_secs - 0.5).abs() < f32::EPSILON);
        assert!((config.combat.block_chance - 0.1).abs() < f32::EPSILON);
        assert!((config.combat.dodge_chance - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = VigilConfig::from_toml("[memory]\ncapacity = 0\n");
        assert!(matches!(err, Err(VigilError::Config(_))));
    }

    #[test]
    fn impossible_chances_are_rejected() {
        let err = VigilConfig::from_toml("[combat]\nblock_chance = 0.8\ndodge_chance = 0.5\n");
        assert!(matches!(err, Err(VigilError::Config(_))));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(VigilConfig::from_toml("[memory"), Err(VigilError::Config(_))));
    }

    #[test]
    fn loads_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[threat]\ndefault_aggro_threshold = 7").expect("write");
        let config = VigilConfig::from_file(file.path()).expect("file config parses");
        assert_eq!(config.threat.default_aggro_threshold, 7);
    }
}
