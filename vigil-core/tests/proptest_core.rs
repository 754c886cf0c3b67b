//! Property-Based Tests for Vigil Core
//!
//! Uses `proptest` to check memory, selection and threat invariants under
//! random inputs.

use proptest::prelude::*;

use vigil_core::config::{MemoryConfig, SelectionConfig, ThreatConfig};
use vigil_core::memory::{EntitySnapshot, MemoryStore, ObserveOutcome};
use vigil_core::selection::{SelectionRequest, SelectionWeights, Surroundings, TargetSelector};
use vigil_core::threat::{Provocation, ThreatTracker};
use vigil_core::types::{EntityId, Location, Rotation};

struct OpenField;

impl Surroundings for OpenField {
    fn is_present(&self, _: EntityId) -> bool {
        true
    }

    fn attackers_of(&self, _: EntityId) -> u32 {
        0
    }
}

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_enemy(raw: u128) -> impl Strategy<Value = EntitySnapshot> {
    (1.0..100.0f32, 0.0..100.0f32, -2000.0..2000.0f32, -2000.0..2000.0f32, 0.0..360.0f32).prop_map(
        move |(health, stamina, x, y, yaw)| {
            EntitySnapshot::new(EntityId::from_raw(raw), Location::new(x, y, 0.0))
                .with_health(health, 100.0)
                .with_stamina(stamina)
                .with_rotation(Rotation::from_yaw(yaw))
        },
    )
}

fn arb_enemies() -> impl Strategy<Value = Vec<EntitySnapshot>> {
    (2usize..10).prop_flat_map(|n| (1..=n as u128).map(arb_enemy).collect::<Vec<_>>())
}

fn arb_weights() -> impl Strategy<Value = SelectionWeights> {
    (0.0..4.0f32, 0.0..4.0f32, 0.0..4.0f32, 0.0..4.0f32, 0.0..30.0f32).prop_map(|(h, s, l, r, t)| {
        SelectionWeights::new(h, s, l, r, t).unwrap_or_default()
    })
}

fn store() -> MemoryStore {
    MemoryStore::new(
        EntitySnapshot::new(EntityId::from_raw(0), Location::default()),
        &MemoryConfig::default(),
    )
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn observation_resets_age(ticks in proptest::collection::vec(0.0..5.0f32, 1..20)) {
        let mut memory = store();
        let enemy = EntitySnapshot::new(EntityId::from_raw(1), Location::default());
        memory.observe(&enemy);
        for dt in ticks {
            memory.tick(dt);
            memory.observe(&enemy);
            let record = memory.record(enemy.entity);
            prop_assert!(record.is_some_and(|r| r.time_since_perceived == 0.0));
        }
    }

    #[test]
    fn age_never_decreases_without_sighting(ticks in proptest::collection::vec(0.0..5.0f32, 1..10)) {
        let mut memory = store();
        let enemy = EntitySnapshot::new(EntityId::from_raw(1), Location::default());
        memory.observe(&enemy);
        let mut last = 0.0f32;
        for dt in ticks {
            memory.tick(dt);
            let Some(record) = memory.record(enemy.entity) else { break };
            prop_assert!(record.time_since_perceived >= last);
            last = record.time_since_perceived;
        }
    }

    #[test]
    fn capacity_is_never_exceeded(count in 1u128..40) {
        let mut memory = store();
        for raw in 1..=count {
            let outcome = memory.observe(&EntitySnapshot::new(
                EntityId::from_raw(raw),
                Location::new(raw as f32 * 10.0, 0.0, 0.0),
            ));
            prop_assert!(memory.len() <= 10);
            if raw > 10 {
                let replaced = matches!(outcome, ObserveOutcome::Replaced { .. });
                prop_assert!(replaced);
            } else {
                prop_assert_eq!(outcome, ObserveOutcome::Inserted);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn lone_candidate_always_selected(enemy in arb_enemy(1), weights in arb_weights()) {
        let mut memory = store();
        memory.observe(&enemy);
        let selector = TargetSelector::new(weights, SelectionConfig::default());
        let mut threat = ThreatTracker::new(20, &ThreatConfig::default());
        let picked = selector.select_enemy(&memory, &mut threat, &OpenField, SelectionRequest::default());
        prop_assert_eq!(picked, Some(enemy.entity));
    }

    #[test]
    fn power_of_two_weight_scaling_keeps_choice(
        enemies in arb_enemies(),
        weights in arb_weights(),
        exponent in -3i32..4,
    ) {
        let mut memory = store();
        for e in &enemies {
            memory.observe(e);
        }
        let mut threat = ThreatTracker::new(20, &ThreatConfig::default());
        let base = TargetSelector::new(weights, SelectionConfig::default());
        let scaled = TargetSelector::new(weights.scaled(2.0f32.powi(exponent)), SelectionConfig::default());
        let a = base.select_enemy(&memory, &mut threat, &OpenField, SelectionRequest::default());
        let b = scaled.select_enemy(&memory, &mut threat, &OpenField, SelectionRequest::default());
        prop_assert_eq!(a, b);
    }
}

// ---------------------------------------------------------------------------
// Threat
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn at_most_one_forced_engagement_per_window(amounts in proptest::collection::vec(0.0..40.0f32, 1..30)) {
        let mut threat = ThreatTracker::new(20, &ThreatConfig::default());
        let source = EntityId::from_raw(1);
        threat.track(source);
        let mut forced = 0;
        for amount in amounts {
            if threat.register_provocation(source, amount, false, 100.0) == Provocation::ForceEngage {
                forced += 1;
            }
            threat.tick(0.5);
        }
        // At most 30 × 0.5s = 15s elapse, well inside one 30s window.
        prop_assert!(forced <= 1);
    }
}
