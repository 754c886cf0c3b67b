//! VIGIL Benchmark Suite
//!
//! Per-NPC budgets the AI must stay inside:
//!   select_enemy_full_memory ........ < 5μs
//!   memory_tick_full_memory ......... < 2μs
//!   world_step_40_agents ............ < 1ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vigil_core::config::{MemoryConfig, SelectionConfig, ThreatConfig};
use vigil_core::memory::{EntitySnapshot, MemoryStore};
use vigil_core::selection::{Personality, SelectionRequest, Surroundings, TargetSelector};
use vigil_core::squad::TeamRole;
use vigil_core::threat::ThreatTracker;
use vigil_core::types::{EntityId, Faction, Location, Rotation};
use vigil_world::{AgentSpawn, Body, World};

struct OpenField;

impl Surroundings for OpenField {
    fn is_present(&self, _entity: EntityId) -> bool {
        true
    }

    fn attackers_of(&self, entity: EntityId) -> u32 {
        (entity.0.as_u128() % 3) as u32
    }
}

fn full_memory() -> MemoryStore {
    let config = MemoryConfig::default();
    let mut memory = MemoryStore::new(EntitySnapshot::new(EntityId::from_raw(0), Location::default()), &config);
    for i in 1..=config.capacity as u128 {
        let snapshot = EntitySnapshot::new(EntityId::from_raw(i), Location::new(i as f32 * 37.0, 0.0, 0.0))
            .with_health((i as f32 * 13.0) % 100.0 + 1.0, 100.0)
            .with_rotation(Rotation::from_yaw(i as f32 * 30.0));
        memory.observe(&snapshot);
    }
    memory
}

/// Benchmark: one enemy choice over a full memory (target: < 5μs).
fn bench_select_enemy(c: &mut Criterion) {
    let memory = full_memory();
    let selector = TargetSelector::new(Personality::Goblin.weights(), SelectionConfig::default());
    let mut threat = ThreatTracker::new(20, &ThreatConfig::default());
    for record in memory.records() {
        threat.track(record.entity);
    }

    c.bench_function("select_enemy_full_memory", |b| {
        b.iter(|| {
            let choice = selector.select_enemy(
                black_box(&memory),
                &mut threat,
                &OpenField,
                SelectionRequest::default(),
            );
            black_box(choice);
        });
    });
}

/// Benchmark: one aging pass over a full memory (target: < 2μs).
fn bench_memory_tick(c: &mut Criterion) {
    c.bench_function("memory_tick_full_memory", |b| {
        b.iter_batched(
            full_memory,
            |mut memory| {
                let tick = memory.tick(black_box(0.1));
                black_box(tick);
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

/// Benchmark: a full world step with two opposing warbands (target: < 1ms).
fn bench_world_step(c: &mut Criterion) {
    let mut world = World::default();
    let mut orcs = Vec::new();
    let mut humans = Vec::new();
    for i in 0..40u128 {
        let (faction, x, side) = if i % 2 == 0 {
            (Faction(1), 0.0, &mut orcs)
        } else {
            (Faction(2), 600.0, &mut humans)
        };
        let id = EntityId::from_raw(i + 1);
        let body = Body::new(faction, Location::new(x, i as f32 * 20.0, 0.0));
        let role = if i % 4 < 2 { TeamRole::AttackMelee1h } else { TeamRole::AttackRanged };
        if world.spawn_agent(id, AgentSpawn::new(body, Personality::Balanced, role)).is_ok() {
            side.push(id);
        }
    }
    for &orc in &orcs {
        let _ = world.report_visible_actors(orc, &humans);
    }
    for &human in &humans {
        let _ = world.report_visible_actors(human, &orcs);
    }

    c.bench_function("world_step_40_agents", |b| {
        b.iter(|| {
            world.step(black_box(0.1));
            black_box(world.drain_events());
        });
    });
}

criterion_group!(benches, bench_select_enemy, bench_memory_tick, bench_world_step);
criterion_main!(benches);
