//! Per-tick systems, run in order by [`crate::world::World::step`].
//!
//! ## Step order
//!
//! | # | System             | Frequency             |
//! |---|--------------------|-----------------------|
//! | 1 | Reap the dead      | Every step            |
//! | 2 | Own snapshots      | Every step            |
//! | 3 | Memory decay       | Every step            |
//! | 4 | Tether sync        | Every 0.5 s per agent |
//! | 5 | Agent timers       | Every step            |
//! | 6 | Threat decay       | Every 1 s (internal)  |
//! | 7 | Combat evaluation  | Every 1 s per agent   |
//!
//! Memory decay and tether propagation always run before selection, so the
//! selector never sees a record that should already be gone.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use vigil_core::combat::{CombatContext, CombatState, Intent, TargetView};
use vigil_core::selection::{SelectionRequest, Surroundings};
use vigil_core::squad::TeamMembership;
use vigil_core::types::{EntityId, facing_alignment};

use crate::components::{Agent, AgentTimer, Body};
use crate::events::WorldEvent;
use crate::world::World;

// ---------------------------------------------------------------------------
// Selection view
// ---------------------------------------------------------------------------

/// What one agent's selector sees of the world.
pub(crate) struct Battlefield<'a> {
    pub bodies: &'a HashMap<EntityId, Body>,
    pub attackers: &'a HashMap<EntityId, Vec<EntityId>>,
    pub me: EntityId,
}

impl Surroundings for Battlefield<'_> {
    fn is_present(&self, entity: EntityId) -> bool {
        self.bodies.get(&entity).is_some_and(Body::is_alive)
    }

    fn attackers_of(&self, entity: EntityId) -> u32 {
        self.attackers
            .get(&entity)
            .map_or(0, |who| who.iter().filter(|a| **a != self.me).count() as u32)
    }
}

/// Agents currently fighting each target.
pub(crate) fn attackers_by_target(agents: &BTreeMap<EntityId, Agent>) -> HashMap<EntityId, Vec<EntityId>> {
    let mut by_target: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
    for (&id, agent) in agents {
        let fighting = matches!(
            agent.combat.state(),
            CombatState::Engaging | CombatState::Attacking | CombatState::Blocking
        );
        if let (true, Some(target)) = (fighting, agent.combat.target()) {
            by_target.entry(target).or_default().push(id);
        }
    }
    by_target
}

// ---------------------------------------------------------------------------
// Event helpers
// ---------------------------------------------------------------------------

/// Push a state-change event (if the state moved) followed by `intents`.
pub(crate) fn emit(
    events: &mut Vec<WorldEvent>,
    agent: EntityId,
    from: CombatState,
    to: CombatState,
    intents: Vec<Intent>,
) {
    if from != to {
        events.push(WorldEvent::StateChanged { agent, from, to });
    }
    events.extend(intents.into_iter().map(|intent| WorldEvent::Intent { agent, intent }));
}

/// Drop combat posture once memory holds no hostiles.
pub(crate) fn settle_combat_mode(id: EntityId, agent: &mut Agent, events: &mut Vec<WorldEvent>) {
    if !agent.memory.is_empty() {
        return;
    }
    if let Some(handle) = agent.combat_entry.take() {
        agent.timers.cancel(handle);
    }
    if agent.in_combat_mode {
        agent.in_combat_mode = false;
        events.push(WorldEvent::CombatModeLeft { agent: id });
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// Run every system once.
pub(crate) fn run(world: &mut World, dt: f32) {
    reap_dead(world);
    refresh_own_snapshots(world);
    let sync_due = tick_memories(world, dt);
    sync_tethers(world, &sync_due);
    run_agent_timers(world, dt);
    tick_threat(world, dt);
    evaluate_combat(world, dt);
}

/// Purge anything whose body died since the last step.
fn reap_dead(world: &mut World) {
    let newly_dead: Vec<EntityId> = world
        .bodies
        .iter()
        .filter(|&(id, body)| !body.is_alive() && !world.dead.contains(id))
        .map(|(&id, _)| id)
        .collect();
    for id in newly_dead {
        debug!(entity = %id, "Reaping dead entity");
        world.purge(id);
    }
}

fn refresh_own_snapshots(world: &mut World) {
    for (&id, agent) in &mut world.agents {
        let Some(body) = world.bodies.get(&id) else { continue };
        agent.memory.update_own_snapshot(body.snapshot(id));
        if let Some(membership) = world.teams.get_mut(&id) {
            membership.set_position(body.location);
        }
    }
}

/// Age memories; returns the agents whose tether sync is due.
fn tick_memories(world: &mut World, dt: f32) -> Vec<EntityId> {
    let mut due = Vec::new();
    let mut untether: Vec<(EntityId, EntityId)> = Vec::new();

    for (&id, agent) in &mut world.agents {
        if world.dead.contains(&id) {
            continue;
        }
        let tick = agent.memory.tick(dt);
        let before = agent.combat.state();
        for &gone in &tick.forgotten {
            agent.threat.forget(gone);
            agent.combat.on_target_lost(gone);
            untether.push((gone, id));
        }
        emit(&mut world.events, id, before, agent.combat.state(), Vec::new());
        if !tick.forgotten.is_empty() {
            settle_combat_mode(id, agent, &mut world.events);
        }
        if tick.sync_due {
            due.push(id);
        }
    }

    for (source, subscriber) in untether {
        if let Some(agent) = world.agents.get_mut(&source) {
            agent.memory.untether(subscriber);
        }
    }
    due
}

/// Push each due agent's snapshot to its tethered subscribers and teammates.
fn sync_tethers(world: &mut World, due: &[EntityId]) {
    for &source in due {
        let Some(agent) = world.agents.get(&source) else { continue };
        let snapshot = *agent.memory.own_snapshot();
        let subscribers: Vec<(EntityId, bool)> = agent
            .memory
            .tethers()
            .iter()
            .map(|&s| (s, world.bodies.get(&s).is_some_and(|b| agent.memory.is_nearby(&b.location))))
            .collect();

        let mut stale = Vec::new();
        let mut near = Vec::new();
        for (subscriber, close) in subscribers {
            let refreshed = world
                .agents
                .get_mut(&subscriber)
                .is_some_and(|a| a.memory.refresh_from_tether(&snapshot));
            if refreshed {
                near.push((subscriber, close));
            } else {
                stale.push(subscriber);
            }
        }

        if let Some(agent) = world.agents.get_mut(&source) {
            for subscriber in stale {
                agent.memory.untether(subscriber);
            }
        }

        for (subscriber, close) in near {
            let key = if source < subscriber { (source, subscriber) } else { (subscriber, source) };
            if close {
                if world.proximity.insert(key) {
                    world.events.push(WorldEvent::Nearby { agent: subscriber, other: source });
                    world.events.push(WorldEvent::Nearby { agent: source, other: subscriber });
                }
            } else {
                world.proximity.remove(&key);
            }
        }

        let roster = world
            .teams
            .get(&source)
            .map(|m| m.roster().to_vec())
            .unwrap_or_default();
        for mate in roster {
            if let Some(membership) = world.teams.get_mut(&mate) {
                membership.update_teammate(snapshot);
            }
        }
    }
}

fn run_agent_timers(world: &mut World, dt: f32) {
    for (&id, agent) in &mut world.agents {
        for (handle, timer) in agent.timers.advance(dt) {
            match timer {
                AgentTimer::EnterCombatMode if agent.combat_entry == Some(handle) => {
                    agent.combat_entry = None;
                    if !agent.memory.is_empty() && !agent.in_combat_mode {
                        agent.in_combat_mode = true;
                        debug!(agent = %id, "Entered combat mode");
                        world.events.push(WorldEvent::CombatModeEntered { agent: id });
                    }
                }
                AgentTimer::EnterCombatMode => {}
            }
        }
    }
}

fn tick_threat(world: &mut World, dt: f32) {
    for (id, agent) in &mut world.agents {
        if !world.dead.contains(id) {
            agent.threat.tick(dt);
        }
    }
}

fn evaluate_combat(world: &mut World, dt: f32) {
    let attackers = attackers_by_target(&world.agents);

    for (&id, agent) in &mut world.agents {
        if world.dead.contains(&id) {
            continue;
        }
        let before = agent.combat.state();
        if !agent.combat.advance(dt) {
            emit(&mut world.events, id, before, agent.combat.state(), Vec::new());
            continue;
        }
        let Some(own) = world.bodies.get(&id) else { continue };

        let field = Battlefield { bodies: &world.bodies, attackers: &attackers, me: id };
        let candidate = if agent.combat.wants_candidate() {
            agent
                .selector
                .select_enemy(&agent.memory, &mut agent.threat, &field, SelectionRequest::default())
        } else {
            None
        };
        let target = agent
            .combat
            .target()
            .and_then(|t| target_view(agent, &world.bodies, own, t));

        let ctx = CombatContext {
            candidate,
            target,
            home_distance: agent.home.map(|h| h.distance(&own.location)),
            health_fraction: own.health_fraction(),
            alive: own.is_alive(),
            formation: world.teams.get(&id).and_then(TeamMembership::slot),
        };
        let intents = agent.combat.evaluate(&ctx, &mut agent.rng);
        emit(&mut world.events, id, before, agent.combat.state(), intents);
    }
}

/// The target as the agent knows it: position from memory, motion only if in sight.
fn target_view(agent: &Agent, bodies: &HashMap<EntityId, Body>, own: &Body, target: EntityId) -> Option<TargetView> {
    let record = agent.memory.record(target).filter(|r| r.is_alive())?;
    let body = bodies.get(&target).filter(|b| b.is_alive())?;
    let in_sight = record.is_currently_perceived;
    Some(TargetView {
        entity: target,
        distance: record.last_seen_location.distance(&own.location),
        is_attacking: in_sight && body.is_attacking,
        is_blocking: in_sight && body.is_blocking,
        facing_alignment: facing_alignment(&record.last_seen_rotation, &record.last_seen_location, &own.location),
    })
}
