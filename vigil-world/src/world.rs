//! The world context: registration, host inputs, team protocol and queries.
//!
//! A [`World`] is created by the host and passed around explicitly; there
//! is no global registry. Everything the host tells the AI goes through a
//! method here, and everything the AI wants goes out as a
//! [`WorldEvent`] in [`World::drain_events`].
//!
//! Host API misuse (unknown ids, double registration, calling a squad
//! method on an entity without the team capability) returns an error.
//! Inside the simulation missing data degrades silently.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use vigil_core::buildings::BuildingRecord;
use vigil_core::combat::CombatState;
use vigil_core::error::{Result, VigilError};
use vigil_core::memory::{EntitySnapshot, ObserveOutcome};
use vigil_core::selection::SelectionRequest;
use vigil_core::squad::{self, FormationSlot, LeaderPick, TeamMembership, TeamRole};
use vigil_core::threat::Provocation;
use vigil_core::types::{EntityId, Location, Rotation};

use crate::components::{Agent, AgentSpawn, AgentTimer, Body, Capabilities};
use crate::config::WorldConfig;
use crate::events::WorldEvent;
use crate::hooks::SpatialQuery;
use crate::systems::{self, Battlefield};

/// Shared simulation state for every agent, actor and structure.
#[derive(Debug)]
pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) bodies: HashMap<EntityId, Body>,
    pub(crate) agents: BTreeMap<EntityId, Agent>,
    pub(crate) teams: HashMap<EntityId, TeamMembership>,
    pub(crate) buildings: HashMap<EntityId, BuildingRecord>,
    pub(crate) dead: HashSet<EntityId>,
    pub(crate) proximity: HashSet<(EntityId, EntityId)>,
    pub(crate) events: Vec<WorldEvent>,
    pub(crate) rng: StdRng,
    pub(crate) elapsed: f64,
}

impl World {
    /// An empty world.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            bodies: HashMap::new(),
            agents: BTreeMap::new(),
            teams: HashMap::new(),
            buildings: HashMap::new(),
            dead: HashSet::new(),
            proximity: HashSet::new(),
            events: Vec::new(),
            rng,
            elapsed: 0.0,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Seconds simulated so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register an AI-driven NPC.
    ///
    /// # Errors
    /// `DuplicateEntity` if `id` is already registered.
    pub fn spawn_agent(&mut self, id: EntityId, spawn: AgentSpawn) -> Result<()> {
        self.ensure_unregistered(id)?;
        let agent = Agent::new(id, &spawn, &self.config.ai, self.config.seed);
        if spawn.joins_teams {
            let mut membership = TeamMembership::new(id, spawn.role);
            membership.set_position(spawn.body.location);
            self.teams.insert(id, membership);
        }
        self.bodies.insert(id, spawn.body);
        self.agents.insert(id, agent);
        info!(agent = %id, role = ?spawn.role, faction = %spawn.body.faction, "Agent spawned");
        Ok(())
    }

    /// Register a non-AI actor such as a player character.
    ///
    /// # Errors
    /// `DuplicateEntity` if `id` is already registered.
    pub fn register_actor(&mut self, id: EntityId, body: Body) -> Result<()> {
        self.ensure_unregistered(id)?;
        self.bodies.insert(id, body);
        info!(actor = %id, faction = %body.faction, "Actor registered");
        Ok(())
    }

    /// Register a structure.
    ///
    /// # Errors
    /// `DuplicateEntity` if the id is already registered.
    pub fn register_building(&mut self, record: BuildingRecord) -> Result<()> {
        self.ensure_unregistered(record.building)?;
        self.buildings.insert(record.building, record);
        info!(building = %record.building, material = ?record.material, "Building registered");
        Ok(())
    }

    fn ensure_unregistered(&self, id: EntityId) -> Result<()> {
        if self.bodies.contains_key(&id) || self.buildings.contains_key(&id) {
            warn!(entity = %id, "Duplicate registration rejected");
            return Err(VigilError::DuplicateEntity(id));
        }
        Ok(())
    }

    /// Capabilities of a registered actor.
    #[must_use]
    pub fn capabilities(&self, id: EntityId) -> Option<Capabilities> {
        match self.agents.get(&id) {
            Some(agent) => Some(agent.capabilities()),
            None => self.bodies.contains_key(&id).then(Capabilities::default),
        }
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// Physical state of an actor.
    #[must_use]
    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Mutable physical state, for the host to keep current.
    ///
    /// # Errors
    /// `EntityNotFound` for unknown ids.
    pub fn body_mut(&mut self, id: EntityId) -> Result<&mut Body> {
        self.bodies.get_mut(&id).ok_or(VigilError::EntityNotFound(id))
    }

    /// AI state of an agent.
    #[must_use]
    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Every agent id, in stable order.
    pub fn agent_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.agents.keys().copied()
    }

    /// Squad membership of an agent.
    #[must_use]
    pub fn membership(&self, id: EntityId) -> Option<&TeamMembership> {
        self.teams.get(&id)
    }

    /// A registered structure.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&BuildingRecord> {
        self.buildings.get(&id)
    }

    /// The agent's current combat target.
    #[must_use]
    pub fn current_target(&self, agent: EntityId) -> Option<EntityId> {
        self.agents.get(&agent).and_then(|a| a.combat.target())
    }

    /// The agent's engagement state.
    #[must_use]
    pub fn combat_state(&self, agent: EntityId) -> Option<CombatState> {
        self.agents.get(&agent).map(|a| a.combat.state())
    }

    /// Events produced since the last drain.
    #[must_use]
    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    /// Take every pending event.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    fn agent_checked(&self, id: EntityId) -> Result<&Agent> {
        match self.agents.get(&id) {
            Some(agent) => Ok(agent),
            None if self.bodies.contains_key(&id) => Err(VigilError::MissingCapability {
                entity: id,
                capability: "memory",
            }),
            None => Err(VigilError::EntityNotFound(id)),
        }
    }

    // -----------------------------------------------------------------------
    // Perception
    // -----------------------------------------------------------------------

    /// Tell `agent` which actors it can see this tick.
    ///
    /// Duplicates, stale ids, the agent itself, the dead and non-hostiles
    /// are ignored; an empty list marks every record unperceived.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` if `agent` is not an agent.
    pub fn report_visible_actors(&mut self, agent: EntityId, visible: &[EntityId]) -> Result<()> {
        self.agent_checked(agent)?;
        let Some(own) = self.bodies.get(&agent).copied() else {
            return Err(VigilError::EntityNotFound(agent));
        };
        if !own.is_alive() {
            return Ok(());
        }

        let mut hostiles: Vec<EntityId> = Vec::with_capacity(visible.len());
        for &other in visible {
            if other == agent || hostiles.contains(&other) {
                continue;
            }
            let Some(body) = self.bodies.get(&other) else { continue };
            if body.is_alive() && body.faction.is_hostile_to(own.faction) {
                hostiles.push(other);
            }
        }

        // Flags first, so a full memory evicts what is out of sight now.
        if let Some(a) = self.agents.get_mut(&agent) {
            a.memory.mark_perception(&hostiles);
        }
        for &other in &hostiles {
            if let Some(snapshot) = self.snapshot_for(agent, other) {
                self.record_hostile(agent, &snapshot, true);
            }
        }
        Ok(())
    }

    /// Tell `agent` about a structure it has come across.
    ///
    /// # Errors
    /// `EntityNotFound` for unknown ids, `MissingCapability` if the agent
    /// has no building memory.
    pub fn notify_building_discovered(&mut self, agent: EntityId, building: EntityId) -> Result<bool> {
        let record = *self.buildings.get(&building).ok_or(VigilError::EntityNotFound(building))?;
        self.agent_checked(agent)?;
        let memory = self
            .agents
            .get_mut(&agent)
            .and_then(|a| a.buildings.as_mut())
            .ok_or(VigilError::MissingCapability { entity: agent, capability: "building" })?;
        Ok(memory.discover(record))
    }

    /// Snapshot of `other` as handed to `requester`, tethering if `other` is an agent.
    pub(crate) fn snapshot_for(&mut self, requester: EntityId, other: EntityId) -> Option<EntitySnapshot> {
        let snapshot = self.bodies.get(&other)?.snapshot(other);
        let requester_alive = self.bodies.get(&requester).is_some_and(Body::is_alive);
        match self.agents.get_mut(&other) {
            Some(source) => {
                source.memory.update_own_snapshot(snapshot);
                Some(source.memory.get(requester, requester_alive))
            }
            None => Some(snapshot),
        }
    }

    /// Write a hostile into `observer`'s memory and threat table.
    pub(crate) fn record_hostile(
        &mut self,
        observer: EntityId,
        snapshot: &EntitySnapshot,
        perceived: bool,
    ) -> ObserveOutcome {
        let (delay_min, delay_max) = (
            self.config.ai.memory.combat_entry_delay_min_secs,
            self.config.ai.memory.combat_entry_delay_max_secs,
        );
        let Some(agent) = self.agents.get_mut(&observer) else {
            return ObserveOutcome::Ignored;
        };

        let outcome = if perceived {
            agent.memory.observe(snapshot)
        } else {
            agent.memory.remember(snapshot)
        };
        if outcome == ObserveOutcome::Ignored {
            return outcome;
        }
        agent.threat.track(snapshot.entity);

        let evicted = outcome.evicted();
        if let Some(evicted) = evicted {
            agent.threat.forget(evicted);
            let before = agent.combat.state();
            agent.combat.on_target_lost(evicted);
            systems::emit(&mut self.events, observer, before, agent.combat.state(), Vec::new());
        }

        if outcome.is_new() && !agent.in_combat_mode && agent.combat_entry.is_none() {
            let delay = if delay_max > delay_min {
                agent.rng.gen_range(delay_min..=delay_max)
            } else {
                delay_min
            };
            agent.combat_entry = Some(agent.timers.schedule(delay, AgentTimer::EnterCombatMode));
            debug!(agent = %observer, first = %snapshot.entity, delay, "Combat mode entry scheduled");
        }

        if let Some(evicted) = evicted {
            if let Some(source) = self.agents.get_mut(&evicted) {
                source.memory.untether(observer);
            }
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Provocation
    // -----------------------------------------------------------------------

    /// `source` hit `agent` for `amount`.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` if `agent` is not an agent.
    pub fn notify_damaged(&mut self, agent: EntityId, source: EntityId, amount: f32) -> Result<Provocation> {
        self.provoke(agent, source, amount, true)
    }

    /// `source` provoked `agent` without dealing damage (taunts, threat abilities).
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` if `agent` is not an agent.
    pub fn notify_aggro(&mut self, agent: EntityId, source: EntityId, amount: f32) -> Result<Provocation> {
        self.provoke(agent, source, amount, false)
    }

    fn provoke(&mut self, agent_id: EntityId, source: EntityId, amount: f32, dealt: bool) -> Result<Provocation> {
        self.agent_checked(agent_id)?;
        let Some(own) = self.bodies.get(&agent_id).copied() else {
            return Err(VigilError::EntityNotFound(agent_id));
        };
        if !own.is_alive() || source == agent_id {
            return Ok(Provocation::Suppressed);
        }

        let mut outcome = self.register(agent_id, source, amount, dealt, own.max_health);
        if outcome == Provocation::UnknownSource {
            // Populate memory from the source, then deliver the provocation again.
            let hostile = self
                .bodies
                .get(&source)
                .is_some_and(|b| b.is_alive() && b.faction.is_hostile_to(own.faction));
            let Some(snapshot) = hostile.then(|| self.snapshot_for(agent_id, source)).flatten() else {
                debug!(agent = %agent_id, source = %source, "Provocation from unresolvable source dropped");
                return Ok(Provocation::UnknownSource);
            };
            self.record_hostile(agent_id, &snapshot, false);
            outcome = self.register(agent_id, source, amount, dealt, own.max_health);
        }

        let attackers = systems::attackers_by_target(&self.agents);
        let Some(agent) = self.agents.get_mut(&agent_id) else {
            return Ok(outcome);
        };
        let before = agent.combat.state();
        let intents = match outcome {
            Provocation::ForceEngage => {
                let field = Battlefield { bodies: &self.bodies, attackers: &attackers, me: agent_id };
                let target = agent
                    .selector
                    .select_enemy(&agent.memory, &mut agent.threat, &field, SelectionRequest::default())
                    .unwrap_or(source);
                info!(agent = %agent_id, target = %target, "Forced engagement");
                agent.combat.force_engage(target)
            }
            Provocation::Recorded
                if dealt && agent.combat.state() == CombatState::Idle && agent.combat.target().is_none() =>
            {
                debug!(agent = %agent_id, source = %source, "Retaliating");
                agent.combat.force_engage(source)
            }
            _ => Vec::new(),
        };
        systems::emit(&mut self.events, agent_id, before, agent.combat.state(), intents);
        Ok(outcome)
    }

    fn register(&mut self, agent: EntityId, source: EntityId, amount: f32, dealt: bool, max_health: f32) -> Provocation {
        self.agents
            .get_mut(&agent)
            .map_or(Provocation::UnknownSource, |a| {
                a.threat.register_provocation(source, amount, dealt, max_health)
            })
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        systems::run(self, dt);
        self.elapsed += f64::from(dt);
    }

    // -----------------------------------------------------------------------
    // Death & removal
    // -----------------------------------------------------------------------

    /// Kill an actor and purge it from every agent.
    ///
    /// # Errors
    /// `EntityNotFound` for unknown ids.
    pub fn kill(&mut self, entity: EntityId) -> Result<()> {
        let body = self.bodies.get_mut(&entity).ok_or(VigilError::EntityNotFound(entity))?;
        body.health = 0.0;
        self.purge(entity);
        Ok(())
    }

    /// Remove an actor or structure from the world entirely.
    ///
    /// # Errors
    /// `EntityNotFound` for unknown ids.
    pub fn remove_entity(&mut self, entity: EntityId) -> Result<()> {
        if self.buildings.contains_key(&entity) {
            return self.destroy_building(entity);
        }
        if !self.bodies.contains_key(&entity) {
            return Err(VigilError::EntityNotFound(entity));
        }
        self.purge(entity);
        self.bodies.remove(&entity);
        self.agents.remove(&entity);
        self.teams.remove(&entity);
        self.dead.remove(&entity);
        info!(entity = %entity, "Entity removed");
        Ok(())
    }

    /// Forget `entity` everywhere: memories, tethers, threat, targets and squads.
    pub(crate) fn purge(&mut self, entity: EntityId) {
        if !self.dead.insert(entity) {
            return;
        }
        squad::leave(&mut self.teams, entity);
        self.proximity.retain(|(a, b)| *a != entity && *b != entity);

        if let Some(agent) = self.agents.get_mut(&entity) {
            let before = agent.combat.state();
            agent.memory.clear();
            agent.threat.clear();
            agent.combat.reset();
            agent.timers.clear();
            agent.combat_entry = None;
            agent.in_combat_mode = false;
            agent.static_target = None;
            systems::emit(&mut self.events, entity, before, CombatState::Idle, Vec::new());
        }

        for (&id, agent) in &mut self.agents {
            if id == entity {
                continue;
            }
            let before = agent.combat.state();
            let remembered = agent.memory.forget(entity).is_some();
            agent.memory.untether(entity);
            agent.threat.forget(entity);
            agent.combat.on_target_lost(entity);
            if remembered {
                self.events.push(WorldEvent::EnemyDead { agent: id, enemy: entity });
            }
            systems::emit(&mut self.events, id, before, agent.combat.state(), Vec::new());
            systems::settle_combat_mode(id, agent, &mut self.events);
        }
        info!(entity = %entity, "Entity purged from every agent");
    }

    // -----------------------------------------------------------------------
    // Structures
    // -----------------------------------------------------------------------

    /// Update a structure's health.
    ///
    /// # Errors
    /// `EntityNotFound` for unknown ids.
    pub fn set_building_health(&mut self, building: EntityId, health: f32) -> Result<()> {
        let record = self.buildings.get_mut(&building).ok_or(VigilError::EntityNotFound(building))?;
        record.health = health.max(0.0);
        Ok(())
    }

    /// Remove a destroyed structure from the world and every agent's memory.
    ///
    /// # Errors
    /// `EntityNotFound` for unknown ids.
    pub fn destroy_building(&mut self, building: EntityId) -> Result<()> {
        self.buildings.remove(&building).ok_or(VigilError::EntityNotFound(building))?;
        for agent in self.agents.values_mut() {
            if let Some(memory) = agent.buildings.as_mut() {
                memory.remove(building);
            }
            if agent.static_target == Some(building) {
                agent.static_target = None;
            }
        }
        info!(building = %building, "Building destroyed");
        Ok(())
    }

    /// Sweep rays across a cone centred on the home direction, recording
    /// every structure and hostile hit. Returns the number of distinct hits.
    ///
    /// A cone outside `[10, 180]` degrees is logged and ignored.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` if `agent` is not an agent.
    pub fn scan_static_targets(
        &mut self,
        agent: EntityId,
        cone_degrees: f32,
        space: &impl SpatialQuery,
    ) -> Result<usize> {
        let home = self.agent_checked(agent)?.home;
        let own = *self.bodies.get(&agent).ok_or(VigilError::EntityNotFound(agent))?;
        if !(10.0..=180.0).contains(&cone_degrees) {
            warn!(agent = %agent, cone = cone_degrees, "Scan cone outside [10, 180] degrees, ignoring");
            return Ok(0);
        }

        let centre = match home {
            Some(home) if home.distance(&own.location) > f32::EPSILON => {
                Rotation::looking_at(&own.location, &home).yaw
            }
            _ => own.rotation.yaw,
        };
        let step = self.config.scan_step_degrees;
        let range = self.config.scan_range;
        let rays = (cone_degrees / step).floor() as u32;

        let mut hits: Vec<EntityId> = Vec::new();
        for i in 0..=rays {
            let yaw = centre - cone_degrees / 2.0 + i as f32 * step;
            if let Some(hit) = space.cast_ray(&own.location, yaw, range) {
                if hit != agent && !hits.contains(&hit) {
                    hits.push(hit);
                }
            }
        }

        for &hit in &hits {
            if let Some(record) = self.buildings.get(&hit).copied() {
                if let Some(memory) = self.agents.get_mut(&agent).and_then(|a| a.buildings.as_mut()) {
                    memory.discover(record);
                }
                continue;
            }
            let hostile = self
                .bodies
                .get(&hit)
                .is_some_and(|b| b.is_alive() && b.faction.is_hostile_to(own.faction));
            if hostile {
                if let Some(snapshot) = self.snapshot_for(agent, hit) {
                    self.record_hostile(agent, &snapshot, true);
                }
            }
        }
        debug!(agent = %agent, cone = cone_degrees, rays = rays + 1, hits = hits.len(), "Static target scan");
        Ok(hits.len())
    }

    /// Choose the structure `agent` should attack and remember the choice.
    ///
    /// # Errors
    /// `MissingCapability` if the agent has no building memory.
    pub fn select_static_target(&mut self, agent: EntityId) -> Result<Option<EntityId>> {
        self.agent_checked(agent)?;
        let from = self.bodies.get(&agent).map(|b| b.location).unwrap_or_default();
        let Some(a) = self.agents.get_mut(&agent) else {
            return Err(VigilError::EntityNotFound(agent));
        };
        let memory = a
            .buildings
            .as_ref()
            .ok_or(VigilError::MissingCapability { entity: agent, capability: "building" })?;
        let choice = a.selector.select_building(memory, &from, None);
        a.static_target = choice;
        debug!(agent = %agent, building = ?choice, "Static target selected");
        Ok(choice)
    }

    // -----------------------------------------------------------------------
    // Squads
    // -----------------------------------------------------------------------

    fn team_checked(&self, id: EntityId) -> Result<()> {
        if !self.bodies.contains_key(&id) {
            return Err(VigilError::EntityNotFound(id));
        }
        if !self.teams.contains_key(&id) {
            return Err(VigilError::MissingCapability { entity: id, capability: "team" });
        }
        Ok(())
    }

    /// Merge `a`'s and `b`'s teams. Returns whether any link was new.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless both can join teams.
    pub fn join(&mut self, a: EntityId, b: EntityId) -> Result<bool> {
        self.team_checked(a)?;
        self.team_checked(b)?;
        let linked = squad::join(&mut self.teams, a, b);
        if linked {
            self.introduce_teammates(a);
        }
        Ok(linked)
    }

    /// Give every member of `a`'s team a current snapshot of every other member.
    fn introduce_teammates(&mut self, a: EntityId) {
        let mut members = self.teams.get(&a).map(|m| m.roster().to_vec()).unwrap_or_default();
        members.push(a);
        let snapshots: Vec<EntitySnapshot> = members
            .iter()
            .filter_map(|&m| self.bodies.get(&m).map(|b| b.snapshot(m)))
            .collect();
        for &member in &members {
            if let Some(membership) = self.teams.get_mut(&member) {
                for snapshot in &snapshots {
                    membership.update_teammate(*snapshot);
                }
            }
        }
    }

    /// Reassign `a`'s team role and the combat profile that goes with it.
    ///
    /// Leadership is left as it is; eligibility only matters at election.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless `a` is a team-capable agent.
    pub fn set_role(&mut self, a: EntityId, role: TeamRole) -> Result<()> {
        self.team_checked(a)?;
        self.agent_checked(a)?;
        if let Some(membership) = self.teams.get_mut(&a) {
            membership.set_role(role);
        }
        if let Some(agent) = self.agents.get_mut(&a) {
            agent.combat.set_role(role);
        }
        info!(agent = %a, role = ?role, "Team role changed");
        Ok(())
    }

    /// Remove `a` from its team.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless `a` can join teams.
    pub fn leave(&mut self, a: EntityId) -> Result<()> {
        self.team_checked(a)?;
        squad::leave(&mut self.teams, a);
        Ok(())
    }

    /// Break the link between `a` and `b` only.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless both can join teams.
    pub fn remove_teammate(&mut self, a: EntityId, b: EntityId) -> Result<bool> {
        self.team_checked(a)?;
        self.team_checked(b)?;
        Ok(squad::remove_teammate(&mut self.teams, a, b))
    }

    /// Hand every enemy `a` remembers to each teammate. Teammates get a fresh
    /// snapshot from the enemy itself and, for agents, a tether to it.
    /// Returns the number of records delivered.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless `a` is a team-capable agent.
    pub fn share_data(&mut self, a: EntityId) -> Result<usize> {
        self.team_checked(a)?;
        let enemies: Vec<EntityId> = self.agent_checked(a)?.memory.records().iter().map(|r| r.entity).collect();
        let roster = self.teams.get(&a).map(|m| m.roster().to_vec()).unwrap_or_default();

        let mut delivered = 0;
        for mate in roster {
            let Some(faction) = self.bodies.get(&mate).map(|b| b.faction) else { continue };
            for &enemy in &enemies {
                let hostile = enemy != mate
                    && self
                        .bodies
                        .get(&enemy)
                        .is_some_and(|b| b.is_alive() && b.faction.is_hostile_to(faction));
                if !hostile || !self.agents.contains_key(&mate) {
                    continue;
                }
                let Some(snapshot) = self.snapshot_for(mate, enemy) else { continue };
                if self.record_hostile(mate, &snapshot, false) != ObserveOutcome::Ignored {
                    delivered += 1;
                }
            }
        }
        debug!(agent = %a, records = enemies.len(), delivered, "Shared memory with team");
        Ok(delivered)
    }

    /// Leader-only formation pass.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless `leader` can join teams.
    pub fn assign_formation(&mut self, leader: EntityId) -> Result<Vec<(EntityId, FormationSlot)>> {
        self.team_checked(leader)?;
        Ok(squad::assign_formation_slots(&mut self.teams, leader))
    }

    /// Make the caller, or a random teammate, leader of `a`'s team.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless `a` can join teams.
    pub fn set_leader(&mut self, a: EntityId, override_existing: bool, pick: LeaderPick) -> Result<Option<EntityId>> {
        self.team_checked(a)?;
        Ok(squad::set_leader(&mut self.teams, a, override_existing, pick, &mut self.rng))
    }

    /// Leader of `a`'s team.
    #[must_use]
    pub fn leader_of(&self, a: EntityId) -> Option<EntityId> {
        squad::leader_of(&self.teams, a)
    }

    /// Whether `a`'s team has a leader.
    #[must_use]
    pub fn team_has_leader(&self, a: EntityId) -> bool {
        squad::team_has_leader(&self.teams, a)
    }

    /// Teammate of `a` (optionally `a` itself) last seen nearest `point`.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless `a` can join teams.
    pub fn nearest_teammate_to(&self, a: EntityId, point: &Location, include_self: bool) -> Result<Option<EntityId>> {
        self.team_checked(a)?;
        Ok(squad::nearest_teammate_to(&self.teams, a, point, include_self))
    }

    /// Sum of teammates' last-known health.
    ///
    /// # Errors
    /// `EntityNotFound` / `MissingCapability` unless `a` can join teams.
    pub fn team_health(&self, a: EntityId) -> Result<f32> {
        self.team_checked(a)?;
        Ok(squad::team_health(&self.teams, a))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}
