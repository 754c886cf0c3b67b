//! Per-entity state held by the world.
//!
//! A [`Body`] is the host-owned physical state of any actor. An [`Agent`]
//! is the AI bundle attached to NPCs: memory, threat, selector and combat
//! machine, plus the optional capabilities resolved at spawn.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use vigil_core::buildings::BuildingMemory;
use vigil_core::combat::{CombatMachine, CombatState};
use vigil_core::config::VigilConfig;
use vigil_core::memory::{EntitySnapshot, MemoryStore};
use vigil_core::schedule::{Scheduler, TimerHandle};
use vigil_core::selection::{Personality, SelectionWeights, TargetSelector};
use vigil_core::squad::TeamRole;
use vigil_core::threat::ThreatTracker;
use vigil_core::types::{ArmorType, EntityId, Faction, Location, Rotation, WeaponType};

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Physical state the host keeps current.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// World position.
    pub location: Location,
    /// Facing.
    pub rotation: Rotation,
    /// Remaining health; zero or less is dead.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Remaining stamina.
    pub stamina: f32,
    /// Armor category.
    pub armor: ArmorType,
    /// Weapon category.
    pub weapon: WeaponType,
    /// Allegiance.
    pub faction: Faction,
    /// Mid-attack this frame.
    pub is_attacking: bool,
    /// Guarding this frame.
    pub is_blocking: bool,
}

impl Body {
    /// A healthy, idle body at `location`.
    #[must_use]
    pub fn new(faction: Faction, location: Location) -> Self {
        Self {
            location,
            rotation: Rotation::default(),
            health: 100.0,
            max_health: 100.0,
            stamina: 100.0,
            armor: ArmorType::default(),
            weapon: WeaponType::default(),
            faction,
            is_attacking: false,
            is_blocking: false,
        }
    }

    /// Builder: set health.
    #[must_use]
    pub fn with_health(mut self, health: f32, max_health: f32) -> Self {
        self.health = health;
        self.max_health = max_health;
        self
    }

    /// Builder: set facing.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Whether the body is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Remaining health fraction in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// The snapshot others record about this body.
    #[must_use]
    pub fn snapshot(&self, entity: EntityId) -> EntitySnapshot {
        EntitySnapshot::new(entity, self.location)
            .with_health(self.health, self.max_health)
            .with_stamina(self.stamina)
            .with_rotation(self.rotation)
            .with_equipment(self.armor, self.weapon)
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Optional interfaces an entity supports, resolved once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Holds a memory store others can tether to.
    pub memory: bool,
    /// Can join squads.
    pub team: bool,
    /// Remembers and targets structures.
    pub building: bool,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Everything needed to spawn an agent.
#[derive(Debug, Clone)]
pub struct AgentSpawn {
    /// Initial physical state.
    pub body: Body,
    /// Selection weights.
    pub weights: SelectionWeights,
    /// Squad role; also picks the combat profile.
    pub role: TeamRole,
    /// Home anchor for leash scaling and scan orientation.
    pub home: Option<Location>,
    /// Aggro threshold; the configured default when `None`.
    pub aggro_threshold: Option<u32>,
    /// Whether the agent can join squads.
    pub joins_teams: bool,
    /// Whether the agent remembers structures.
    pub remembers_buildings: bool,
}

impl AgentSpawn {
    /// A team-capable agent using a personality preset.
    #[must_use]
    pub fn new(body: Body, personality: Personality, role: TeamRole) -> Self {
        Self {
            body,
            weights: personality.weights(),
            role,
            home: None,
            aggro_threshold: None,
            joins_teams: true,
            remembers_buildings: false,
        }
    }

    /// Builder: set a home anchor.
    #[must_use]
    pub fn with_home(mut self, home: Location) -> Self {
        self.home = Some(home);
        self
    }

    /// Builder: enable building memory.
    #[must_use]
    pub fn with_building_memory(mut self) -> Self {
        self.remembers_buildings = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AgentTimer {
    EnterCombatMode,
}

/// AI state attached to one NPC.
#[derive(Debug)]
pub struct Agent {
    pub(crate) id: EntityId,
    pub(crate) capabilities: Capabilities,
    pub(crate) memory: MemoryStore,
    pub(crate) threat: ThreatTracker,
    pub(crate) selector: TargetSelector,
    pub(crate) combat: CombatMachine,
    pub(crate) buildings: Option<BuildingMemory>,
    pub(crate) home: Option<Location>,
    pub(crate) static_target: Option<EntityId>,
    pub(crate) in_combat_mode: bool,
    pub(crate) combat_entry: Option<TimerHandle>,
    pub(crate) timers: Scheduler<AgentTimer>,
    pub(crate) rng: StdRng,
}

impl Agent {
    pub(crate) fn new(id: EntityId, spawn: &AgentSpawn, config: &VigilConfig, seed: u64) -> Self {
        let threshold = spawn.aggro_threshold.unwrap_or(config.threat.default_aggro_threshold);
        // Fold the 128-bit id into the seed so agents sharing a world seed diverge.
        let raw = id.0.as_u128();
        let mixed = seed ^ (raw as u64) ^ ((raw >> 64) as u64);
        Self {
            id,
            capabilities: Capabilities {
                memory: true,
                team: spawn.joins_teams,
                building: spawn.remembers_buildings,
            },
            memory: MemoryStore::new(spawn.body.snapshot(id), &config.memory),
            threat: ThreatTracker::new(threshold, &config.threat),
            selector: TargetSelector::new(spawn.weights, config.selection.clone()),
            combat: CombatMachine::new(spawn.role, config.combat.clone()),
            buildings: spawn.remembers_buildings.then(BuildingMemory::new),
            home: spawn.home,
            static_target: None,
            in_combat_mode: false,
            combat_entry: None,
            timers: Scheduler::new(),
            rng: StdRng::seed_from_u64(mixed),
        }
    }

    /// The agent's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Capabilities resolved at spawn.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Hostile memory.
    #[must_use]
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Threat table.
    #[must_use]
    pub fn threat(&self) -> &ThreatTracker {
        &self.threat
    }

    /// Engagement state machine.
    #[must_use]
    pub fn combat(&self) -> &CombatMachine {
        &self.combat
    }

    /// Remembered structures, if the agent has building memory.
    #[must_use]
    pub fn buildings(&self) -> Option<&BuildingMemory> {
        self.buildings.as_ref()
    }

    /// Home anchor.
    #[must_use]
    pub fn home(&self) -> Option<Location> {
        self.home
    }

    /// Structure chosen by the last static-target selection.
    #[must_use]
    pub fn static_target(&self) -> Option<EntityId> {
        self.static_target
    }

    /// Whether the agent is in combat posture.
    #[must_use]
    pub fn in_combat_mode(&self) -> bool {
        self.in_combat_mode
    }

    /// Runtime counters.
    #[must_use]
    pub fn stats(&self) -> AgentStats {
        AgentStats {
            remembered: self.memory.len(),
            perceived: self.memory.records().iter().filter(|r| r.is_currently_perceived).count(),
            tethers: self.memory.tethers().len(),
            threat_entries: self.threat.entries().count(),
            state: self.combat.state(),
        }
    }
}

/// Runtime counters for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Records in memory.
    pub remembered: usize,
    /// Records currently perceived.
    pub perceived: usize,
    /// Agents receiving this agent's snapshot.
    pub tethers: usize,
    /// Rows in the threat table.
    pub threat_entries: usize,
    /// Engagement state.
    pub state: CombatState,
}
