//! JSON inspector for debugging tools.
//!
//! Renders one agent's memory, threat table, squad and combat state as a
//! serializable report.

use serde::Serialize;
use vigil_core::buildings::BuildingRecord;
use vigil_core::combat::CombatState;
use vigil_core::error::{Result, VigilError};
use vigil_core::memory::MemoryRecord;
use vigil_core::squad::TeamMembership;
use vigil_core::threat::ThreatEntry;
use vigil_core::types::EntityId;

use crate::components::AgentStats;
use crate::world::World;

/// One row of the threat table.
#[derive(Debug, Clone, Serialize)]
pub struct ThreatRow {
    /// Provoking entity.
    pub source: EntityId,
    /// Accumulated values.
    #[serde(flatten)]
    pub entry: ThreatEntry,
}

/// Everything worth showing about one agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    /// The agent.
    pub agent: EntityId,
    /// Engagement state.
    pub state: CombatState,
    /// Current target.
    pub target: Option<EntityId>,
    /// Whether reselection is blocked after a disengage.
    pub on_cooldown: bool,
    /// Combat posture.
    pub in_combat_mode: bool,
    /// Counters.
    pub stats: AgentStats,
    /// Remembered hostiles.
    pub memory: Vec<MemoryRecord>,
    /// Agents receiving this agent's snapshot.
    pub tethers: Vec<EntityId>,
    /// Threat table.
    pub threat: Vec<ThreatRow>,
    /// Whether a forced engagement is latched.
    pub engaged: bool,
    /// Squad membership.
    pub team: Option<TeamMembership>,
    /// Squad leader.
    pub leader: Option<EntityId>,
    /// Remembered structures.
    pub buildings: Vec<BuildingRecord>,
    /// Chosen structure.
    pub static_target: Option<EntityId>,
}

/// Build the report for `agent`, or `None` if it is not an agent.
#[must_use]
pub fn report(world: &World, agent: EntityId) -> Option<AgentReport> {
    let a = world.agent(agent)?;
    Some(AgentReport {
        agent,
        state: a.combat().state(),
        target: a.combat().target(),
        on_cooldown: a.combat().on_cooldown(),
        in_combat_mode: a.in_combat_mode(),
        stats: a.stats(),
        memory: a.memory().records().to_vec(),
        tethers: a.memory().tethers().to_vec(),
        threat: a
            .threat()
            .entries()
            .map(|(source, entry)| ThreatRow { source, entry: *entry })
            .collect(),
        engaged: a.threat().is_engaged(),
        team: world.membership(agent).cloned(),
        leader: world.leader_of(agent),
        buildings: a.buildings().map(|b| b.records().to_vec()).unwrap_or_default(),
        static_target: a.static_target(),
    })
}

/// Pretty-printed JSON for `agent`.
///
/// # Errors
/// `EntityNotFound` if `agent` is not an agent, `Serialization` if encoding fails.
pub fn to_json(world: &World, agent: EntityId) -> Result<String> {
    let report = report(world, agent).ok_or(VigilError::EntityNotFound(agent))?;
    serde_json::to_string_pretty(&report).map_err(|e| VigilError::Serialization(e.to_string()))
}

/// Compact JSON array with a report for every agent.
///
/// # Errors
/// `Serialization` if encoding fails.
pub fn world_to_json(world: &World) -> Result<String> {
    let reports: Vec<AgentReport> = world.agent_ids().filter_map(|id| report(world, id)).collect();
    serde_json::to_string(&reports).map_err(|e| VigilError::Serialization(e.to_string()))
}
