//! Outward events produced by a world step.
//!
//! The host drains these with [`crate::world::World::drain_events`] and
//! routes them to its combat, animation and UI layers, or hands them to a
//! [`crate::hooks::WorldObserver`] via [`crate::hooks::dispatch`].

use serde::{Deserialize, Serialize};
use vigil_core::combat::{CombatState, Intent};
use vigil_core::types::EntityId;

/// Something the host should react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// An agent wants to act.
    Intent {
        /// The acting agent.
        agent: EntityId,
        /// What it wants to do.
        intent: Intent,
    },

    /// Two tethered agents came within the proximity radius.
    Nearby {
        /// The agent being notified.
        agent: EntityId,
        /// Who is close.
        other: EntityId,
    },

    /// An entity the agent remembered has died or been removed.
    EnemyDead {
        /// The agent being notified.
        agent: EntityId,
        /// The dead entity.
        enemy: EntityId,
    },

    /// The agent has noticed hostiles and switched to combat posture.
    CombatModeEntered {
        /// The agent.
        agent: EntityId,
    },

    /// The agent no longer remembers any hostile.
    CombatModeLeft {
        /// The agent.
        agent: EntityId,
    },

    /// The engagement state machine changed state.
    StateChanged {
        /// The agent.
        agent: EntityId,
        /// Previous state.
        from: CombatState,
        /// New state.
        to: CombatState,
    },
}

impl WorldEvent {
    /// The agent this event is addressed to.
    #[must_use]
    pub fn agent(&self) -> EntityId {
        match self {
            Self::Intent { agent, .. }
            | Self::Nearby { agent, .. }
            | Self::EnemyDead { agent, .. }
            | Self::CombatModeEntered { agent }
            | Self::CombatModeLeft { agent }
            | Self::StateChanged { agent, .. } => *agent,
        }
    }
}
