//! # Vigil Core Library
//!
//! Game-agnostic combat AI for non-player characters.
//!
//! Every agent carries a handful of small, independently testable parts:
//!
//! - **Memory** ([`MemoryStore`]): a bounded, decaying record of hostiles
//!   the agent has seen or heard about
//! - **Threat** ([`ThreatTracker`]): aggro and damage accounting that can
//!   force an immediate engagement
//! - **Selection** ([`TargetSelector`]): weighted, rank-based choice of
//!   which enemy (or structure) to fight
//! - **Squads** ([`squad`]): symmetric team membership, leaders, roles and
//!   formation slots
//! - **Combat** ([`CombatMachine`]): the engagement state machine that
//!   turns all of the above into [`Intent`]s
//!
//! Nothing here knows about a game engine. The host feeds snapshots and
//! events in and reads intents out; see the `vigil-world` crate for a
//! reference host.
//!
//! ## Performance Contract
//!
//! - Memory observe / tick (10 records): < 5μs
//! - Enemy selection over a full memory: < 20μs
//! - Combat evaluation: < 2μs

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buildings;
pub mod combat;
pub mod config;
pub mod decay;
pub mod error;
pub mod eviction;
pub mod memory;
pub mod schedule;
pub mod selection;
pub mod squad;
pub mod threat;
pub mod types;

pub use buildings::{BuildingMemory, BuildingRecord, Material};
pub use combat::{CombatContext, CombatMachine, CombatState, Intent, TargetView};
pub use config::VigilConfig;
pub use error::{Result, VigilError};
pub use memory::{EntitySnapshot, MemoryRecord, MemoryStore, ObserveOutcome};
pub use selection::{Personality, SelectionRequest, SelectionWeights, Surroundings, TargetSelector};
pub use squad::{FormationSlot, TeamMembership, TeamRole};
pub use threat::{Provocation, ThreatTracker};
pub use types::*;
