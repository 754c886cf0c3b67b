//! # vigil-world: Reference Host for VIGIL
//!
//! This crate wires the game-agnostic `vigil-core` pieces into a
//! tick-driven world: it owns every agent's AI state, turns host inputs
//! (perception, damage, deaths) into core calls, runs the per-tick systems
//! in a fixed order and hands intents back out as events.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Host engine                  │
//! │   perception · damage · physics · animation  │
//! └──────┬──────────────────────────────▲────────┘
//!        │ report_visible_actors        │ WorldEvent
//!        │ notify_damaged / kill        │ (Intent, Nearby, ...)
//!        ▼                              │
//! ┌──────────────────────────────────────────────┐
//! │                 vigil-world                  │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────────┐  │
//! │  │  World   │ │ Systems  │ │ Hooks/Events │  │
//! │  └────┬─────┘ └────┬─────┘ └──────────────┘  │
//! │       ▼            ▼                         │
//! │  ┌────────────────────────────────────────┐  │
//! │  │              vigil-core                │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `world`: the injected world context and host-facing API
//! - `components`: bodies, agents and capabilities
//! - `systems`: the ordered per-tick passes
//! - `events` / `hooks`: outward notifications and host callbacks
//! - `config` / `telemetry`: world configuration and logging setup
//! - `inspect`: JSON debugging reports

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod config;
pub mod events;
pub mod hooks;
pub mod inspect;
pub mod systems;
pub mod telemetry;
pub mod world;

pub use components::{AgentSpawn, Body, Capabilities};
pub use config::WorldConfig;
pub use events::WorldEvent;
pub use world::World;
