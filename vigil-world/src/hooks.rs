//! Integration points with the host engine.
//!
//! [`SpatialQuery`] is the one physical query the AI needs (ray casts for
//! the static-target sweep). [`WorldObserver`] is the callback-style
//! alternative to draining [`WorldEvent`]s by hand.

use vigil_core::combat::{CombatState, Intent};
use vigil_core::types::{EntityId, Location};

use crate::events::WorldEvent;

/// Ray casting supplied by the host's physics.
pub trait SpatialQuery {
    /// First entity hit by a horizontal ray from `origin` along `yaw_degrees`
    /// within `range`, if any.
    fn cast_ray(&self, origin: &Location, yaw_degrees: f32, range: f32) -> Option<EntityId>;
}

/// Host callbacks, one per event kind. Every method defaults to a no-op.
pub trait WorldObserver {
    /// An agent emitted an intent.
    fn on_intent(&mut self, _agent: EntityId, _intent: &Intent) {}

    /// Two tethered agents are close.
    fn on_nearby(&mut self, _agent: EntityId, _other: EntityId) {}

    /// A remembered entity died.
    fn on_enemy_dead(&mut self, _agent: EntityId, _enemy: EntityId) {}

    /// An agent entered or left combat posture.
    fn on_combat_mode(&mut self, _agent: EntityId, _entered: bool) {}

    /// An agent's engagement state changed.
    fn on_state_changed(&mut self, _agent: EntityId, _from: CombatState, _to: CombatState) {}
}

/// Route each event to the matching observer callback, in order.
pub fn dispatch(events: &[WorldEvent], observer: &mut impl WorldObserver) {
    for event in events {
        match *event {
            WorldEvent::Intent { agent, ref intent } => observer.on_intent(agent, intent),
            WorldEvent::Nearby { agent, other } => observer.on_nearby(agent, other),
            WorldEvent::EnemyDead { agent, enemy } => observer.on_enemy_dead(agent, enemy),
            WorldEvent::CombatModeEntered { agent } => observer.on_combat_mode(agent, true),
            WorldEvent::CombatModeLeft { agent } => observer.on_combat_mode(agent, false),
            WorldEvent::StateChanged { agent, from, to } => observer.on_state_changed(agent, from, to),
        }
    }
}
