//! Per-agent memory store: decaying snapshots of observed entities.
//!
//! The store holds at most `capacity` records, one per remembered entity,
//! plus the agent's own exposed snapshot and its tether list. A tether
//! names an agent that asked for this agent's data through
//! [`MemoryStore::get`]; the world pushes this agent's snapshot to every
//! tethered agent each time [`MemoryTick::sync_due`] comes back true.
//!
//! The store never reaches into another agent. Everything cross-agent
//! (tether pushes, proximity notices, cleanup on the far end) is done by
//! the world from the values these methods return.

pub mod record;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MemoryConfig;
use crate::decay;
use crate::eviction::{self, EvictionReason};
use crate::types::{EntityId, Location};

pub use record::{EntitySnapshot, MemoryRecord};

/// What an insert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObserveOutcome {
    /// A new record was added in a free slot.
    Inserted,
    /// An existing record was refreshed.
    Refreshed,
    /// A new record was added after evicting another.
    Replaced {
        /// The entity that made room.
        evicted: EntityId,
        /// Which rule chose it.
        reason: EvictionReason,
    },
    /// The snapshot described the owner itself and was dropped.
    Ignored,
}

impl ObserveOutcome {
    /// Whether a record was created by this call.
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced { .. })
    }

    /// The entity evicted by this call, if any.
    #[must_use]
    pub fn evicted(self) -> Option<EntityId> {
        match self {
            Self::Replaced { evicted, .. } => Some(evicted),
            _ => None,
        }
    }
}

/// Result of advancing the store's clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTick {
    /// Records dropped for passing the forget horizon.
    pub forgotten: Vec<EntityId>,
    /// Whether the tether synchronization interval elapsed.
    pub sync_due: bool,
}

/// An agent's memory of the entities around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    own: EntitySnapshot,
    records: Vec<MemoryRecord>,
    tethers: Vec<EntityId>,
    capacity: usize,
    forget_horizon_secs: f32,
    sync_interval_secs: f32,
    proximity_radius: f32,
    danger_radius: f32,
    sync_elapsed: f32,
}

impl MemoryStore {
    /// Create an empty store for the agent described by `own`.
    #[must_use]
    pub fn new(own: EntitySnapshot, config: &MemoryConfig) -> Self {
        Self {
            own,
            records: Vec::with_capacity(config.capacity),
            tethers: Vec::new(),
            capacity: config.capacity.max(1),
            forget_horizon_secs: config.forget_horizon_secs,
            sync_interval_secs: config.sync_interval_secs,
            proximity_radius: config.proximity_radius,
            danger_radius: config.danger_radius,
            sync_elapsed: 0.0,
        }
    }

    /// The agent this store belongs to.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.own.entity
    }

    /// The agent's own exposed snapshot, without tethering anyone.
    #[must_use]
    pub fn own_snapshot(&self) -> &EntitySnapshot {
        &self.own
    }

    /// Replace the agent's own exposed snapshot.
    pub fn update_own_snapshot(&mut self, snapshot: EntitySnapshot) {
        self.own = EntitySnapshot { entity: self.own.entity, ..snapshot };
    }

    // -----------------------------------------------------------------------
    // Inserts
    // -----------------------------------------------------------------------

    /// Insert or refresh a record and mark it perceived.
    pub fn observe(&mut self, snapshot: &EntitySnapshot) -> ObserveOutcome {
        self.upsert(snapshot, true)
    }

    /// Insert or refresh a record learned second-hand.
    ///
    /// Existing records keep their perception state; new ones start
    /// unperceived so they decay unless the agent sees the entity itself.
    pub fn remember(&mut self, snapshot: &EntitySnapshot) -> ObserveOutcome {
        self.upsert(snapshot, false)
    }

    fn upsert(&mut self, snapshot: &EntitySnapshot, perceived: bool) -> ObserveOutcome {
        if snapshot.entity == self.own.entity {
            return ObserveOutcome::Ignored;
        }

        if let Some(record) = self.records.iter_mut().find(|r| r.entity == snapshot.entity) {
            record.apply(snapshot);
            if perceived {
                record.mark_perceived();
            }
            return ObserveOutcome::Refreshed;
        }

        let mut outcome = ObserveOutcome::Inserted;
        if self.records.len() >= self.capacity {
            if let Some(choice) = eviction::choose_victim(&self.records, &self.own.location) {
                self.records.remove(choice.index);
                debug!(
                    owner = %self.own.entity,
                    evicted = %choice.entity,
                    reason = ?choice.reason,
                    "Memory full, evicted record"
                );
                outcome = ObserveOutcome::Replaced {
                    evicted: choice.entity,
                    reason: choice.reason,
                };
            }
        }

        self.records.push(MemoryRecord::from_snapshot(snapshot, perceived));
        outcome
    }

    /// Apply a perception report: listed entities are perceived, the rest are not.
    ///
    /// Unknown, duplicate and stale ids are ignored.
    pub fn mark_perception(&mut self, visible: &[EntityId]) {
        for record in &mut self.records {
            if visible.contains(&record.entity) {
                record.mark_perceived();
            } else {
                record.is_currently_perceived = false;
            }
        }
    }

    /// Refresh a record from a tether push without counting it as a sighting.
    ///
    /// Returns `false` when the entity is no longer remembered.
    pub fn refresh_from_tether(&mut self, snapshot: &EntitySnapshot) -> bool {
        match self.records.iter_mut().find(|r| r.entity == snapshot.entity) {
            Some(record) => {
                record.apply(snapshot);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Time & removal
    // -----------------------------------------------------------------------

    /// Age every record by `dt`, forgetting those past the horizon.
    pub fn tick(&mut self, dt: f32) -> MemoryTick {
        let forgotten = decay::age_records(&mut self.records, dt, self.forget_horizon_secs);
        if !forgotten.is_empty() {
            debug!(owner = %self.own.entity, count = forgotten.len(), "Forgot stale records");
        }

        self.sync_elapsed += dt.max(0.0);
        let sync_due = self.sync_elapsed >= self.sync_interval_secs;
        if sync_due {
            self.sync_elapsed = 0.0;
        }

        MemoryTick { forgotten, sync_due }
    }

    /// Remove a record and any tether to that entity immediately.
    pub fn forget(&mut self, entity: EntityId) -> Option<MemoryRecord> {
        self.tethers.retain(|t| *t != entity);
        let index = self.records.iter().position(|r| r.entity == entity)?;
        Some(self.records.remove(index))
    }

    /// Drop everything, returning every entity that was remembered or tethered.
    pub fn clear(&mut self) -> Vec<EntityId> {
        let mut touched: Vec<EntityId> = self.records.drain(..).map(|r| r.entity).collect();
        for t in self.tethers.drain(..) {
            if !touched.contains(&t) {
                touched.push(t);
            }
        }
        touched
    }

    // -----------------------------------------------------------------------
    // Tethers
    // -----------------------------------------------------------------------

    /// Hand this agent's snapshot to `requester` and tether it.
    ///
    /// The requester is tethered only when it is alive and is not the
    /// owner; tethering is idempotent.
    pub fn get(&mut self, requester: EntityId, requester_alive: bool) -> EntitySnapshot {
        if requester_alive && requester != self.own.entity && !self.tethers.contains(&requester) {
            self.tethers.push(requester);
            debug!(owner = %self.own.entity, requester = %requester, "Tether established");
        }
        self.own
    }

    /// Agents that receive this agent's snapshot on every sync.
    #[must_use]
    pub fn tethers(&self) -> &[EntityId] {
        &self.tethers
    }

    /// Whether `entity` is tethered to this store.
    #[must_use]
    pub fn is_tethered(&self, entity: EntityId) -> bool {
        self.tethers.contains(&entity)
    }

    /// Remove a tether. Returns whether one existed.
    pub fn untether(&mut self, entity: EntityId) -> bool {
        let before = self.tethers.len();
        self.tethers.retain(|t| *t != entity);
        before != self.tethers.len()
    }

    /// Whether `location` is close enough to the owner to trigger a nearby notice.
    #[must_use]
    pub fn is_nearby(&self, location: &Location) -> bool {
        self.own.location.distance(location) < self.proximity_radius
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Look up the record for `entity`.
    #[must_use]
    pub fn record(&self, entity: EntityId) -> Option<&MemoryRecord> {
        self.records.iter().find(|r| r.entity == entity)
    }

    /// Whether `entity` is remembered.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.record(entity).is_some()
    }

    /// All records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The remembered living entity last seen closest to `from`.
    #[must_use]
    pub fn nearest(&self, from: &Location) -> Option<&MemoryRecord> {
        self.records
            .iter()
            .filter(|r| r.is_alive())
            .min_by(|a, b| {
                a.last_seen_location
                    .distance(from)
                    .total_cmp(&b.last_seen_location.distance(from))
            })
    }

    /// Whether `entity` was last seen within `range` of `from`.
    #[must_use]
    pub fn is_in_range(&self, entity: EntityId, from: &Location, range: f32) -> bool {
        self.record(entity)
            .is_some_and(|r| r.last_seen_location.distance(from) <= range)
    }

    /// Whether any living remembered entity is within the danger radius.
    #[must_use]
    pub fn in_danger(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.is_alive() && r.last_seen_location.distance(&self.own.location) <= self.danger_radius)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
