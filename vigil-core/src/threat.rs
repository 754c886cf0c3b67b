//! Aggro and damage accumulation with one-shot forced engagement.
//!
//! Each remembered hostile gets a [`ThreatEntry`]. Provocation raises its
//! aggro (and cumulative damage, when it hurt). Two escalation paths share
//! a single engagement latch:
//!
//! - aggro above the agent's threshold, or
//! - cumulative damage above half the agent's max health.
//!
//! Whichever crosses first latches the tracker for `engaged_cooldown_secs`.
//! While latched, provocation keeps accumulating but never forces another
//! engagement. The latch also leaves a *pending* forced target that the
//! target selector consumes once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ThreatConfig;
use crate::schedule::{Scheduler, TimerHandle};
use crate::types::EntityId;

/// Accumulated provocation from one source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThreatEntry {
    /// Integer aggro, floor 0.
    pub aggro_score: u32,
    /// Damage received from this source since the last reset.
    pub damage_dealt: f32,
    /// Tracker-clock time of the last damage from this source.
    pub last_damage_at: Option<f64>,
}

/// What a provocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provocation {
    /// A threshold was crossed: engage the source now.
    ForceEngage,
    /// Recorded, below both thresholds.
    Recorded,
    /// Recorded, but the engagement latch is still cooling down.
    Suppressed,
    /// The source is not in memory; populate it and deliver again.
    UnknownSource,
}

impl Provocation {
    /// Whether the caller must force-engage the source.
    #[must_use]
    pub fn forces_engagement(self) -> bool {
        matches!(self, Self::ForceEngage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThreatTimer {
    DecayPass,
    EngagementLapse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Engagement {
    source: EntityId,
    pending: bool,
    lapse: TimerHandle,
}

/// Per-agent threat table.
#[derive(Debug, Clone)]
pub struct ThreatTracker {
    entries: BTreeMap<EntityId, ThreatEntry>,
    aggro_threshold: u32,
    decay_per_pass: u32,
    damage_reset_secs: f64,
    engaged_cooldown_secs: f32,
    engagement: Option<Engagement>,
    timers: Scheduler<ThreatTimer>,
}

impl ThreatTracker {
    /// Create a tracker with the given aggro threshold.
    #[must_use]
    pub fn new(aggro_threshold: u32, config: &ThreatConfig) -> Self {
        let mut timers = Scheduler::new();
        timers.schedule_repeating(config.decay_interval_secs, ThreatTimer::DecayPass);
        Self {
            entries: BTreeMap::new(),
            aggro_threshold,
            decay_per_pass: config.decay_per_pass,
            damage_reset_secs: f64::from(config.damage_reset_secs),
            engaged_cooldown_secs: config.engaged_cooldown_secs,
            engagement: None,
            timers,
        }
    }

    /// Start tracking `source` with a zeroed entry. Idempotent.
    pub fn track(&mut self, source: EntityId) {
        self.entries.entry(source).or_default();
    }

    /// Stop tracking `source`, cancelling any engagement latched on it.
    pub fn forget(&mut self, source: EntityId) -> Option<ThreatEntry> {
        if let Some(engagement) = self.engagement.filter(|e| e.source == source) {
            self.timers.cancel(engagement.lapse);
            self.engagement = None;
        }
        self.entries.remove(&source)
    }

    /// Drop every entry and cancel the latch; the decay pass keeps running.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Some(engagement) = self.engagement.take() {
            self.timers.cancel(engagement.lapse);
        }
    }

    /// Record provocation from `source`.
    ///
    /// Negative amounts count as zero. `max_health` is the provoked agent's.
    pub fn register_provocation(
        &mut self,
        source: EntityId,
        amount: f32,
        dealt_damage: bool,
        max_health: f32,
    ) -> Provocation {
        let now = self.timers.now();
        let Some(entry) = self.entries.get_mut(&source) else {
            return Provocation::UnknownSource;
        };

        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        // Saturating float-to-int cast; fractional aggro truncates.
        entry.aggro_score = entry.aggro_score.saturating_add(amount as u32);
        if dealt_damage {
            entry.damage_dealt += amount;
            entry.last_damage_at = Some(now);
        }

        if self.engagement.is_some() {
            return Provocation::Suppressed;
        }

        let aggro_crossed = entry.aggro_score > self.aggro_threshold;
        let damage_crossed = dealt_damage && entry.damage_dealt > max_health / 2.0;
        if !(aggro_crossed || damage_crossed) {
            return Provocation::Recorded;
        }

        let lapse = self.timers.schedule(self.engaged_cooldown_secs, ThreatTimer::EngagementLapse);
        self.engagement = Some(Engagement { source, pending: true, lapse });
        debug!(
            source = %source,
            aggro = entry.aggro_score,
            damage = entry.damage_dealt,
            "Threat threshold crossed, forcing engagement"
        );
        Provocation::ForceEngage
    }

    /// Advance the tracker clock, running decay passes and latch expiry.
    pub fn tick(&mut self, dt: f32) {
        for (_, timer) in self.timers.advance(dt) {
            match timer {
                ThreatTimer::DecayPass => self.decay_pass(),
                ThreatTimer::EngagementLapse => {
                    if let Some(e) = self.engagement.take() {
                        debug!(source = %e.source, "Engagement latch lapsed");
                    }
                }
            }
        }
    }

    fn decay_pass(&mut self) {
        let now = self.timers.now();
        for entry in self.entries.values_mut() {
            entry.aggro_score = entry.aggro_score.saturating_sub(self.decay_per_pass);
            let stale = entry
                .last_damage_at
                .is_none_or(|t| now - t > self.damage_reset_secs);
            if entry.damage_dealt > 0.0 && stale {
                entry.damage_dealt = 0.0;
            }
        }
    }

    /// Consume the pending forced target, if the latch still has one.
    ///
    /// Picks the valid entry with the highest aggro, falling back to the
    /// source that tripped the latch. Returns `None` once consumed.
    pub fn take_forced_target(&mut self, is_valid: impl Fn(EntityId) -> bool) -> Option<EntityId> {
        let engagement = self.engagement.as_mut().filter(|e| e.pending)?;
        engagement.pending = false;
        let source = engagement.source;

        self.entries
            .iter()
            .filter(|(id, _)| is_valid(**id))
            .max_by(|a, b| a.1.aggro_score.cmp(&b.1.aggro_score).then(b.0.cmp(a.0)))
            .filter(|(_, e)| e.aggro_score > 0)
            .map(|(id, _)| *id)
            .or_else(|| is_valid(source).then_some(source))
    }

    /// First valid source whose cumulative damage exceeds half of `max_health`.
    #[must_use]
    pub fn heavy_damage_source(&self, max_health: f32, is_valid: impl Fn(EntityId) -> bool) -> Option<EntityId> {
        self.entries
            .iter()
            .find(|(id, e)| e.damage_dealt > max_health / 2.0 && is_valid(**id))
            .map(|(id, _)| *id)
    }

    /// Whether the engagement latch is set.
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engagement.is_some()
    }

    /// Seconds left on the engagement latch.
    #[must_use]
    pub fn engagement_remaining(&self) -> Option<f64> {
        self.engagement.and_then(|e| self.timers.remaining(e.lapse))
    }

    /// The entry for `source`.
    #[must_use]
    pub fn entry(&self, source: EntityId) -> Option<&ThreatEntry> {
        self.entries.get(&source)
    }

    /// Every entry, ordered by entity id.
    pub fn entries(&self) -> impl Iterator<Item = (EntityId, &ThreatEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    /// The agent's aggro threshold.
    #[must_use]
    pub fn aggro_threshold(&self) -> u32 {
        self.aggro_threshold
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
