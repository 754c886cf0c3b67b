//! Capacity eviction for the memory store.
//!
//! When a new entity arrives and the store is full, exactly one record
//! makes room for it:
//!
//! 1. the stalest record that is **not** currently perceived, else
//! 2. the perceived record farthest from the owner's current position.
//!
//! When candidates tie, the record inserted first is evicted.

use serde::{Deserialize, Serialize};

use crate::memory::record::MemoryRecord;
use crate::types::{EntityId, Location};

/// Why a record was picked for eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionReason {
    /// Not visible right now; the least actionable kind of memory.
    Unperceived,
    /// Everything was visible, so the farthest entity went.
    Farthest,
}

/// The record chosen to make room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionChoice {
    /// Position in the record list.
    pub index: usize,
    /// The evicted entity.
    pub entity: EntityId,
    /// Which rule picked it.
    pub reason: EvictionReason,
}

/// Pick the record to evict, or `None` for an empty slice.
#[must_use]
pub fn choose_victim(records: &[MemoryRecord], origin: &Location) -> Option<EvictionChoice> {
    let stalest_unperceived = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.is_currently_perceived)
        .fold(None::<(usize, f32)>, |best, (i, r)| match best {
            Some((_, age)) if age >= r.time_since_perceived => best,
            _ => Some((i, r.time_since_perceived)),
        });

    if let Some((index, _)) = stalest_unperceived {
        return Some(EvictionChoice {
            index,
            entity: records[index].entity,
            reason: EvictionReason::Unperceived,
        });
    }

    let farthest = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, r.last_seen_location.distance(origin)))
        .fold(None::<(usize, f32)>, |best, (i, d)| match best {
            Some((_, far)) if far >= d => best,
            _ => Some((i, d)),
        });

    farthest.map(|(index, _)| EvictionChoice {
        index,
        entity: records[index].entity,
        reason: EvictionReason::Farthest,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::record::EntitySnapshot;

    fn record(raw: u128, x: f32, perceived: bool, age: f32) -> MemoryRecord {
        let snap = EntitySnapshot::new(EntityId::from_raw(raw), Location::new(x, 0.0, 0.0));
        let mut r = MemoryRecord::from_snapshot(&snap, perceived);
        r.time_since_perceived = age;
        r
    }

    #[test]
    fn prefers_unperceived_over_distant() {
        let records = vec![
            record(1, 5000.0, true, 0.0),
            record(2, 10.0, false, 3.0),
        ];
        let choice = choose_victim(&records, &Location::default()).expect("non-empty");
        assert_eq!(choice.entity, EntityId::from_raw(2));
        assert_eq!(choice.reason, EvictionReason::Unperceived);
    }

    #[test]
    fn stalest_unperceived_goes_first() {
        let records = vec![
            record(1, 0.0, false, 2.0),
            record(2, 0.0, false, 9.0),
            record(3, 0.0, false, 4.0),
        ];
        let choice = choose_victim(&records, &Location::default()).expect("non-empty");
        assert_eq!(choice.index, 1);
    }

    #[test]
    fn all_perceived_evicts_farthest() {
        let records = vec![
            record(1, 100.0, true, 0.0),
            record(2, 900.0, true, 0.0),
            record(3, 300.0, true, 0.0),
        ];
        let choice = choose_victim(&records, &Location::default()).expect("non-empty");
        assert_eq!(choice.entity, EntityId::from_raw(2));
        assert_eq!(choice.reason, EvictionReason::Farthest);
    }

    #[test]
    fn ties_evict_earliest() {
        let records = vec![record(1, 100.0, true, 0.0), record(2, 100.0, true, 0.0)];
        let choice = choose_victim(&records, &Location::default()).expect("non-empty");
        assert_eq!(choice.index, 0);
    }

    #[test]
    fn empty_has_no_victim() {
        assert!(choose_victim(&[], &Location::default()).is_none());
    }
}
