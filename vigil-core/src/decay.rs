//! Time-based forgetting of memory records.
//!
//! Every record ages by the tick delta. A positive observation resets the
//! age to zero (see [`MemoryRecord::mark_perceived`]); a record whose age
//! passes the forget horizon is dropped.
//!
//! ```text
//!   seen ──▶ age 0 ──tick──▶ age dt ──tick──▶ … ──▶ age > horizon ──▶ forgotten
//!              ▲                                        │
//!              └──────────── observed again ◀───────────┘ (only before the horizon)
//! ```

use crate::memory::record::MemoryRecord;
use crate::types::EntityId;

/// Whether a record has outlived the forget horizon.
#[must_use]
pub fn is_forgotten(record: &MemoryRecord, horizon_secs: f32) -> bool {
    record.time_since_perceived > horizon_secs
}

/// Age every record by `dt` and drop the ones past `horizon_secs`.
///
/// Returns the ids that were forgotten, in their original order.
pub fn age_records(records: &mut Vec<MemoryRecord>, dt: f32, horizon_secs: f32) -> Vec<EntityId> {
    let dt = dt.max(0.0);
    let mut forgotten = Vec::new();
    records.retain_mut(|record| {
        record.time_since_perceived += dt;
        if is_forgotten(record, horizon_secs) {
            forgotten.push(record.entity);
            false
        } else {
            true
        }
    });
    forgotten
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
