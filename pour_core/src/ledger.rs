//! Append-only session ledger.
//!
//! The ledger is a dumb ordered store: it does not know about session
//! status or the catalog. Records are kept most-recent-first by insertion
//! order, which is authoritative - events are always appended with the
//! current clock reading, so insertion order and timestamp order agree.

use crate::types::ConsumptionRecord;
use chrono::{DateTime, Duration, Utc};

/// The ordered store of consumption events for the current session
#[derive(Clone, Debug, Default)]
pub struct RecordLedger {
    /// Most-recent-first
    records: Vec<ConsumptionRecord>,
    next_id: u64,
}

impl RecordLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from snapshot records (most-recent-first).
    ///
    /// The id counter resumes past the highest restored id so later appends
    /// can never collide with restored records.
    pub fn restore(records: Vec<ConsumptionRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id + 1).max().unwrap_or(0);
        Self { records, next_id }
    }

    /// Append a new record stamped with the supplied instant.
    ///
    /// Assigns the next monotonic id and inserts at the front. Existing
    /// records are never touched.
    pub fn append(
        &mut self,
        drink_id: impl Into<String>,
        portion: f64,
        now: DateTime<Utc>,
    ) -> &ConsumptionRecord {
        let record = ConsumptionRecord {
            id: self.next_id,
            drink_id: drink_id.into(),
            portion,
            recorded_at: now,
        };
        self.next_id += 1;
        self.records.insert(0, record);
        tracing::debug!("Appended record {} to ledger", self.records[0].id);
        &self.records[0]
    }

    /// Remove the record with the given id.
    ///
    /// Idempotent: returns false if no record matched. Remaining records
    /// keep their relative order.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = self.records.len() < before;
        if removed {
            tracing::debug!("Removed record {} from ledger", id);
        }
        removed
    }

    /// The most recent record, optionally restricted to one drink
    pub fn most_recent(&self, drink_id: Option<&str>) -> Option<&ConsumptionRecord> {
        match drink_id {
            Some(id) => self.records.iter().find(|r| r.drink_id == id),
            None => self.records.first(),
        }
    }

    /// Records younger than `window` as of `now`, optionally filtered by drink.
    ///
    /// Half-open window: a record exactly `window` old has aged out. The
    /// result is a snapshot taken at call time, not a live view.
    pub fn within(
        &self,
        window: Duration,
        now: DateTime<Utc>,
        drink_id: Option<&str>,
    ) -> Vec<ConsumptionRecord> {
        self.records
            .iter()
            .filter(|r| now - r.recorded_at < window)
            .filter(|r| drink_id.map(|id| r.drink_id == id).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// All records, most-recent-first
    pub fn all(&self) -> &[ConsumptionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. The id counter keeps counting up.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
