//! Core domain types for the Pour session tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Drink definitions and the catalog
//! - Consumption records
//! - Session lifecycle state
//! - The propose/commit proposal type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Drink Types
// ============================================================================

/// A drink definition (e.g., "Wine")
///
/// Definitions are immutable once created. Drinks with `custom = true` are
/// user-defined and exempt from every health rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrinkDefinition {
    pub id: String,
    pub icon: String,
    pub name: String,
    /// Allowed portion sizes, ascending (e.g., `[0.5, 1.0]`)
    pub portions: Vec<f64>,
    #[serde(default)]
    pub custom: bool,
}

/// The complete catalog of known drinks, keyed by drink id.
///
/// Read-only from the core's perspective: the host supplies a new mapping
/// when the catalog changes, the core never edits it in place.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub drinks: HashMap<String, DrinkDefinition>,
}

// ============================================================================
// Record Types
// ============================================================================

/// One consumption event in the session ledger.
///
/// Created only through `RecordLedger::append`; immutable afterwards.
/// Ids are unique and monotonically increasing within a ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub id: u64,
    pub drink_id: String,
    pub portion: f64,
    pub recorded_at: DateTime<Utc>,
}

// ============================================================================
// Session Types
// ============================================================================

/// Session lifecycle status
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Active,
    Ended,
}

/// Mode chosen when starting a session.
///
/// Expert mode disables every advisory warning for the whole session, so
/// starting in it is a consequential choice the caller must confirm first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Safe,
    Expert,
}

/// One bounded tracking period from start to end.
///
/// Invariants (upheld by `SessionTracker`):
/// - `started_at` is set iff status is Active or Ended
/// - `ended_at` is set iff status is Ended, and `ended_at >= started_at`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Option<Uuid>,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub expert_mode: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            id: None,
            status: SessionStatus::Idle,
            started_at: None,
            ended_at: None,
            expert_mode: false,
        }
    }
}

// ============================================================================
// Proposal Type
// ============================================================================

/// Outcome of proposing a new consumption event.
///
/// Proposing has no side effect: the caller inspects `warning` (advisory,
/// never blocking), asks the user to confirm, and then passes the proposal
/// to `SessionTracker::commit`. Dropping a proposal cancels it.
#[derive(Clone, Debug)]
pub struct Proposal {
    pub drink_id: String,
    pub portion: f64,
    pub warning: Option<crate::rules::Warning>,
    pub requires_confirmation: bool,
}
