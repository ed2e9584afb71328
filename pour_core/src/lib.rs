#![forbid(unsafe_code)]

//! Core domain model and business logic for the Pour session tracker.
//!
//! This crate provides:
//! - Domain types (drinks, consumption records, sessions)
//! - The drink catalog
//! - The append-only record ledger
//! - The health-rule evaluation engine
//! - The session lifecycle state machine with propose/commit
//! - Snapshot persistence and CSV export

pub mod types;
pub mod error;
pub mod clock;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod rules;
pub mod session;
pub mod summary;
pub mod snapshot;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, RuleThresholds};
pub use ledger::RecordLedger;
pub use rules::{evaluate, RuleKind, Warning};
pub use session::SessionTracker;
pub use snapshot::Snapshot;
pub use summary::summarize;
pub use export::export_records;
