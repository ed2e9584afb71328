//! Time source abstraction.
//!
//! The tracker never reads the system clock directly; it consumes a `Clock`
//! collaborator so tests can substitute a deterministic one.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

/// A source of the current instant
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the host system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests.
///
/// Interior mutability lets test code advance time through a shared
/// reference while the tracker holds the clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.set(instant);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
