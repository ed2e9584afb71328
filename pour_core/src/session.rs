//! Session lifecycle state machine.
//!
//! `SessionTracker` owns the `Session` value and the ledger and is the sole
//! writer of both. Every mutation runs through it: only an active session
//! accepts new records, and new records travel the two-step propose/commit
//! protocol so advisory warnings can be surfaced before anything changes.
//!
//! The clock and catalog are injected collaborators: the tracker never
//! reads ambient time, and it consumes catalog changes only as a whole new
//! mapping.

use crate::clock::{Clock, SystemClock};
use crate::config::RuleThresholds;
use crate::ledger::RecordLedger;
use crate::rules;
use crate::snapshot::Snapshot;
use crate::types::{
    Catalog, ConsumptionRecord, Proposal, Session, SessionMode, SessionStatus,
};
use crate::{Error, Result};
use chrono::Duration;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Owns the session, the ledger, and the injected collaborators
pub struct SessionTracker<C: Clock = SystemClock> {
    session: Session,
    ledger: RecordLedger,
    catalog: Catalog,
    thresholds: RuleThresholds,
    clock: C,
}

impl SessionTracker<SystemClock> {
    /// Tracker on the host system clock, starting Idle
    pub fn new(catalog: Catalog, thresholds: RuleThresholds) -> Self {
        Self::with_clock(catalog, thresholds, SystemClock)
    }
}

impl<C: Clock> SessionTracker<C> {
    /// Tracker with an explicit clock collaborator
    pub fn with_clock(catalog: Catalog, thresholds: RuleThresholds, clock: C) -> Self {
        Self {
            session: Session::default(),
            ledger: RecordLedger::new(),
            catalog,
            thresholds,
            clock,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle transitions
    // ------------------------------------------------------------------

    /// Begin a new session.
    ///
    /// Allowed from Idle or Ended. Clears the ledger, stamps `started_at`,
    /// and assigns a fresh session id. Starting in Expert mode disables
    /// every advisory warning; the caller is expected to have confirmed
    /// that choice already - the machine trusts the caller.
    pub fn start(&mut self, mode: SessionMode) -> Result<()> {
        if self.session.status == SessionStatus::Active {
            return Err(Error::InvalidTransition(
                "a session is already active".into(),
            ));
        }

        let now = self.clock.now();
        self.session = Session {
            id: Some(Uuid::new_v4()),
            status: SessionStatus::Active,
            started_at: Some(now),
            ended_at: None,
            expert_mode: mode == SessionMode::Expert,
        };
        self.ledger = RecordLedger::new();

        tracing::info!(
            "Started {:?} session {} at {}",
            mode,
            self.session.id.map(|id| id.to_string()).unwrap_or_default(),
            now
        );
        Ok(())
    }

    /// End the active session, stamping `ended_at`
    pub fn end(&mut self) -> Result<()> {
        if self.session.status != SessionStatus::Active {
            return Err(Error::InvalidTransition(
                "no active session to end".into(),
            ));
        }

        let now = self.clock.now();
        self.session.ended_at = Some(now);
        self.session.status = SessionStatus::Ended;
        tracing::info!("Ended session at {}", now);
        Ok(())
    }

    /// Return to the initial Idle state, discarding the ledger.
    ///
    /// Allowed from any state; the only transition destructive to history.
    pub fn reset(&mut self) {
        self.session = Session::default();
        self.ledger = RecordLedger::new();
        tracing::info!("Reset session state");
    }

    /// Toggle expert mode on a running (or ended) session.
    ///
    /// Turning it off unconditionally re-enables rule evaluation for
    /// subsequent events. Not available while Idle - there is no session
    /// to toggle.
    pub fn set_expert_mode(&mut self, enabled: bool) -> Result<()> {
        if self.session.status == SessionStatus::Idle {
            return Err(Error::InvalidTransition(
                "no session to change mode on".into(),
            ));
        }

        if self.session.expert_mode != enabled {
            tracing::info!("Expert mode {}", if enabled { "enabled" } else { "disabled" });
        }
        self.session.expert_mode = enabled;
        Ok(())
    }

    /// Empty the ledger without touching session timing or mode.
    ///
    /// Distinct from `reset`: the session stays Active.
    pub fn clear_history(&mut self) -> Result<()> {
        if self.session.status != SessionStatus::Active {
            return Err(Error::InvalidTransition(
                "can only clear history during an active session".into(),
            ));
        }

        self.ledger.clear();
        tracing::info!("Cleared session history");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Record flow: propose -> commit
    // ------------------------------------------------------------------

    /// Propose a new consumption event.
    ///
    /// Side-effect free: evaluates the health rules against the current
    /// ledger and reports any advisory warning. The caller decides whether
    /// to `commit`; not committing is the cancellation path.
    pub fn propose(&self, drink_id: &str, portion: f64) -> Result<Proposal> {
        if self.session.status != SessionStatus::Active {
            return Err(Error::InvalidTransition(
                "cannot log a drink without an active session".into(),
            ));
        }
        if portion <= 0.0 {
            return Err(Error::InvalidPortion(portion));
        }
        self.catalog.require(drink_id)?;

        let warning = rules::evaluate(
            &self.catalog,
            &self.thresholds,
            &self.ledger,
            self.session.expert_mode,
            drink_id,
            portion,
            self.clock.now(),
        );

        Ok(Proposal {
            drink_id: drink_id.to_string(),
            portion,
            warning,
            requires_confirmation: true,
        })
    }

    /// Commit a proposal, appending it to the ledger with the current
    /// clock reading
    pub fn commit(&mut self, proposal: &Proposal) -> Result<ConsumptionRecord> {
        if self.session.status != SessionStatus::Active {
            return Err(Error::InvalidTransition(
                "cannot log a drink without an active session".into(),
            ));
        }

        let now = self.clock.now();
        let record = self
            .ledger
            .append(proposal.drink_id.clone(), proposal.portion, now)
            .clone();
        tracing::info!(
            "Logged {} x{} as record {}",
            record.drink_id,
            record.portion,
            record.id
        );
        Ok(record)
    }

    /// Remove a record by id; false when nothing matched
    pub fn remove_record(&mut self, id: u64) -> bool {
        self.ledger.remove(id)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn ledger(&self) -> &RecordLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Elapsed session time: running for Active, final for Ended.
    ///
    /// Pure read of `now - started_at`; hosts may poll this at any
    /// granularity without affecting state.
    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.session.started_at?;
        match self.session.status {
            SessionStatus::Active => Some(self.clock.now() - start),
            SessionStatus::Ended => self.session.ended_at.map(|end| end - start),
            SessionStatus::Idle => None,
        }
    }

    /// Time since the most recent record of a drink, if any
    pub fn time_since_last(&self, drink_id: &str) -> Option<Duration> {
        self.ledger
            .most_recent(Some(drink_id))
            .map(|r| self.clock.now() - r.recorded_at)
    }

    /// Per-drink portion totals for display
    pub fn summarize(&self) -> BTreeMap<String, f64> {
        crate::summary::summarize(&self.ledger, &self.catalog)
    }

    /// Replace the catalog with a new mapping from the host
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
    }

    // ------------------------------------------------------------------
    // Snapshot hooks
    // ------------------------------------------------------------------

    /// Capture the tracker as a serializable snapshot
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            session: self.session.clone(),
            records: self.ledger.all().to_vec(),
            catalog_overrides: self.catalog.custom_drinks(),
        }
    }

    /// Rebuild a tracker from a snapshot.
    ///
    /// Snapshot custom drinks are merged into the supplied catalog so a
    /// restore still resolves them on a host without the originating
    /// config. A snapshot whose session breaks the state invariants is
    /// normalized back to Idle rather than rejected.
    pub fn from_snapshot(
        snapshot: Snapshot,
        catalog: Catalog,
        thresholds: RuleThresholds,
        clock: C,
    ) -> Self {
        let catalog = catalog.with_custom(snapshot.catalog_overrides);
        let (session, keep_records) = normalize_session(snapshot.session);
        let ledger = if keep_records {
            RecordLedger::restore(snapshot.records)
        } else {
            RecordLedger::new()
        };

        Self {
            session,
            ledger,
            catalog,
            thresholds,
            clock,
        }
    }
}

/// Check a restored session against the state invariants.
///
/// Returns the session to use and whether the snapshot records are still
/// meaningful. Invariant breaches degrade to the default Idle session.
fn normalize_session(session: Session) -> (Session, bool) {
    match session.status {
        SessionStatus::Idle => {
            if session.started_at.is_some() || session.ended_at.is_some() {
                tracing::warn!("Snapshot session is Idle with timestamps set, normalizing");
                return (Session::default(), false);
            }
            // An idle session owns no records.
            (Session::default(), false)
        }
        SessionStatus::Active => match session.started_at {
            Some(_) => {
                let mut session = session;
                if session.ended_at.take().is_some() {
                    tracing::warn!("Snapshot session is Active with ended_at set, clearing it");
                }
                (session, true)
            }
            None => {
                tracing::warn!("Snapshot session is Active without started_at, normalizing to Idle");
                (Session::default(), false)
            }
        },
        SessionStatus::Ended => match (session.started_at, session.ended_at) {
            (Some(start), Some(end)) if end >= start => (session, true),
            _ => {
                tracing::warn!("Snapshot session is Ended with broken timestamps, normalizing to Idle");
                (Session::default(), false)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::clock::ManualClock;
    use crate::rules::RuleKind;
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 20, 0, 0).unwrap()
    }

    fn tracker() -> SessionTracker<ManualClock> {
        SessionTracker::with_clock(
            build_default_catalog(),
            RuleThresholds::default(),
            ManualClock::new(t0()),
        )
    }

    fn log(tracker: &mut SessionTracker<ManualClock>, drink: &str, portion: f64) -> ConsumptionRecord {
        let proposal = tracker.propose(drink, portion).unwrap();
        tracker.commit(&proposal).unwrap()
    }

    #[test]
    fn test_initial_state_is_idle() {
        let tracker = tracker();
        assert_eq!(tracker.status(), SessionStatus::Idle);
        assert!(tracker.session().started_at.is_none());
        assert!(tracker.ledger().is_empty());
        assert_eq!(tracker.elapsed(), None);
    }

    #[test]
    fn test_start_from_idle() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();

        assert_eq!(tracker.status(), SessionStatus::Active);
        assert_eq!(tracker.session().started_at, Some(t0()));
        assert!(tracker.session().id.is_some());
        assert!(!tracker.session().expert_mode);
        assert!(tracker.ledger().is_empty());
    }

    #[test]
    fn test_start_while_active_is_rejected_without_mutation() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        log(&mut tracker, "beer", 1.0);
        let session_id = tracker.session().id;

        let err = tracker.start(SessionMode::Expert).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));

        // The rejected start must not have touched anything.
        assert_eq!(tracker.session().id, session_id);
        assert_eq!(tracker.ledger().len(), 1);
        assert!(!tracker.session().expert_mode);
    }

    #[test]
    fn test_restart_after_end_clears_ledger_and_end_time() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        log(&mut tracker, "beer", 1.0);
        tracker.clock().advance(Duration::hours(1));
        tracker.end().unwrap();

        tracker.clock().advance(Duration::hours(1));
        tracker.start(SessionMode::Safe).unwrap();

        assert_eq!(tracker.status(), SessionStatus::Active);
        assert!(tracker.ledger().is_empty());
        assert_eq!(tracker.session().started_at, Some(t0() + Duration::hours(2)));
        assert!(tracker.session().ended_at.is_none());
    }

    #[test]
    fn test_end_requires_active() {
        let mut tracker = tracker();
        assert!(matches!(tracker.end(), Err(Error::InvalidTransition(_))));

        tracker.start(SessionMode::Safe).unwrap();
        tracker.end().unwrap();
        assert!(matches!(tracker.end(), Err(Error::InvalidTransition(_))));
    }

    #[test]
    fn test_end_stamps_ended_at() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        tracker.clock().advance(Duration::minutes(90));
        tracker.end().unwrap();

        assert_eq!(tracker.status(), SessionStatus::Ended);
        assert_eq!(
            tracker.session().ended_at,
            Some(t0() + Duration::minutes(90))
        );
        assert_eq!(tracker.elapsed(), Some(Duration::minutes(90)));
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut tracker = tracker();
        tracker.reset();
        assert_eq!(tracker.status(), SessionStatus::Idle);

        tracker.start(SessionMode::Expert).unwrap();
        log(&mut tracker, "beer", 1.0);
        tracker.reset();

        let snapshot = tracker.to_snapshot();
        assert_eq!(snapshot.session.status, SessionStatus::Idle);
        assert!(snapshot.records.is_empty());
        assert!(!snapshot.session.expert_mode);
    }

    #[test]
    fn test_expert_toggle_requires_session() {
        let mut tracker = tracker();
        assert!(matches!(
            tracker.set_expert_mode(true),
            Err(Error::InvalidTransition(_))
        ));

        tracker.start(SessionMode::Safe).unwrap();
        tracker.set_expert_mode(true).unwrap();
        assert!(tracker.session().expert_mode);
    }

    #[test]
    fn test_expert_toggle_off_reenables_rules() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Expert).unwrap();
        log(&mut tracker, "water", 0.5);

        // Expert mode: mixing beer after water raises nothing.
        let proposal = tracker.propose("beer", 1.0).unwrap();
        assert!(proposal.warning.is_none());

        tracker.set_expert_mode(false).unwrap();
        let proposal = tracker.propose("beer", 1.0).unwrap();
        assert_eq!(
            proposal.warning.unwrap().rule,
            RuleKind::ExclusiveCategory
        );
    }

    #[test]
    fn test_clear_history_keeps_timing_and_mode() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Expert).unwrap();
        log(&mut tracker, "beer", 1.0);
        tracker.clock().advance(Duration::minutes(10));

        tracker.clear_history().unwrap();

        assert!(tracker.ledger().is_empty());
        assert_eq!(tracker.status(), SessionStatus::Active);
        assert_eq!(tracker.session().started_at, Some(t0()));
        assert!(tracker.session().expert_mode);
    }

    #[test]
    fn test_clear_history_requires_active() {
        let mut tracker = tracker();
        assert!(matches!(
            tracker.clear_history(),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_propose_requires_active_session() {
        let tracker = tracker();
        assert!(matches!(
            tracker.propose("beer", 1.0),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_propose_rejects_unknown_drink_and_bad_portion() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();

        assert!(matches!(
            tracker.propose("mead", 1.0),
            Err(Error::UnknownDrink(_))
        ));
        assert!(matches!(
            tracker.propose("beer", 0.0),
            Err(Error::InvalidPortion(_))
        ));
        assert!(matches!(
            tracker.propose("beer", -1.0),
            Err(Error::InvalidPortion(_))
        ));
    }

    #[test]
    fn test_propose_has_no_side_effect() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        log(&mut tracker, "water", 0.5);

        // A warned proposal left uncommitted changes nothing.
        let proposal = tracker.propose("beer", 1.0).unwrap();
        assert!(proposal.warning.is_some());
        assert!(proposal.requires_confirmation);
        assert_eq!(tracker.ledger().len(), 1);
    }

    #[test]
    fn test_warning_is_advisory_not_blocking() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        log(&mut tracker, "water", 0.5);

        let proposal = tracker.propose("beer", 1.0).unwrap();
        assert!(proposal.warning.is_some());

        // The caller may still commit.
        let record = tracker.commit(&proposal).unwrap();
        assert_eq!(record.drink_id, "beer");
        assert_eq!(tracker.ledger().len(), 2);
    }

    #[test]
    fn test_commit_rejected_once_session_ends() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        let proposal = tracker.propose("beer", 1.0).unwrap();
        tracker.end().unwrap();

        assert!(matches!(
            tracker.commit(&proposal),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_remove_record() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        let record = log(&mut tracker, "beer", 1.0);

        assert!(tracker.remove_record(record.id));
        assert!(!tracker.remove_record(record.id));
        assert!(tracker.ledger().is_empty());
    }

    #[test]
    fn test_elapsed_tracks_running_session() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        tracker.clock().advance(Duration::minutes(42));
        assert_eq!(tracker.elapsed(), Some(Duration::minutes(42)));

        tracker.end().unwrap();
        tracker.clock().advance(Duration::hours(3));
        // Once ended, elapsed is frozen at the final duration.
        assert_eq!(tracker.elapsed(), Some(Duration::minutes(42)));
    }

    #[test]
    fn test_time_since_last() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        log(&mut tracker, "wine", 0.5);
        tracker.clock().advance(Duration::minutes(25));

        assert_eq!(
            tracker.time_since_last("wine"),
            Some(Duration::minutes(25))
        );
        assert_eq!(tracker.time_since_last("beer"), None);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        log(&mut tracker, "wine", 0.5);
        tracker.clock().advance(Duration::minutes(5));
        log(&mut tracker, "sake", 1.0);
        tracker.set_expert_mode(true).unwrap();

        let snapshot = tracker.to_snapshot();
        let restored = SessionTracker::from_snapshot(
            snapshot.clone(),
            build_default_catalog(),
            RuleThresholds::default(),
            ManualClock::new(t0() + Duration::minutes(5)),
        );

        assert_eq!(restored.session(), tracker.session());
        assert_eq!(restored.ledger().all(), tracker.ledger().all());
        assert_eq!(restored.to_snapshot(), snapshot);
    }

    #[test]
    fn test_restored_ledger_continues_ids() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();
        log(&mut tracker, "beer", 1.0);
        log(&mut tracker, "sake", 1.0);

        let mut restored = SessionTracker::from_snapshot(
            tracker.to_snapshot(),
            build_default_catalog(),
            RuleThresholds::default(),
            ManualClock::new(t0() + Duration::minutes(10)),
        );

        let record = log(&mut restored, "wine", 0.5);
        assert_eq!(record.id, 2);
    }

    #[test]
    fn test_snapshot_overrides_restore_custom_drinks() {
        let catalog = build_default_catalog().with_custom(vec![crate::types::DrinkDefinition {
            id: "kombucha".into(),
            icon: "🫖".into(),
            name: "Kombucha".into(),
            portions: vec![0.5],
            custom: true,
        }]);
        let mut tracker = SessionTracker::with_clock(
            catalog,
            RuleThresholds::default(),
            ManualClock::new(t0()),
        );
        tracker.start(SessionMode::Safe).unwrap();
        log(&mut tracker, "kombucha", 0.5);

        // Restore against the plain default catalog: the override carried
        // by the snapshot must still resolve and stay rule-exempt.
        let restored = SessionTracker::from_snapshot(
            tracker.to_snapshot(),
            build_default_catalog(),
            RuleThresholds::default(),
            ManualClock::new(t0() + Duration::minutes(1)),
        );

        assert!(restored.catalog().is_custom("kombucha"));
        let proposal = restored.propose("kombucha", 0.5).unwrap();
        assert!(proposal.warning.is_none());
    }

    #[test]
    fn test_set_catalog_takes_effect_for_later_proposals() {
        let mut tracker = tracker();
        tracker.start(SessionMode::Safe).unwrap();

        assert!(matches!(
            tracker.propose("kombucha", 0.5),
            Err(Error::UnknownDrink(_))
        ));

        // The host hands the core a whole new mapping; no in-place edits.
        let updated = build_default_catalog().with_custom(vec![crate::types::DrinkDefinition {
            id: "kombucha".into(),
            icon: "🫖".into(),
            name: "Kombucha".into(),
            portions: vec![0.5],
            custom: true,
        }]);
        tracker.set_catalog(updated);

        assert!(tracker.propose("kombucha", 0.5).is_ok());
    }

    #[test]
    fn test_broken_snapshot_normalizes_to_idle() {
        let snapshot = Snapshot {
            session: Session {
                id: Some(Uuid::new_v4()),
                status: SessionStatus::Active,
                started_at: None, // invariant breach
                ended_at: None,
                expert_mode: true,
            },
            records: vec![ConsumptionRecord {
                id: 0,
                drink_id: "beer".into(),
                portion: 1.0,
                recorded_at: t0(),
            }],
            catalog_overrides: vec![],
        };

        let restored = SessionTracker::from_snapshot(
            snapshot,
            build_default_catalog(),
            RuleThresholds::default(),
            ManualClock::new(t0()),
        );

        assert_eq!(restored.status(), SessionStatus::Idle);
        assert!(restored.ledger().is_empty());
        assert!(!restored.session().expert_mode);
    }
}
