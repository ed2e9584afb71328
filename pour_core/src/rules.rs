//! Health-rule evaluation engine.
//!
//! `evaluate` is a pure function of the candidate event, a ledger snapshot,
//! the mode flag, and the clock reading. Rules run in fixed priority order,
//! most dangerous first, and only the first match is reported - callers get
//! at most one advisory warning per proposed event.

use crate::config::RuleThresholds;
use crate::ledger::RecordLedger;
use crate::types::Catalog;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Hydration-class drink ids
pub const HYDRATION_DRINKS: &[&str] = &["water"];

/// Depressant-class drink ids, mutually exclusive with hydration
pub const DEPRESSANT_DRINKS: &[&str] = &["beer", "whiskey"];

/// Drink carrying a minimum re-entry interval
const COOLDOWN_DRINK: &str = "wine";

/// Unordered pair flagged when taken close together
const INTERACTION_PAIR: (&str, &str) = ("beer", "melon");

/// Which rule produced a warning.
///
/// The kind is the engine's contract with callers; the message is an opaque
/// human-facing string the host may replace or localize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleKind {
    ExclusiveCategory,
    Cooldown,
    Interaction,
    RateLimit,
}

/// An advisory warning. Never blocking: the caller decides whether to commit.
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    pub rule: RuleKind,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn is_hydration(drink_id: &str) -> bool {
    HYDRATION_DRINKS.contains(&drink_id)
}

fn is_depressant(drink_id: &str) -> bool {
    DEPRESSANT_DRINKS.contains(&drink_id)
}

/// Evaluate a candidate event against the ledger history.
///
/// Expert mode and custom drinks short-circuit to no warning. Unknown drink
/// ids get no exemption: they run through the rules like any other id and
/// simply fail to match the category sets.
pub fn evaluate(
    catalog: &Catalog,
    thresholds: &RuleThresholds,
    ledger: &RecordLedger,
    expert_mode: bool,
    drink_id: &str,
    portion: f64,
    now: DateTime<Utc>,
) -> Option<Warning> {
    if expert_mode || catalog.is_custom(drink_id) {
        return None;
    }

    // Rule 1: hydration and depressants are exclusive for the whole session,
    // no time window - one violating record anywhere is enough.
    let violates_exclusivity = (is_hydration(drink_id)
        && ledger.all().iter().any(|r| is_depressant(&r.drink_id)))
        || (is_depressant(drink_id) && ledger.all().iter().any(|r| is_hydration(&r.drink_id)));
    if violates_exclusivity {
        tracing::debug!("Exclusive-category rule hit for candidate {}", drink_id);
        return Some(Warning {
            rule: RuleKind::ExclusiveCategory,
            message: "water and depressant drinks (beer, whiskey) must not be mixed in one session"
                .into(),
        });
    }

    // Rule 2: same-drink cooldown for wine.
    if drink_id == COOLDOWN_DRINK {
        if let Some(last) = ledger.most_recent(Some(COOLDOWN_DRINK)) {
            let cooldown = Duration::minutes(thresholds.wine_cooldown_minutes);
            if now - last.recorded_at < cooldown {
                tracing::debug!("Cooldown rule hit for candidate {}", drink_id);
                return Some(Warning {
                    rule: RuleKind::Cooldown,
                    message: format!(
                        "less than {} minutes since the last wine",
                        thresholds.wine_cooldown_minutes
                    ),
                });
            }
        }
    }

    // Rule 3: cross-drink interaction, either order, judged against the
    // single most recent record regardless of drink.
    if let Some(last) = ledger.most_recent(None) {
        let (a, b) = INTERACTION_PAIR;
        let is_pair = (drink_id == a && last.drink_id == b) || (drink_id == b && last.drink_id == a);
        if is_pair && now - last.recorded_at <= Duration::hours(thresholds.interaction_window_hours)
        {
            tracing::debug!("Interaction rule hit for candidate {}", drink_id);
            return Some(Warning {
                rule: RuleKind::Interaction,
                message: format!(
                    "beer and melon within {} hours of each other is a blackout risk",
                    thresholds.interaction_window_hours
                ),
            });
        }
    }

    // Rule 4: rolling hydration cap over the trailing window.
    if is_hydration(drink_id) {
        let window = Duration::minutes(thresholds.hydration_window_minutes);
        let running: f64 = ledger
            .within(window, now, Some(drink_id))
            .iter()
            .map(|r| r.portion)
            .sum();
        if running + portion >= thresholds.hydration_cap_portions {
            tracing::debug!("Rate-limit rule hit for candidate {}", drink_id);
            return Some(Warning {
                rule: RuleKind::RateLimit,
                message: format!(
                    "over {} portions of water within {} minutes - space it out",
                    thresholds.hydration_cap_portions, thresholds.hydration_window_minutes
                ),
            });
        }
    }

    None
}
