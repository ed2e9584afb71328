//! Per-drink consumption totals.

use crate::ledger::RecordLedger;
use crate::types::Catalog;
use std::collections::BTreeMap;

/// Fold the ledger into per-drink portion totals.
///
/// Every catalog entry (custom ones included) starts at zero so the host
/// can render a full board; ledger entries whose drink id has since left
/// the catalog still accumulate under their own id. Pure and recomputed on
/// every call - there is no cached state to invalidate.
pub fn summarize(ledger: &RecordLedger, catalog: &Catalog) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = catalog
        .drinks
        .keys()
        .map(|id| (id.clone(), 0.0))
        .collect();

    for record in ledger.all() {
        *totals.entry(record.drink_id.clone()).or_insert(0.0) += record.portion;
    }

    totals
}
