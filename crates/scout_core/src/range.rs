//! Range inference over discovered item ids.
//!
//! The numeric segments of the discovered ids are treated as samples of a
//! contiguous block. The report spans the lowest to the highest observed
//! segment and lists every id inside that block that has not been seen yet.

use std::collections::BTreeMap;

use crate::item::{extract_numeric, with_numeric};
use crate::{DiscoveryLedger, ItemId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingId {
    pub id: ItemId,
    pub numeric: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeReport {
    pub low: u32,
    pub high: u32,
    pub total_range: u32,
    pub discovered_count: u32,
    pub missing: Vec<MissingId>,
}

/// Analyze the ids held by `ledger`. `None` when no id is well-formed.
pub fn analyze(ledger: &DiscoveryLedger) -> Option<RangeReport> {
    analyze_ids(ledger.ids().map(ItemId::as_str))
}

/// Analyze an arbitrary id set. Ids that do not match the item pattern are
/// skipped. Generation is linear in `high - low`, which the 5-digit segment
/// bounds to 100 000 candidates.
pub fn analyze_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Option<RangeReport> {
    // Sorted by segment; the first entry wins as the template for its value.
    let mut by_numeric: BTreeMap<u32, &str> = BTreeMap::new();
    for id in ids {
        match extract_numeric(id) {
            Some(numeric) => {
                by_numeric.entry(numeric).or_insert(id);
            }
            None => engine_logging::engine_debug!("Skipping id outside item pattern: {}", id),
        }
    }

    let (&low, &template) = by_numeric.first_key_value()?;
    let (&high, _) = by_numeric.last_key_value()?;

    let missing = (low..=high)
        .filter(|numeric| !by_numeric.contains_key(numeric))
        .filter_map(|numeric| {
            with_numeric(template, numeric).map(|id| MissingId { id, numeric })
        })
        .collect();

    Some(RangeReport {
        low,
        high,
        total_range: high - low + 1,
        discovered_count: by_numeric.len() as u32,
        missing,
    })
}
