//! Per-model best offer.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use pricewatch_core::{BestOffer, CanonicalRow};

/// The cheapest in-stock row for each model.
///
/// Only rows with a finite `price_num` and `in_stock == Some(true)` compete;
/// a row with no stock signal is excluded, not treated as in stock. Ties go
/// to the row seen first, and a repeated `(site, url)` row counts once. A
/// model with no qualifying row has no entry.
#[must_use]
pub fn best_offers(rows: &[CanonicalRow]) -> BTreeMap<String, BestOffer> {
    let mut seen = HashSet::new();
    let mut best: BTreeMap<String, BestOffer> = BTreeMap::new();

    for row in rows {
        if !seen.insert(row.dedup_key()) || !row.is_comparable() {
            continue;
        }
        let Some(offer) = BestOffer::from_row(row) else {
            continue;
        };
        match best.entry(row.model.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(offer);
            }
            Entry::Occupied(mut slot) => {
                if offer.price_num < slot.get().price_num {
                    slot.insert(offer);
                }
            }
        }
    }

    best
}
