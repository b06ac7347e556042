use std::cmp::Ordering;

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::models::{round2, Materials, OrderRecord};

/// Total value of one export: each row's extended price, or quantity times
/// unit price where the export left it blank.
pub fn order_total(table: &Materials) -> f64 {
    let total: f64 = table
        .items
        .iter()
        .map(|item| {
            item.ext_price
                .or_else(|| item.computed_ext_price())
                .unwrap_or(0.0)
        })
        .sum();
    round2(total)
}

/// Compare optional keys ascending with absent values last.
pub fn cmp_present_first<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Keep one record per order id: the one with the most recent date. Records
/// without a date count as oldest; on equal dates the first one read wins.
/// Records without an order id are treated as a single order.
///
/// The result is sorted newest first, then by order id.
pub fn dedupe_orders(records: &[OrderRecord]) -> Vec<OrderRecord> {
    let mut latest: IndexMap<Option<String>, OrderRecord> = IndexMap::new();
    for rec in records {
        match latest.entry(rec.order_id.clone()) {
            Entry::Occupied(mut e) => {
                if rec.last_update > e.get().last_update {
                    e.insert(rec.clone());
                }
            }
            Entry::Vacant(e) => {
                e.insert(rec.clone());
            }
        }
    }

    let mut out: Vec<OrderRecord> = latest.into_values().collect();
    out.sort_by(|a, b| {
        b.last_update
            .cmp(&a.last_update)
            .then_with(|| cmp_present_first(&a.order_id, &b.order_id))
    });
    out
}
