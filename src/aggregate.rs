use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PartsError, Result};
use crate::models::{round2, Column, LineItem, Materials};

/// How the extended price of a merged row is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum PricePolicy {
    /// Quantity sum times the highest unit price seen, rounded to cents.
    #[default]
    #[serde(rename = "recompute")]
    #[value(name = "recompute")]
    RecomputeFromMaxPrice,
    /// Keep the summed extended prices when the exports carried them.
    #[serde(rename = "sum")]
    #[value(name = "sum")]
    SumOfExtended,
}

fn sum_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (a, None) => a,
        (None, b) => b,
    }
}

fn max_price(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn keep_first(acc: &mut Option<String>, other: &Option<String>) {
    if acc.is_none() {
        acc.clone_from(other);
    }
}

fn add_quantity(acc: &LineItem, item: &LineItem) -> Result<Option<u64>> {
    match (acc.quantity, item.quantity) {
        (Some(a), Some(b)) => a.checked_add(b).map(Some).ok_or_else(|| {
            PartsError::QuantityOverflow {
                part: acc.part_number.clone().unwrap_or_default(),
            }
        }),
        (a, b) => Ok(a.or(b)),
    }
}

fn merge_into(acc: &mut LineItem, item: &LineItem) -> Result<()> {
    acc.quantity = add_quantity(acc, item)?;
    acc.unit_price = max_price(acc.unit_price, item.unit_price);
    acc.ext_price = sum_opt(acc.ext_price, item.ext_price);
    acc.last_update = acc.last_update.max(item.last_update);

    keep_first(&mut acc.mfr_part_number, &item.mfr_part_number);
    keep_first(&mut acc.mpn, &item.mpn);
    keep_first(&mut acc.description, &item.description);
    keep_first(&mut acc.package, &item.package);
    keep_first(&mut acc.manufacturer, &item.manufacturer);
    keep_first(&mut acc.order_id, &item.order_id);
    for (k, v) in &item.extra {
        acc.extra.entry(k.clone()).or_insert_with(|| v.clone());
    }
    Ok(())
}

fn settle_ext_price(item: &mut LineItem, policy: PricePolicy) {
    item.ext_price = match policy {
        PricePolicy::RecomputeFromMaxPrice => item.computed_ext_price().or(item.ext_price),
        PricePolicy::SumOfExtended => item
            .ext_price
            .map(round2)
            .or_else(|| item.computed_ext_price()),
    };
}

/// Merge rows sharing a part number into one row per part.
///
/// Groups keep the order in which their part first appeared. Rows with no
/// part number are passed through unmerged after the groups. Fails when a
/// part's summed quantity does not fit in a `u64`.
pub fn aggregate(table: &Materials, policy: PricePolicy) -> Result<Materials> {
    let mut groups: IndexMap<String, LineItem> = IndexMap::new();
    let mut unkeyed = Vec::new();

    for item in &table.items {
        let Some(part) = &item.part_number else {
            unkeyed.push(item.clone());
            continue;
        };
        match groups.entry(part.clone()) {
            Entry::Occupied(mut e) => merge_into(e.get_mut(), item)?,
            Entry::Vacant(e) => {
                e.insert(item.clone());
            }
        }
    }

    let mut items: Vec<LineItem> = groups.into_values().chain(unkeyed).collect();
    for item in &mut items {
        settle_ext_price(item, policy);
    }

    let mut columns = table.columns.clone();
    if items.iter().any(|i| i.ext_price.is_some()) && !columns.contains(&Column::ExtPrice) {
        columns.push(Column::ExtPrice);
    }

    Ok(Materials { columns, items })
}
