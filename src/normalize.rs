use std::cmp::Ordering;

use crate::models::{Column, Materials};
use crate::orders::cmp_present_first;

/// Columns that change between exports and carry nothing for the BOM.
pub const NOISE_COLUMNS: &[&str] = &[
    "Customer NO.",
    "Date Code / Lot No.",
    "Estimated lead time (business days)",
];

/// Leading column layout of the aggregated table.
pub fn canonical_prefix() -> [Column; 6] {
    [
        Column::PartNumber,
        Column::MfrPartNumber,
        Column::Mpn,
        Column::Description,
        Column::Package,
        Column::Manufacturer,
    ]
}

pub fn normalize(table: &mut Materials) {
    drop_noise_columns(table);
    add_mpn_alias(table);
    move_description(table);
}

fn drop_noise_columns(table: &mut Materials) {
    table.columns.retain(|c| match c {
        Column::Other(name) => !NOISE_COLUMNS.contains(&name.as_str()),
        _ => true,
    });
    for item in &mut table.items {
        for name in NOISE_COLUMNS {
            item.extra.remove(*name);
        }
    }
}

/// `MPN` mirrors `Manufacture Part Number`; both columns are kept.
fn add_mpn_alias(table: &mut Materials) {
    let Some(pos) = table.position(&Column::MfrPartNumber) else {
        return;
    };
    for item in &mut table.items {
        item.mpn = item.mfr_part_number.clone();
    }
    if !table.has(&Column::Mpn) {
        table.columns.insert(pos + 1, Column::Mpn);
    }
}

fn move_description(table: &mut Materials) {
    let Some(pos) = table.position(&Column::Description) else {
        return;
    };
    let col = table.columns.remove(pos);
    let idx = 2.min(table.columns.len());
    table.columns.insert(idx, col);
}

// ---------------------------------------------------------------------------
// Final layout
// ---------------------------------------------------------------------------

/// Stable sort by package, then MPN. Missing values sort last.
pub fn sort_items(table: &mut Materials) {
    let by_package = table.has(&Column::Package);
    let by_mpn = table.has(&Column::Mpn);
    if !by_package && !by_mpn {
        return;
    }
    table.items.sort_by(|a, b| {
        let package = if by_package {
            cmp_present_first(&a.package, &b.package)
        } else {
            Ordering::Equal
        };
        package.then_with(|| {
            if by_mpn {
                cmp_present_first(&a.mpn, &b.mpn)
            } else {
                Ordering::Equal
            }
        })
    });
}

/// Put the canonical columns first, keeping everything else in order.
pub fn canonical_order(table: &mut Materials) {
    let prefix = canonical_prefix();
    let mut ordered: Vec<Column> = prefix
        .iter()
        .filter(|c| table.has(c))
        .cloned()
        .collect();
    ordered.extend(
        table
            .columns
            .iter()
            .filter(|c| !prefix.contains(c))
            .cloned(),
    );
    table.columns = ordered;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;

    fn cols(names: &[&str]) -> Vec<Column> {
        names.iter().map(|n| Column::from_header(n)).collect()
    }

    fn headers(table: &Materials) -> Vec<&str> {
        table.headers()
    }

    #[test]
    fn test_normalize_layout() {
        let mut item = LineItem {
            mfr_part_number: Some("RC0603".to_string()),
            ..Default::default()
        };
        item.extra.insert("Customer NO.".to_string(), "7".to_string());
        let mut table = Materials {
            columns: cols(&[
                "LCSC Part Number",
                "Manufacture Part Number",
                "Manufacturer",
                "Customer NO.",
                "Package",
                "Description",
                "Quantity",
            ]),
            items: vec![item],
        };
        normalize(&mut table);
        assert_eq!(
            headers(&table),
            vec![
                "LCSC Part Number",
                "Manufacture Part Number",
                "Description",
                "MPN",
                "Manufacturer",
                "Package",
                "Quantity",
            ]
        );
        assert_eq!(table.items[0].mpn.as_deref(), Some("RC0603"));
        assert!(table.items[0].extra.is_empty());
    }

    #[test]
    fn test_normalize_without_optional_columns() {
        let mut table = Materials {
            columns: cols(&["LCSC Part Number", "Quantity"]),
            items: vec![],
        };
        normalize(&mut table);
        assert_eq!(headers(&table), vec!["LCSC Part Number", "Quantity"]);
    }

    #[test]
    fn test_sort_items_missing_last() {
        let mk = |pkg: Option<&str>, mpn: Option<&str>| LineItem {
            package: pkg.map(str::to_string),
            mpn: mpn.map(str::to_string),
            ..Default::default()
        };
        let mut table = Materials {
            columns: cols(&["Package", "MPN"]),
            items: vec![
                mk(None, Some("A")),
                mk(Some("SOT-23"), Some("B")),
                mk(Some("0603"), None),
                mk(Some("0603"), Some("Z")),
            ],
        };
        sort_items(&mut table);
        let keys: Vec<(Option<&str>, Option<&str>)> = table
            .items
            .iter()
            .map(|i| (i.package.as_deref(), i.mpn.as_deref()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Some("0603"), Some("Z")),
                (Some("0603"), None),
                (Some("SOT-23"), Some("B")),
                (None, Some("A")),
            ]
        );
    }

    #[test]
    fn test_canonical_order() {
        let mut table = Materials {
            columns: cols(&[
                "Quantity",
                "Manufacturer",
                "LCSC Part Number",
                "Order ID",
                "Description",
                "MPN",
            ]),
            items: vec![],
        };
        canonical_order(&mut table);
        assert_eq!(
            headers(&table),
            vec![
                "LCSC Part Number",
                "MPN",
                "Description",
                "Manufacturer",
                "Quantity",
                "Order ID",
            ]
        );
    }
}
