use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{PartsError, Result};
use crate::models::{Column, DateOrigin, LineItem, Materials, OrderRecord, OrderSource};
use crate::orders::order_total;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a money-like cell: `$1,234.56`, ` 0.12 `. Negative or non-numeric
/// values are rejected.
pub fn parse_price(raw: &str) -> Option<f64> {
    let s = raw.trim().replace([',', '$'], "");
    let val: f64 = s.trim().parse().ok()?;
    (val.is_finite() && val >= 0.0).then_some(val)
}

/// Parse a quantity cell. Accepts `10` and the `10.0` spelling spreadsheet
/// tools produce for integer columns.
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let s = raw.trim().replace(',', "");
    if let Ok(q) = s.parse::<u64>() {
        return Some(q);
    }
    let f: f64 = s.parse().ok()?;
    let in_range = f.is_finite() && f >= 0.0 && f < u64::MAX as f64;
    (in_range && f.fract() == 0.0).then_some(f as u64)
}

pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Export filenames
// ---------------------------------------------------------------------------

fn filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^_]+__(?P<order>[^_]+)_(?P<date>\d{8})\d*\.[A-Za-z0-9]+$").unwrap()
    })
}

fn embedded_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{2}(\d{2})(\d{2})(\d{2})").unwrap())
}

/// Date embedded in an order id such as `WM231015xxxx` (two letters, YYMMDD).
pub fn date_from_order_id(order_id: &str) -> Option<NaiveDate> {
    let caps = embedded_date_re().captures(order_id)?;
    let yy: i32 = caps[1].parse().ok()?;
    let mm: u32 = caps[2].parse().ok()?;
    let dd: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + yy, mm, dd)
}

/// Parse `<PREFIX>__<ORDER_ID>_<YYYYMMDD><digits>.<ext>`.
///
/// The order date comes from the order id when it embeds one, otherwise from
/// the 8-digit filename segment. Returns `None` when the name does not follow
/// the export pattern at all.
pub fn parse_order_filename(name: &str) -> Option<OrderSource> {
    let caps = filename_re().captures(name)?;
    let order_id = caps["order"].to_string();

    if let Some(date) = date_from_order_id(&order_id) {
        return Some(OrderSource {
            order_id,
            order_date: Some(date),
            date_origin: Some(DateOrigin::OrderId),
        });
    }

    let date = NaiveDate::parse_from_str(&caps["date"], "%Y%m%d").ok();
    Some(OrderSource {
        order_id,
        order_date: date,
        date_origin: date.map(|_| DateOrigin::Filename),
    })
}

// ---------------------------------------------------------------------------
// Reading tables
// ---------------------------------------------------------------------------

/// All CSV files directly inside `dir`, sorted by file name so that
/// first-occurrence picks are stable across platforms.
pub fn discover_exports(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort_by_key(|p| file_name(p));
    Ok(files)
}

fn set_cell(item: &mut LineItem, column: &Column, raw: &str) -> std::result::Result<(), ()> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(());
    }
    match column {
        Column::Quantity => item.quantity = Some(parse_quantity(value).ok_or(())?),
        Column::UnitPrice => item.unit_price = Some(parse_price(value).ok_or(())?),
        Column::ExtPrice => item.ext_price = Some(parse_price(value).ok_or(())?),
        Column::LastUpdate => item.last_update = parse_iso_date(value),
        Column::Other(name) => {
            item.extra.insert(name.clone(), value.to_string());
        }
        text => {
            if let Some(slot) = item.text_mut(text) {
                *slot = Some(value.to_string());
            }
        }
    }
    Ok(())
}

/// Read a CSV table into typed rows. Column presence is decided here, from
/// the header row, and nowhere else.
pub fn read_table(path: &Path) -> Result<Materials> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let header_columns: Vec<Column> = rdr
        .headers()?
        .iter()
        .map(|h| Column::from_header(h.trim_start_matches('\u{feff}')))
        .collect();
    let mut columns: Vec<Column> = Vec::new();
    for column in &header_columns {
        if !columns.contains(column) {
            columns.push(column.clone());
        }
    }

    let mut items = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        let mut item = LineItem::default();
        for (column, raw) in header_columns.iter().zip(record.iter()) {
            set_cell(&mut item, column, raw).map_err(|_| PartsError::InvalidNumber {
                file: file_name(path),
                line,
                column: column.header().to_string(),
                value: raw.trim().to_string(),
            })?;
        }
        items.push(item);
    }

    Ok(Materials { columns, items })
}

// ---------------------------------------------------------------------------
// ingest_dir
// ---------------------------------------------------------------------------

pub struct Ingested {
    pub materials: Materials,
    pub orders: Vec<OrderRecord>,
    /// Export files skipped because an identical file was already read.
    pub skipped: Vec<String>,
}

/// Read every export in `dir`, tag rows with their order id and date, and
/// concatenate them in file order.
pub fn ingest_dir(dir: &Path) -> Result<Ingested> {
    let files = discover_exports(dir)?;
    if files.is_empty() {
        return Err(PartsError::NoExports(dir.display().to_string()));
    }

    let mut materials = Materials::default();
    let mut orders = Vec::new();
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();

    for path in &files {
        let name = file_name(path);
        if !seen.insert(compute_checksum(path)?) {
            warn!(file = %name, "identical export already ingested, skipping");
            skipped.push(name);
            continue;
        }

        let mut table = read_table(path)?;
        let source = parse_order_filename(&name);
        match &source {
            Some(src) => debug!(file = %name, order = %src.order_id, date_from = ?src.date_origin, "parsed export filename"),
            None => warn!(file = %name, "filename does not match the export pattern; order unknown"),
        }
        let order_id = source.as_ref().map(|s| s.order_id.clone());
        let order_date = source.as_ref().and_then(|s| s.order_date);

        for item in &mut table.items {
            item.order_id = order_id.clone();
            item.last_update = order_date;
        }
        table.ensure_column(Column::OrderId);
        table.ensure_column(Column::LastUpdate);

        orders.push(OrderRecord {
            order_id,
            last_update: order_date,
            source_file: name.clone(),
            total_value: order_total(&table),
        });
        info!(file = %name, rows = table.items.len(), "ingested export");

        for column in table.columns {
            materials.ensure_column(column);
        }
        materials.items.extend(table.items);
    }

    Ok(Ingested {
        materials,
        orders,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "LCSC Part Number,Manufacture Part Number,Manufacturer,Customer NO.,Package,Description,Quantity,Unit Price($),Ext.Price($)\n";

    fn write_export(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut content = String::from(HEADER);
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("0.12"), Some(0.12));
        assert_eq!(parse_price(" $1,234.50 "), Some(1234.5));
        assert_eq!(parse_price("-1"), None);
        assert_eq!(parse_price("abc"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("10"), Some(10));
        assert_eq!(parse_quantity("1,000"), Some(1000));
        assert_eq!(parse_quantity("10.0"), Some(10));
        assert_eq!(parse_quantity("10.5"), None);
        assert_eq!(parse_quantity("-3"), None);
        assert_eq!(parse_quantity("1e20"), None);
        assert_eq!(parse_quantity("18446744073709551615"), Some(u64::MAX));
    }

    #[test]
    fn test_filename_with_embedded_date() {
        let src = parse_order_filename("LCSC__WM231015xxxx_20250821103144.csv").unwrap();
        assert_eq!(src.order_id, "WM231015xxxx");
        assert_eq!(src.order_date, NaiveDate::from_ymd_opt(2023, 10, 15));
        assert_eq!(src.date_origin, Some(DateOrigin::OrderId));
    }

    #[test]
    fn test_filename_falls_back_to_timestamp() {
        let src = parse_order_filename("LCSC__SO9876543_20250821103144.csv").unwrap();
        assert_eq!(src.order_id, "SO9876543");
        assert_eq!(src.order_date, NaiveDate::from_ymd_opt(2025, 8, 21));
        assert_eq!(src.date_origin, Some(DateOrigin::Filename));
    }

    #[test]
    fn test_filename_embedded_date_invalid_uses_timestamp() {
        // WM239915: month 99 is not a date
        let src = parse_order_filename("LCSC__WM239915AB_20240102000000.csv").unwrap();
        assert_eq!(src.order_date, NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn test_filename_without_valid_date() {
        let src = parse_order_filename("LCSC__SO1_20241399.csv").unwrap();
        assert_eq!(src.order_id, "SO1");
        assert_eq!(src.order_date, None);
        assert_eq!(src.date_origin, None);
    }

    #[test]
    fn test_filename_not_matching() {
        assert!(parse_order_filename("bom.csv").is_none());
        assert!(parse_order_filename("LCSC_WM231015_20250821.csv").is_none());
    }

    #[test]
    fn test_read_table_typed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), "a.csv", &["C1,RC0603,Yageo,42,0603,Resistor,10,0.10,1.00"]);
        let table = read_table(&path).unwrap();
        assert_eq!(table.columns.len(), 9);
        assert_eq!(table.items.len(), 1);
        let item = &table.items[0];
        assert_eq!(item.part_number.as_deref(), Some("C1"));
        assert_eq!(item.quantity, Some(10));
        assert_eq!(item.unit_price, Some(0.10));
        assert_eq!(item.extra.get("Customer NO.").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_read_table_rejects_bad_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), "bad.csv", &["C1,RC0603,Yageo,,0603,Resistor,ten,0.10,1.00"]);
        let err = read_table(&path).unwrap_err();
        match err {
            PartsError::InvalidNumber { column, value, line, .. } => {
                assert_eq!(column, "Quantity");
                assert_eq!(value, "ten");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_table_empty_cells_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), "a.csv", &[",,,,,,5,,"]);
        let table = read_table(&path).unwrap();
        let item = &table.items[0];
        assert_eq!(item.part_number, None);
        assert_eq!(item.unit_price, None);
        assert_eq!(item.quantity, Some(5));
    }

    #[test]
    fn test_ingest_dir_tags_rows_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path(), "LCSC__WM231015AAAA_20250821103144.csv", &[
            "C1,RC0603,Yageo,,0603,Resistor,10,0.10,1.00",
            "C2,CL10,Samsung,,0603,Capacitor,20,0.02,0.40",
        ]);
        write_export(dir.path(), "misc.csv", &["C3,LM358,TI,,SOIC-8,Op amp,1,0.30,"]);

        let ingested = ingest_dir(dir.path()).unwrap();
        assert_eq!(ingested.materials.items.len(), 3);
        assert!(ingested.materials.has(&Column::OrderId));
        assert!(ingested.materials.has(&Column::LastUpdate));

        // sorted by name: uppercase "LCSC__" before "misc"
        let first = &ingested.materials.items[0];
        assert_eq!(first.order_id.as_deref(), Some("WM231015AAAA"));
        assert_eq!(first.last_update, NaiveDate::from_ymd_opt(2023, 10, 15));
        let last = &ingested.materials.items[2];
        assert_eq!(last.order_id, None);
        assert_eq!(last.last_update, None);

        assert_eq!(ingested.orders.len(), 2);
        assert_eq!(ingested.orders[0].total_value, 1.4);
        assert_eq!(ingested.orders[1].source_file, "misc.csv");
    }

    #[test]
    fn test_ingest_dir_skips_identical_exports() {
        let dir = tempfile::tempdir().unwrap();
        let rows = ["C1,RC0603,Yageo,,0603,Resistor,10,0.10,1.00"];
        write_export(dir.path(), "LCSC__SO1_20240101000000.csv", &rows);
        write_export(dir.path(), "LCSC__SO1_20240101000000 (1).csv", &rows);
        let ingested = ingest_dir(dir.path()).unwrap();
        assert_eq!(ingested.materials.items.len(), 1);
        assert_eq!(ingested.skipped.len(), 1);
    }

    #[test]
    fn test_ingest_dir_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(ingest_dir(dir.path()), Err(PartsError::NoExports(_))));
    }
}
