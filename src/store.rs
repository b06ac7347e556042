use std::path::Path;

use crate::error::{PartsError, Result};
use crate::importer::{parse_iso_date, parse_price, read_table};
use crate::models::{Materials, OrderRecord};

pub const ORDER_HEADERS: [&str; 4] = ["Order ID", "Last Update", "Source File", "Total Value($)"];

/// Create the directory a file is about to be written into.
pub(crate) fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write the table with its column order. Absent cells are written empty.
pub fn write_materials(path: &Path, table: &Materials) -> Result<()> {
    create_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(table.headers())?;
    for item in &table.items {
        let row: Vec<String> = table
            .columns
            .iter()
            .map(|c| item.cell(c).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_materials(path: &Path) -> Result<Materials> {
    read_table(path)
}

pub fn write_orders(path: &Path, orders: &[OrderRecord]) -> Result<()> {
    create_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(ORDER_HEADERS)?;
    for order in orders {
        wtr.write_record([
            order.order_id.clone().unwrap_or_default(),
            order
                .last_update
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            order.source_file.clone(),
            format!("{:.2}", order.total_value),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_orders(path: &Path) -> Result<Vec<OrderRecord>> {
    let file_name = path.display().to_string();
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    let idx = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PartsError::MissingColumn {
                file: file_name.clone(),
                column: name.to_string(),
            })
    };
    let (i_id, i_date, i_src, i_total) = (
        idx(ORDER_HEADERS[0])?,
        idx(ORDER_HEADERS[1])?,
        idx(ORDER_HEADERS[2])?,
        idx(ORDER_HEADERS[3])?,
    );

    let mut orders = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let field = |i: usize| record.get(i).map(str::trim).unwrap_or("");
        let raw_total = field(i_total);
        let total_value = if raw_total.is_empty() {
            0.0
        } else {
            parse_price(raw_total).ok_or_else(|| PartsError::InvalidNumber {
                file: file_name.clone(),
                line: record.position().map_or(0, |p| p.line()),
                column: ORDER_HEADERS[3].to_string(),
                value: raw_total.to_string(),
            })?
        };
        let id = field(i_id);
        orders.push(OrderRecord {
            order_id: (!id.is_empty()).then(|| id.to_string()),
            last_update: parse_iso_date(field(i_date)),
            source_file: field(i_src).to_string(),
            total_value,
        });
    }
    Ok(orders)
}
