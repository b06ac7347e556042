use std::path::Path;

use crate::error::Result;
use crate::fmt::{count, date_or_unknown, money, or_unknown};
use crate::models::{Column, LineItem, Materials, OrderRecord};
use crate::store::create_parent;

/// Percent-encode a part id for use as a URL path segment. Only unreserved
/// characters are kept, so the result is also safe inside a Markdown link.
fn encode_segment(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for b in part.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

pub fn product_url(part: &str) -> String {
    format!("https://www.lcsc.com/product-detail/{}.html", encode_segment(part))
}

pub fn datasheet_url(part: &str) -> String {
    format!("https://www.lcsc.com/datasheet/{}.pdf", encode_segment(part))
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub items: usize,
    pub total_quantity: u64,
    pub total_value: f64,
}

pub fn summarize(table: &Materials) -> Summary {
    Summary {
        items: table.items.len(),
        total_quantity: table
            .items
            .iter()
            .filter_map(|i| i.quantity)
            .fold(0, u64::saturating_add),
        total_value: table.items.iter().filter_map(|i| i.ext_price).sum(),
    }
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

fn link(text: &str, url: &str) -> String {
    format!("[{}]({url})", escape_cell(text))
}

fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let escaped: Vec<String> = headers.iter().map(|h| escape_cell(h)).collect();
    out.push_str(&format!("| {} |\n", escaped.join(" | ")));
    out.push_str(&format!("| {} |\n", vec!["---"; headers.len()].join(" | ")));
    for row in rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out
}

pub fn orders_table(orders: &[OrderRecord]) -> String {
    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|o| {
            vec![
                escape_cell(or_unknown(o.order_id.as_deref())),
                date_or_unknown(o.last_update),
                escape_cell(&o.source_file),
                money(o.total_value),
            ]
        })
        .collect();
    markdown_table(&["Order ID", "Last Update", "Source File", "Total Value"], &rows)
}

fn materials_cell(item: &LineItem, column: &Column) -> String {
    let Some(text) = item.cell(column) else {
        return String::new();
    };
    match (column, item.part_number.as_deref()) {
        (Column::PartNumber, Some(part)) => link(&text, &product_url(part)),
        (Column::MfrPartNumber, Some(part)) => link(&text, &datasheet_url(part)),
        _ => escape_cell(&text),
    }
}

pub fn materials_table(table: &Materials) -> String {
    let rows: Vec<Vec<String>> = table
        .items
        .iter()
        .map(|item| table.columns.iter().map(|c| materials_cell(item, c)).collect())
        .collect();
    markdown_table(&table.headers(), &rows)
}

fn summary_block(summary: &Summary) -> String {
    format!(
        "- Line items: {}\n- Total quantity: {}\n- Total value: {}\n",
        count(summary.items as u64),
        count(summary.total_quantity),
        money(summary.total_value)
    )
}

pub fn render_report(table: &Materials, orders: &[OrderRecord]) -> String {
    let mut doc = String::from("# Materials List\n\n");
    doc.push_str("## Orders\n\n");
    doc.push_str(&orders_table(orders));
    doc.push_str("\n## Summary\n\n");
    doc.push_str(&summary_block(&summarize(table)));
    doc.push_str("\n## Materials\n\n");
    doc.push_str(&materials_table(table));
    doc
}

/// Write the report, replacing any previous version.
pub fn write_report(path: &Path, table: &Materials, orders: &[OrderRecord]) -> Result<()> {
    create_parent(path)?;
    std::fs::write(path, render_report(table, orders))?;
    Ok(())
}
