use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::aggregate::PricePolicy;
use crate::error::Result;
use crate::fmt::{count, money};
use crate::pipeline::build;
use crate::reports::{summarize, write_report};
use crate::settings::{load_settings, resolve_data_dir, Layout};
use crate::store::{write_materials, write_orders};

pub fn run(data_dir: Option<String>, price_policy: Option<PricePolicy>) -> Result<()> {
    let settings = load_settings();
    let layout = Layout::new(resolve_data_dir(data_dir.as_deref(), &settings));
    let policy = price_policy.unwrap_or(settings.price_policy);

    let out = build(&layout.orders_dir(), policy)?;

    write_materials(&layout.combined_csv(), &out.materials)?;
    write_orders(&layout.orders_csv(), &out.orders)?;
    write_report(&layout.report(), &out.materials, &out.orders)?;

    let summary = summarize(&out.materials);
    let mut table = Table::new();
    table.add_row(vec![Cell::new("Orders"), Cell::new(out.orders.len())]);
    table.add_row(vec![Cell::new("Rows read"), Cell::new(count(out.source_rows as u64))]);
    table.add_row(vec![Cell::new("Line items"), Cell::new(count(summary.items as u64))]);
    table.add_row(vec![Cell::new("Total quantity"), Cell::new(count(summary.total_quantity))]);
    table.add_row(vec![
        Cell::new("Total value".bold()),
        Cell::new(money(summary.total_value)),
    ]);
    println!("Materials updated\n{table}");

    for name in &out.skipped {
        println!("{} {name} (identical to an earlier export)", "Skipped".yellow());
    }
    println!("Wrote {}", layout.combined_csv().display());
    println!("Wrote {}", layout.orders_csv().display());
    println!("Wrote {}", layout.report().display());
    Ok(())
}
