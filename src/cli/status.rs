use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::{count, money};
use crate::importer::discover_exports;
use crate::reports::summarize;
use crate::settings::{load_settings, resolve_data_dir, Layout};
use crate::store::{read_materials, read_orders};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let settings = load_settings();
    let layout = Layout::new(resolve_data_dir(data_dir.as_deref(), &settings));

    println!("Data dir:      {}", layout.root().display());
    println!("Price policy:  {:?}", settings.price_policy);
    println!("Crawl limit:   {}", settings.crawl_limit);

    let orders_dir = layout.orders_dir();
    if !orders_dir.is_dir() {
        println!();
        println!("No orders directory. Run `partsbin init` to set up.");
        return Ok(());
    }
    println!("Exports:       {}", discover_exports(&orders_dir)?.len());

    let combined = layout.combined_csv();
    if !combined.exists() {
        println!();
        println!("No aggregated table yet. Run `partsbin update`.");
        return Ok(());
    }

    let summary = summarize(&read_materials(&combined)?);
    let orders = if layout.orders_csv().exists() {
        read_orders(&layout.orders_csv())?.len()
    } else {
        0
    };

    let mut table = Table::new();
    table.set_header(vec!["Orders", "Line items", "Total quantity", "Total value"]);
    table.add_row(vec![
        Cell::new(orders),
        Cell::new(count(summary.items as u64)),
        Cell::new(count(summary.total_quantity)),
        Cell::new(money(summary.total_value)),
    ]);
    println!();
    println!("{table}");
    Ok(())
}
