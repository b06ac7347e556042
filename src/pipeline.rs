use std::path::Path;

use tracing::info;

use crate::aggregate::{aggregate, PricePolicy};
use crate::error::Result;
use crate::importer::{ingest_dir, Ingested};
use crate::models::{Materials, OrderRecord};
use crate::normalize::{canonical_order, normalize, sort_items};
use crate::orders::dedupe_orders;

pub struct Build {
    pub materials: Materials,
    pub orders: Vec<OrderRecord>,
    /// Rows read across all exports, before merging.
    pub source_rows: usize,
    pub skipped: Vec<String>,
}

/// Read and normalize every export without merging anything.
pub fn concatenate(orders_dir: &Path) -> Result<Ingested> {
    let mut ingested = ingest_dir(orders_dir)?;
    normalize(&mut ingested.materials);
    Ok(ingested)
}

/// Build the aggregated materials table and the orders table from scratch.
pub fn build(orders_dir: &Path, policy: PricePolicy) -> Result<Build> {
    let ingested = concatenate(orders_dir)?;
    let source_rows = ingested.materials.items.len();

    let mut materials = aggregate(&ingested.materials, policy)?;
    sort_items(&mut materials);
    canonical_order(&mut materials);
    info!(
        rows = source_rows,
        parts = materials.items.len(),
        policy = ?policy,
        "aggregated materials"
    );

    Ok(Build {
        materials,
        orders: dedupe_orders(&ingested.orders),
        source_rows,
        skipped: ingested.skipped,
    })
}
