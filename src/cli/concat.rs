use crate::error::Result;
use crate::pipeline::concatenate;
use crate::settings::{load_settings, resolve_data_dir, Layout};
use crate::store::write_materials;

pub fn run(data_dir: Option<String>) -> Result<()> {
    let layout = Layout::new(resolve_data_dir(data_dir.as_deref(), &load_settings()));
    let ingested = concatenate(&layout.orders_dir())?;
    write_materials(&layout.concatenated_csv(), &ingested.materials)?;
    println!(
        "{} rows from {} exports written to {}",
        ingested.materials.items.len(),
        ingested.orders.len(),
        layout.concatenated_csv().display()
    );
    Ok(())
}
