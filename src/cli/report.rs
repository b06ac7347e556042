use crate::error::{PartsError, Result};
use crate::reports::write_report;
use crate::settings::{load_settings, resolve_data_dir, Layout};
use crate::store::{read_materials, read_orders};

/// Re-render the report from the persisted tables without touching the
/// exports.
pub fn run(data_dir: Option<String>) -> Result<()> {
    let layout = Layout::new(resolve_data_dir(data_dir.as_deref(), &load_settings()));
    let combined = layout.combined_csv();
    if !combined.exists() {
        return Err(PartsError::Other(format!(
            "No aggregated table at {}\nRun `partsbin update` first.",
            combined.display()
        )));
    }

    let materials = read_materials(&combined)?;
    let orders = if layout.orders_csv().exists() {
        read_orders(&layout.orders_csv())?
    } else {
        Vec::new()
    };
    write_report(&layout.report(), &materials, &orders)?;
    println!("Wrote {}", layout.report().display());
    Ok(())
}
