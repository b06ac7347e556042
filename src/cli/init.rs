use std::path::PathBuf;

use crate::aggregate::PricePolicy;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_file_exists, shellexpand_path, Layout};

pub fn run(data_dir: Option<String>, price_policy: Option<PricePolicy>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    } else if !settings_file_exists() {
        // First run: ask where the data lives
        println!("Data directory [{}]: ", settings.data_dir);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok();
        let chosen = input.trim();
        if !chosen.is_empty() {
            settings.data_dir = shellexpand_path(chosen);
        }
    }
    if let Some(policy) = price_policy {
        settings.price_policy = policy;
    }

    save_settings(&settings)?;

    let layout = Layout::new(PathBuf::from(&settings.data_dir));
    std::fs::create_dir_all(layout.orders_dir())?;

    println!("Initialized partsbin at {}", layout.root().display());
    println!("Drop LCSC order exports into {}", layout.orders_dir().display());
    Ok(())
}
