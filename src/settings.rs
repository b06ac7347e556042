use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::PricePolicy;
use crate::error::{PartsError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub price_policy: PricePolicy,
    #[serde(default = "default_crawl_limit")]
    pub crawl_limit: usize,
    #[serde(default = "default_crawl_delay_secs")]
    pub crawl_delay_secs: f64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_crawl_limit() -> usize {
    3
}

fn default_crawl_delay_secs() -> f64 {
    1.0
}

fn default_request_timeout_secs() -> u64 {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            price_policy: PricePolicy::default(),
            crawl_limit: default_crawl_limit(),
            crawl_delay_secs: default_crawl_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("PARTSBIN_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("partsbin")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("partsbin")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| PartsError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

/// The data directory for this run: the `--data-dir` override when given,
/// otherwise the configured one.
pub fn resolve_data_dir(data_dir: Option<&str>, settings: &Settings) -> PathBuf {
    match data_dir {
        Some(dir) => PathBuf::from(shellexpand_path(dir)),
        None => PathBuf::from(&settings.data_dir),
    }
}

// ---------------------------------------------------------------------------
// Data directory layout
// ---------------------------------------------------------------------------

/// Fixed file locations under a data directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn orders_dir(&self) -> PathBuf {
        self.root.join("orders")
    }

    pub fn combined_csv(&self) -> PathBuf {
        self.root.join("combined.csv")
    }

    pub fn orders_csv(&self) -> PathBuf {
        self.root.join("orders.csv")
    }

    pub fn report(&self) -> PathBuf {
        self.root.join("README.md")
    }

    pub fn concatenated_csv(&self) -> PathBuf {
        self.root.join("concatenated.csv")
    }

    pub fn crawled_csv(&self) -> PathBuf {
        self.root.join("crawled_products.csv")
    }

    pub fn crawled_html(&self) -> PathBuf {
        self.root.join("crawled_products.html")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }
}
