pub mod concat;
pub mod crawl;
pub mod init;
pub mod report;
pub mod status;
pub mod update;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::aggregate::PricePolicy;

#[derive(Parser)]
#[command(
    name = "partsbin",
    about = "Merge LCSC order exports into a bill of materials.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create its orders/ folder.
    Init {
        /// Path for partsbin data (default: ~/Documents/partsbin)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Default extended price policy for merged parts
        #[arg(long = "price-policy", value_enum)]
        price_policy: Option<PricePolicy>,
    },
    /// Rebuild combined.csv, orders.csv and README.md from the order exports.
    Update {
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// recompute: quantity x max unit price; sum: keep summed extended prices
        #[arg(long = "price-policy", value_enum)]
        price_policy: Option<PricePolicy>,
    },
    /// Concatenate the order exports without merging parts.
    Concat {
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Re-render README.md from combined.csv and orders.csv.
    Report {
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Fetch product details for the parts in combined.csv.
    Crawl {
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Path to combined.csv
        #[arg(long)]
        combined: Option<PathBuf>,
        /// Where to write the crawled data CSV
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of parts to crawl, 0 for all (default: 3)
        #[arg(long)]
        limit: Option<usize>,
        /// Seconds to sleep between requests (default: 1.0)
        #[arg(long)]
        sleep: Option<f64>,
        /// Download product images
        #[arg(long = "download-images")]
        download_images: bool,
        /// Directory to save images when enabled
        #[arg(long = "image-dir")]
        image_dir: Option<PathBuf>,
        /// Write the HTML summary to this file
        #[arg(long = "html-output")]
        html_output: Option<PathBuf>,
    },
    /// Show settings and a summary of the current tables.
    Status {
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
}
