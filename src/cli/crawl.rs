use std::path::PathBuf;
use std::time::Duration;

use crate::crawler::{crawl, load_parts, write_html, write_records, CrawlOptions, HttpFetcher};
use crate::error::{PartsError, Result};
use crate::settings::{load_settings, resolve_data_dir, Layout};

pub struct CrawlArgs {
    pub data_dir: Option<String>,
    pub combined: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub limit: Option<usize>,
    pub sleep: Option<f64>,
    pub download_images: bool,
    pub image_dir: Option<PathBuf>,
    pub html_output: Option<PathBuf>,
}

pub fn run(args: CrawlArgs) -> Result<()> {
    let settings = load_settings();
    let layout = Layout::new(resolve_data_dir(args.data_dir.as_deref(), &settings));

    let sleep = args.sleep.unwrap_or(settings.crawl_delay_secs);
    let delay = Duration::try_from_secs_f64(sleep)
        .map_err(|_| PartsError::Other(format!("invalid --sleep value: {sleep}")))?;
    let opts = CrawlOptions {
        limit: args.limit.unwrap_or(settings.crawl_limit),
        delay,
        download_images: args.download_images,
        image_dir: args.image_dir.unwrap_or_else(|| layout.images_dir()),
    };

    let parts = load_parts(&args.combined.unwrap_or_else(|| layout.combined_csv()))?;
    let fetcher = HttpFetcher::new(Duration::from_secs(settings.request_timeout_secs))?;
    let records = crawl(&fetcher, &parts, &opts);

    if records.is_empty() {
        println!("No records saved");
        return Ok(());
    }

    let output = args.output.unwrap_or_else(|| layout.crawled_csv());
    write_records(&output, &records)?;
    println!("Saved {} records to {}", records.len(), output.display());

    let html = args.html_output.unwrap_or_else(|| layout.crawled_html());
    write_html(&html, &records)?;
    println!("Wrote HTML summary to {}", html.display());
    Ok(())
}
