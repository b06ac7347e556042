use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PartsError, Result};
use crate::models::{ProductRecord, PART_NUMBER};
use crate::reports::product_url;
use crate::store::create_parent;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Blocking GET access. Non-success statuses are errors.
pub trait Fetch {
    fn get_text(&self, url: &str) -> Result<String>;
    fn get_bytes(&self, url: &str) -> Result<Fetched>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()?
            .error_for_status()?;
        Ok(resp.text()?)
    }

    fn get_bytes(&self, url: &str) -> Result<Fetched> {
        let resp = self.client.get(url).send()?.error_for_status()?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes()?.to_vec();
        Ok(Fetched {
            bytes,
            content_type,
        })
    }
}

// ---------------------------------------------------------------------------
// Page parsing
// ---------------------------------------------------------------------------

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PartsError::Other(format!("bad selector {css}: {e}")))
}

/// Strings and numbers as text; anything else is absent.
fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_product(value: &Value) -> bool {
    value.get("@type").and_then(Value::as_str) == Some("Product")
}

fn find_product(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(_) if is_product(value) => Some(value),
        Value::Array(items) => items.iter().find(|v| v.is_object() && is_product(v)),
        _ => None,
    }
}

fn json_ld_product(doc: &Html) -> Result<Option<Value>> {
    let sel = selector(r#"script[type="application/ld+json"]"#)?;
    for script in doc.select(&sel) {
        let text: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(text.trim()) else {
            continue;
        };
        if let Some(product) = find_product(&value) {
            return Ok(Some(product.clone()));
        }
    }
    Ok(None)
}

fn meta_content(doc: &Html, key: &str) -> Result<Option<String>> {
    for attr in ["property", "name"] {
        let sel = selector(&format!(r#"meta[{attr}="{key}"]"#))?;
        let content = doc
            .select(&sel)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty());
        if let Some(content) = content {
            return Ok(Some(content.to_string()));
        }
    }
    Ok(None)
}

fn first_image(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Array(items) => json_text(items.first()),
        other => json_text(Some(other)),
    }
}

/// Extract public product fields from a product detail page. The JSON-LD
/// `Product` block wins; meta tags fill whatever it leaves empty.
pub fn parse_product_page(html: &str, part: &str) -> Result<ProductRecord> {
    let doc = Html::parse_document(html);
    let mut record = ProductRecord {
        part_number: part.to_string(),
        product_url: product_url(part),
        ..Default::default()
    };

    if let Some(product) = json_ld_product(&doc)? {
        record.name = json_text(product.get("name")).or_else(|| json_text(product.get("title")));
        record.brand = match product.get("brand") {
            Some(brand) if brand.is_object() => json_text(brand.get("name")),
            other => json_text(other),
        };
        record.sku = json_text(product.get("sku"));
        record.description = json_text(product.get("description"));
        let offers = match product.get("offers") {
            Some(Value::Array(list)) => list.first(),
            other => other,
        };
        if let Some(offer) = offers.filter(|o| o.is_object()) {
            record.price = json_text(offer.get("price"));
            record.currency = json_text(offer.get("priceCurrency"));
        }
        record.image_url = first_image(product.get("image"));
    }

    if record.name.is_none() {
        record.name = meta_content(&doc, "og:title")?;
    }
    if record.description.is_none() {
        record.description = meta_content(&doc, "description")?;
    }
    if record.image_url.is_none() {
        record.image_url = meta_content(&doc, "og:image")?;
    }
    Ok(record)
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// File extension for an image content type, `.jpg` when unknown.
pub fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "image/bmp" => ".bmp",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        "image/avif" => ".avif",
        _ => ".jpg",
    }
}

pub fn download_image<F: Fetch>(fetcher: &F, url: &str, dest_dir: &Path, part: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dest_dir)?;
    let fetched = fetcher.get_bytes(url)?;
    let ext = extension_for(fetched.content_type.as_deref().unwrap_or("image/jpeg"));
    let path = dest_dir.join(format!("{part}{ext}"));
    std::fs::write(&path, &fetched.bytes)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Crawl loop
// ---------------------------------------------------------------------------

/// Part numbers listed in an aggregated table, blanks skipped.
pub fn load_parts(path: &Path) -> Result<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == PART_NUMBER)
        .ok_or_else(|| PartsError::MissingColumn {
            file: path.display().to_string(),
            column: PART_NUMBER.to_string(),
        })?;
    let mut parts = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if let Some(part) = record.get(idx).map(str::trim).filter(|p| !p.is_empty()) {
            parts.push(part.to_string());
        }
    }
    Ok(parts)
}

pub struct CrawlOptions {
    /// Zero means no limit.
    pub limit: usize,
    pub delay: Duration,
    pub download_images: bool,
    pub image_dir: PathBuf,
}

fn crawl_one<F: Fetch>(fetcher: &F, part: &str, opts: &CrawlOptions) -> Result<ProductRecord> {
    let url = product_url(part);
    debug!(%url, "fetching");
    let html = fetcher.get_text(&url)?;
    let mut record = parse_product_page(&html, part)?;
    if opts.download_images {
        if let Some(image_url) = record.image_url.clone() {
            let saved = download_image(fetcher, &image_url, &opts.image_dir, part)?;
            record.image_path = Some(saved.display().to_string());
        }
    }
    Ok(record)
}

/// Fetch parts one at a time. A part that fails is logged and left out; the
/// rest of the batch carries on.
pub fn crawl<F: Fetch>(fetcher: &F, parts: &[String], opts: &CrawlOptions) -> Vec<ProductRecord> {
    let parts = if opts.limit > 0 && opts.limit < parts.len() {
        &parts[..opts.limit]
    } else {
        parts
    };
    info!(count = parts.len(), limit = opts.limit, "crawling parts");

    let mut records = Vec::new();
    for part in parts {
        match crawl_one(fetcher, part, opts) {
            Ok(record) => {
                debug!(part = %part, name = ?record.name, price = ?record.price, "parsed");
                records.push(record);
            }
            Err(e) => warn!(part = %part, error = %e, "failed to crawl part"),
        }
        if !opts.delay.is_zero() {
            std::thread::sleep(opts.delay);
        }
    }
    records
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

pub const RECORD_HEADERS: [&str; 10] = [
    PART_NUMBER,
    "product_url",
    "name",
    "brand",
    "sku",
    "description",
    "price",
    "currency",
    "image_url",
    "image_path",
];

pub fn write_records(path: &Path, records: &[ProductRecord]) -> Result<()> {
    create_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(RECORD_HEADERS)?;
    for r in records {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        wtr.write_record([
            r.part_number.clone(),
            r.product_url.clone(),
            opt(&r.name),
            opt(&r.brand),
            opt(&r.sku),
            opt(&r.description),
            opt(&r.price),
            opt(&r.currency),
            opt(&r.image_url),
            opt(&r.image_path),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn esc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_row(r: &ProductRecord) -> String {
    let part = esc(&r.part_number);
    let opt = |v: &Option<String>| v.as_deref().map(esc).unwrap_or_default();
    let image = match r.image_path.as_ref().or(r.image_url.as_ref()) {
        Some(src) => format!(
            r#"<img src="{}" alt="{part}" width="160" loading="lazy">"#,
            esc(src)
        ),
        None => String::new(),
    };
    let name = r.name.as_deref().map(esc).unwrap_or_else(|| part.clone());
    format!(
        "<tr><td>{image}</td><td><a href=\"{}\" target=\"_blank\" rel=\"noreferrer\">{part}</a></td>\
         <td>{name}</td><td>{}</td><td>{} {}</td><td>{}</td></tr>",
        esc(&r.product_url),
        opt(&r.brand),
        opt(&r.price),
        opt(&r.currency),
        opt(&r.description),
    )
}

pub fn render_html(records: &[ProductRecord]) -> String {
    let rows: Vec<String> = records.iter().map(html_row).collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>LCSC Crawl Results</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 24px; background: #f8f9fb; }}
        table {{ width: 100%; border-collapse: collapse; background: #fff; }}
        th, td {{ border: 1px solid #e2e6eb; padding: 8px 10px; vertical-align: top; }}
        th {{ background: #eef2f7; text-align: left; }}
        img {{ display: block; max-width: 160px; height: auto; }}
    </style>
</head>
<body>
    <h1>LCSC Crawl Results</h1>
    <table>
        <thead>
            <tr><th>Image</th><th>LCSC Part Number</th><th>Name</th><th>Brand</th><th>Price</th><th>Description</th></tr>
        </thead>
        <tbody>
{}
        </tbody>
    </table>
</body>
</html>
"#,
        rows.join("\n")
    )
}

pub fn write_html(path: &Path, records: &[ProductRecord]) -> Result<()> {
    create_parent(path)?;
    std::fs::write(path, render_html(records))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const PRODUCT_PAGE: &str = r#"<html><head>
<meta property="og:title" content="Meta title">
<meta name="description" content="Meta description">
<script type="application/ld+json">{"@type": "BreadcrumbList"}</script>
<script type="application/ld+json">
[{"@type": "Organization"},
 {"@type": "Product", "name": "10kΩ 0603 Resistor", "brand": {"@type": "Brand", "name": "UNI-ROYAL"},
  "sku": "C25804", "offers": {"price": 0.0012, "priceCurrency": "USD"},
  "image": ["https://assets.example/C25804.jpg", "https://assets.example/2.jpg"]}]
</script></head><body></body></html>"#;

    const META_ONLY_PAGE: &str = r#"<html><head>
<meta property="og:title" content="Only meta">
<meta name="description" content="From meta">
<meta property="og:image" content="https://assets.example/meta.png">
<script type="application/ld+json">not json</script>
</head></html>"#;

    struct FakeFetcher {
        pages: HashMap<String, String>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(part, html)| (product_url(part), html.to_string()))
                    .collect(),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetch for FakeFetcher {
        fn get_text(&self, url: &str) -> Result<String> {
            self.requests.borrow_mut().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| PartsError::Other(format!("404 Not Found: {url}")))
        }

        fn get_bytes(&self, url: &str) -> Result<Fetched> {
            self.requests.borrow_mut().push(url.to_string());
            Ok(Fetched {
                bytes: vec![0x89, b'P', b'N', b'G'],
                content_type: Some("image/png; charset=binary".to_string()),
            })
        }
    }

    fn opts(limit: usize, image_dir: &Path, download: bool) -> CrawlOptions {
        CrawlOptions {
            limit,
            delay: Duration::ZERO,
            download_images: download,
            image_dir: image_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_parse_json_ld_product() {
        let rec = parse_product_page(PRODUCT_PAGE, "C25804").unwrap();
        assert_eq!(rec.name.as_deref(), Some("10kΩ 0603 Resistor"));
        assert_eq!(rec.brand.as_deref(), Some("UNI-ROYAL"));
        assert_eq!(rec.sku.as_deref(), Some("C25804"));
        assert_eq!(rec.price.as_deref(), Some("0.0012"));
        assert_eq!(rec.currency.as_deref(), Some("USD"));
        assert_eq!(rec.image_url.as_deref(), Some("https://assets.example/C25804.jpg"));
        // JSON-LD had no description; the meta tag fills it
        assert_eq!(rec.description.as_deref(), Some("Meta description"));
        assert_eq!(rec.product_url, "https://www.lcsc.com/product-detail/C25804.html");
    }

    #[test]
    fn test_parse_meta_fallback() {
        let rec = parse_product_page(META_ONLY_PAGE, "C1").unwrap();
        assert_eq!(rec.name.as_deref(), Some("Only meta"));
        assert_eq!(rec.description.as_deref(), Some("From meta"));
        assert_eq!(rec.image_url.as_deref(), Some("https://assets.example/meta.png"));
        assert_eq!(rec.brand, None);
        assert_eq!(rec.price, None);
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), ".png");
        assert_eq!(extension_for("image/jpeg"), ".jpg");
        assert_eq!(extension_for("IMAGE/WEBP; q=1"), ".webp");
        assert_eq!(extension_for("application/octet-stream"), ".jpg");
    }

    #[test]
    fn test_crawl_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[("C1", PRODUCT_PAGE), ("C3", META_ONLY_PAGE)]);
        let parts: Vec<String> = ["C1", "C2", "C3"].iter().map(|s| s.to_string()).collect();
        let records = crawl(&fetcher, &parts, &opts(0, dir.path(), false));
        let ids: Vec<&str> = records.iter().map(|r| r.part_number.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C3"]);
        assert_eq!(fetcher.requests.borrow().len(), 3);
    }

    #[test]
    fn test_crawl_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[("C1", PRODUCT_PAGE), ("C2", PRODUCT_PAGE)]);
        let parts: Vec<String> = ["C1", "C2"].iter().map(|s| s.to_string()).collect();
        let records = crawl(&fetcher, &parts, &opts(1, dir.path(), false));
        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.requests.borrow().len(), 1);
    }

    #[test]
    fn test_crawl_downloads_images() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("images");
        let fetcher = FakeFetcher::new(&[("C25804", PRODUCT_PAGE)]);
        let records = crawl(&fetcher, &["C25804".to_string()], &opts(3, &image_dir, true));
        let saved = image_dir.join("C25804.png");
        assert!(saved.exists());
        assert_eq!(records[0].image_path.as_deref(), Some(saved.display().to_string().as_str()));
    }

    #[test]
    fn test_load_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.csv");
        std::fs::write(&path, "LCSC Part Number,Quantity\nC1,1\n ,2\nC2,3\n").unwrap();
        assert_eq!(load_parts(&path).unwrap(), vec!["C1", "C2"]);

        std::fs::write(&path, "Part,Quantity\nC1,1\n").unwrap();
        assert!(matches!(load_parts(&path), Err(PartsError::MissingColumn { .. })));
    }

    #[test]
    fn test_render_html_escapes() {
        let rec = ProductRecord {
            part_number: "C1".to_string(),
            product_url: product_url("C1"),
            description: Some("<b>fast</b> & \"small\"".to_string()),
            price: Some("0.1".to_string()),
            currency: Some("USD".to_string()),
            ..Default::default()
        };
        let html = render_html(&[rec]);
        assert!(html.contains("&lt;b&gt;fast&lt;/b&gt; &amp; &quot;small&quot;"));
        assert!(html.contains("<td>0.1 USD</td>"));
        // falls back to the part number when there is no name
        assert!(html.contains("<td>C1</td>"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_write_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("crawled.csv");
        let rec = parse_product_page(PRODUCT_PAGE, "C25804").unwrap();
        write_records(&path, &[rec]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(RECORD_HEADERS.join(",").as_str()));
        assert!(lines.next().unwrap().starts_with("C25804,https://www.lcsc.com/product-detail/C25804.html,"));
    }
}
