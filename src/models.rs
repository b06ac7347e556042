use std::collections::BTreeMap;

use chrono::NaiveDate;

pub const PART_NUMBER: &str = "LCSC Part Number";
pub const MFR_PART_NUMBER: &str = "Manufacture Part Number";
pub const MPN: &str = "MPN";
pub const DESCRIPTION: &str = "Description";
pub const PACKAGE: &str = "Package";
pub const MANUFACTURER: &str = "Manufacturer";
pub const QUANTITY: &str = "Quantity";
pub const UNIT_PRICE: &str = "Unit Price($)";
pub const EXT_PRICE: &str = "Ext.Price($)";
pub const ORDER_ID: &str = "Order ID";
pub const LAST_UPDATE: &str = "Last Update";

/// A table column. Recognised headers get typed storage on [`LineItem`];
/// anything else is carried through as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    PartNumber,
    MfrPartNumber,
    Mpn,
    Description,
    Package,
    Manufacturer,
    Quantity,
    UnitPrice,
    ExtPrice,
    OrderId,
    LastUpdate,
    Other(String),
}

impl Column {
    pub fn from_header(header: &str) -> Self {
        match header.trim() {
            PART_NUMBER => Self::PartNumber,
            MFR_PART_NUMBER => Self::MfrPartNumber,
            MPN => Self::Mpn,
            DESCRIPTION => Self::Description,
            PACKAGE => Self::Package,
            MANUFACTURER => Self::Manufacturer,
            QUANTITY => Self::Quantity,
            UNIT_PRICE => Self::UnitPrice,
            EXT_PRICE => Self::ExtPrice,
            ORDER_ID => Self::OrderId,
            LAST_UPDATE => Self::LastUpdate,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn header(&self) -> &str {
        match self {
            Self::PartNumber => PART_NUMBER,
            Self::MfrPartNumber => MFR_PART_NUMBER,
            Self::Mpn => MPN,
            Self::Description => DESCRIPTION,
            Self::Package => PACKAGE,
            Self::Manufacturer => MANUFACTURER,
            Self::Quantity => QUANTITY,
            Self::UnitPrice => UNIT_PRICE,
            Self::ExtPrice => EXT_PRICE,
            Self::OrderId => ORDER_ID,
            Self::LastUpdate => LAST_UPDATE,
            Self::Other(name) => name,
        }
    }
}

/// One row of the working table. Every field is optional; a `None` means the
/// cell was empty or the column does not exist in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItem {
    pub part_number: Option<String>,
    pub mfr_part_number: Option<String>,
    pub mpn: Option<String>,
    pub description: Option<String>,
    pub package: Option<String>,
    pub manufacturer: Option<String>,
    pub quantity: Option<u64>,
    pub unit_price: Option<f64>,
    pub ext_price: Option<f64>,
    pub order_id: Option<String>,
    pub last_update: Option<NaiveDate>,
    pub extra: BTreeMap<String, String>,
}

impl LineItem {
    /// Render a cell as text, the way it is written to CSV.
    pub fn cell(&self, column: &Column) -> Option<String> {
        match column {
            Column::PartNumber => self.part_number.clone(),
            Column::MfrPartNumber => self.mfr_part_number.clone(),
            Column::Mpn => self.mpn.clone(),
            Column::Description => self.description.clone(),
            Column::Package => self.package.clone(),
            Column::Manufacturer => self.manufacturer.clone(),
            Column::Quantity => self.quantity.map(|q| q.to_string()),
            Column::UnitPrice => self.unit_price.map(|p| p.to_string()),
            Column::ExtPrice => self.ext_price.map(|p| p.to_string()),
            Column::OrderId => self.order_id.clone(),
            Column::LastUpdate => self.last_update.map(|d| d.format("%Y-%m-%d").to_string()),
            Column::Other(name) => self.extra.get(name).cloned(),
        }
    }

    /// Mutable access to the text-valued fields. Numeric and date columns
    /// return `None`.
    pub fn text_mut(&mut self, column: &Column) -> Option<&mut Option<String>> {
        match column {
            Column::PartNumber => Some(&mut self.part_number),
            Column::MfrPartNumber => Some(&mut self.mfr_part_number),
            Column::Mpn => Some(&mut self.mpn),
            Column::Description => Some(&mut self.description),
            Column::Package => Some(&mut self.package),
            Column::Manufacturer => Some(&mut self.manufacturer),
            Column::OrderId => Some(&mut self.order_id),
            _ => None,
        }
    }

    /// Quantity times unit price, when both are known.
    pub fn computed_ext_price(&self) -> Option<f64> {
        match (self.quantity, self.unit_price) {
            (Some(q), Some(p)) => Some(round2(q as f64 * p)),
            _ => None,
        }
    }
}

/// The working table: an ordered column list plus typed rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Materials {
    pub columns: Vec<Column>,
    pub items: Vec<LineItem>,
}

impl Materials {
    pub fn has(&self, column: &Column) -> bool {
        self.columns.contains(column)
    }

    pub fn position(&self, column: &Column) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Append a column if it is not already present.
    pub fn ensure_column(&mut self, column: Column) {
        if !self.has(&column) {
            self.columns.push(column);
        }
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header()).collect()
    }
}

/// Where an order date was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrigin {
    OrderId,
    Filename,
}

/// Provenance parsed from an export filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSource {
    pub order_id: String,
    pub order_date: Option<NaiveDate>,
    pub date_origin: Option<DateOrigin>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: Option<String>,
    pub last_update: Option<NaiveDate>,
    pub source_file: String,
    pub total_value: f64,
}

/// Public fields scraped from one product detail page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductRecord {
    pub part_number: String,
    pub product_url: String,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
}

pub fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}
