//! # CSV Export
//!
//! Renders the filtered (not paginated) rows of a log view as CSV that
//! spreadsheet tools import directly: header row first, comma separated,
//! one record per line.
//!
//! ## Columns
//! ```text
//! product_logs.csv  Product, SKU, Action, Source, Qty Change, Current Qty,
//!                   Threshold Change, Current Threshold, Expiry Date, Timestamp
//! scan_log.csv      Barcode, Product, SKU, Source, Scanned At
//! ```
//!
//! Missing values render as `-`. Delete rows always show the quantity
//! change as a negative magnitude.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{ProductAction, ProductLogEntry, ScanLogEntry};

/// Download name for the product change log.
pub const PRODUCT_LOG_FILENAME: &str = "product_logs.csv";

/// Download name for the scan log.
pub const SCAN_LOG_FILENAME: &str = "scan_log.csv";

/// Placeholder for absent values.
pub const MISSING: &str = "-";

const PRODUCT_LOG_HEADER: [&str; 10] = [
    "Product",
    "SKU",
    "Action",
    "Source",
    "Qty Change",
    "Current Qty",
    "Threshold Change",
    "Current Threshold",
    "Expiry Date",
    "Timestamp",
];

const SCAN_LOG_HEADER: [&str; 5] = ["Barcode", "Product", "SKU", "Source", "Scanned At"];

/// Rendering options for exported dates and times.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Offset timestamps are shown in.
    pub offset: FixedOffset,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            offset: Utc.fix(),
        }
    }
}

impl ExportOptions {
    pub fn with_offset(offset: FixedOffset) -> Self {
        ExportOptions { offset }
    }

    /// `M/D/YYYY, h:mm:ss AM`
    pub fn format_timestamp(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.offset)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string()
    }

    /// `M/D/YYYY`
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format("%-m/%-d/%Y").to_string()
    }
}

/// Formats a delta with an explicit sign: `+5`, `-3`, `0`.
pub fn format_signed(value: i64) -> String {
    if value > 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

fn quantity_change_cell(entry: &ProductLogEntry) -> String {
    match entry.action {
        ProductAction::Delete => format_signed(-entry.quantity_change.abs()),
        _ => format_signed(entry.quantity_change),
    }
}

fn optional_cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> CoreResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
}

/// Renders product log rows, in the order given.
pub fn product_log_csv(entries: &[&ProductLogEntry], options: &ExportOptions) -> CoreResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(PRODUCT_LOG_HEADER)?;

    for entry in entries {
        writer.write_record([
            entry.product.name.clone(),
            entry.product.sku.clone(),
            entry.action.label().to_string(),
            entry.source.label().to_string(),
            quantity_change_cell(entry),
            optional_cell(entry.current_quantity),
            format_signed(entry.threshold_change),
            optional_cell(entry.current_threshold),
            optional_cell(entry.product.expiry_date.map(|d| options.format_date(d))),
            options.format_timestamp(entry.timestamp),
        ])?;
    }

    finish(writer)
}

/// Renders scan log rows, in the order given.
pub fn scan_log_csv(entries: &[&ScanLogEntry], options: &ExportOptions) -> CoreResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SCAN_LOG_HEADER)?;

    for entry in entries {
        let product = entry.product.as_ref();
        writer.write_record([
            entry.barcode.clone(),
            optional_cell(product.map(|p| p.name.as_str())),
            optional_cell(product.map(|p| p.sku.as_str())),
            entry.source.clone(),
            options.format_timestamp(entry.scanned_at),
        ])?;
    }

    finish(writer)
}
