//! `stockroom logs` and `stockroom history`.
//!
//! Both fetch the whole log, then run the query locally. `--csv` writes the
//! filtered, sorted set (every page) instead of printing a page.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Offset};

use stockroom_core::export::{self, ExportOptions};
use stockroom_core::log_query::{filter_and_sort, query, QueryResult};
use stockroom_core::status::derive_status;
use stockroom_core::{ProductAction, ProductLogEntry, ScanLogEntry};

use crate::args::{HistoryArgs, LogArgs};
use crate::client::ApiClient;
use crate::commands::products::truncate;

/// Timestamps are shown in the machine's local offset.
fn local_options() -> ExportOptions {
    ExportOptions::with_offset(Local::now().offset().fix())
}

pub async fn run_product_logs(client: &ApiClient, args: LogArgs) -> Result<()> {
    let entries = client.product_logs().await?;
    let spec = args.to_spec();
    let options = local_options();

    if let Some(path) = &args.query.csv {
        let rows = filter_and_sort(&entries, &spec);
        let out = export::product_log_csv(&rows, &options)?;
        return write_export(path, &out, rows.len());
    }

    let result = query(&entries, &spec);
    let today = Local::now().date_naive();
    for line in product_log_lines(&result, &options, today) {
        println!("{}", line);
    }
    print_footer(&result);
    Ok(())
}

pub async fn run_scan_history(client: &ApiClient, args: HistoryArgs) -> Result<()> {
    let entries = if args.today {
        client.scan_history_today().await?
    } else {
        client.scan_history().await?
    };
    let spec = args.to_spec();
    let options = local_options();

    if let Some(path) = &args.query.csv {
        let rows = filter_and_sort(&entries, &spec);
        let out = export::scan_log_csv(&rows, &options)?;
        return write_export(path, &out, rows.len());
    }

    let result = query(&entries, &spec);
    for line in scan_log_lines(&result, &options) {
        println!("{}", line);
    }
    print_footer(&result);
    Ok(())
}

fn write_export(path: &Path, contents: &str, rows: usize) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Exported {} rows to {}", rows, path.display());
    Ok(())
}

fn print_footer<T>(result: &QueryResult<'_, T>) {
    if result.total_matching == 0 {
        println!("No matching entries");
    } else if result.page.is_empty() {
        println!(
            "Page {} is past the end ({} pages, {} matching)",
            result.page_index, result.page_count, result.total_matching
        );
    } else {
        println!(
            "Page {} of {} ({} matching)",
            result.page_index, result.page_count, result.total_matching
        );
    }
}

fn product_log_lines(
    result: &QueryResult<'_, ProductLogEntry>,
    options: &ExportOptions,
    today: NaiveDate,
) -> Vec<String> {
    if result.page.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!(
        "{:<24} {:<16} {:<7} {:<8} {:>6} {:>6} {:>6} {:>6}  {:<10} {:<24} {}",
        "PRODUCT", "SKU", "ACTION", "SOURCE", "ΔQTY", "QTY", "ΔALERT", "ALERT", "EXPIRY", "TIME",
        "STATUS"
    )];

    for entry in &result.page {
        let qty_change = match entry.action {
            ProductAction::Delete => -entry.quantity_change.abs(),
            _ => entry.quantity_change,
        };
        lines.push(format!(
            "{:<24} {:<16} {:<7} {:<8} {:>6} {:>6} {:>6} {:>6}  {:<10} {:<24} {}",
            truncate(&entry.product.name, 24),
            truncate(&entry.product.sku, 16),
            entry.action.label(),
            entry.source.label(),
            export::format_signed(qty_change),
            optional(entry.current_quantity),
            export::format_signed(entry.threshold_change),
            optional(entry.current_threshold),
            entry
                .product
                .expiry_date
                .map(|d| options.format_date(d))
                .unwrap_or_else(|| export::MISSING.to_string()),
            options.format_timestamp(entry.timestamp),
            derive_status(entry, today)
        ));
    }
    lines
}

fn scan_log_lines(result: &QueryResult<'_, ScanLogEntry>, options: &ExportOptions) -> Vec<String> {
    if result.page.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!(
        "{:<15} {:<24} {:<16} {:<14} {}",
        "BARCODE", "PRODUCT", "SKU", "SOURCE", "SCANNED AT"
    )];

    for entry in &result.page {
        let product = entry.product.as_ref();
        lines.push(format!(
            "{:<15} {:<24} {:<16} {:<14} {}",
            entry.barcode,
            truncate(product.map_or(export::MISSING, |p| p.name.as_str()), 24),
            truncate(product.map_or(export::MISSING, |p| p.sku.as_str()), 16),
            truncate(&entry.source, 14),
            options.format_timestamp(entry.scanned_at)
        ));
    }
    lines
}

fn optional(value: Option<i64>) -> String {
    value.map_or_else(|| export::MISSING.to_string(), |v| v.to_string())
}
