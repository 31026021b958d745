//! # Scan Log Repository
//!
//! One append-only row per barcode lookup, whatever its outcome.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use stockroom_core::{NewScanLogEntry, ScanLogEntry, ScannedProduct};

use crate::error::DbResult;

const SELECT_SCAN: &str = r#"
    SELECT id, barcode, source, product_id, product_name, product_sku, scanned_at
    FROM scan_log
"#;

#[derive(Debug, FromRow)]
struct ScanLogRow {
    id: i64,
    barcode: String,
    source: String,
    product_id: Option<i64>,
    product_name: Option<String>,
    product_sku: Option<String>,
    scanned_at: DateTime<Utc>,
}

impl From<ScanLogRow> for ScanLogEntry {
    fn from(row: ScanLogRow) -> Self {
        // A snapshot exists only when the scan matched a product.
        let product = row.product_name.map(|name| ScannedProduct {
            id: row.product_id,
            name,
            sku: row.product_sku.unwrap_or_default(),
        });

        ScanLogEntry {
            id: row.id,
            barcode: row.barcode,
            source: row.source,
            product,
            scanned_at: row.scanned_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanLogRepository {
    pool: SqlitePool,
}

impl ScanLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ScanLogRepository { pool }
    }

    /// Appends one scan event.
    pub async fn record(&self, entry: &NewScanLogEntry) -> DbResult<ScanLogEntry> {
        debug!(
            barcode = %entry.barcode,
            source = %entry.source,
            matched = entry.product.is_some(),
            "Recording scan"
        );

        let product = entry.product.as_ref();
        let row = sqlx::query_as::<_, ScanLogRow>(
            r#"
            INSERT INTO scan_log (barcode, source, product_id, product_name, product_sku, scanned_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, barcode, source, product_id, product_name, product_sku, scanned_at
            "#,
        )
        .bind(&entry.barcode)
        .bind(&entry.source)
        .bind(product.and_then(|p| p.id))
        .bind(product.map(|p| p.name.as_str()))
        .bind(product.map(|p| p.sku.as_str()))
        .bind(entry.scanned_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Every scan, newest first.
    pub async fn list(&self) -> DbResult<Vec<ScanLogEntry>> {
        let rows = sqlx::query_as::<_, ScanLogRow>(&format!(
            "{SELECT_SCAN} ORDER BY scanned_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed scan log");
        Ok(rows.into_iter().map(ScanLogEntry::from).collect())
    }

    /// Scans whose UTC calendar date is `date`, newest first.
    pub async fn list_on(&self, date: NaiveDate) -> DbResult<Vec<ScanLogEntry>> {
        let rows = sqlx::query_as::<_, ScanLogRow>(&format!(
            "{SELECT_SCAN} WHERE date(scanned_at) = ?1 ORDER BY scanned_at DESC, id DESC"
        ))
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        debug!(%date, count = rows.len(), "Listed scans for day");
        Ok(rows.into_iter().map(ScanLogEntry::from).collect())
    }
}
