//! # Product Log Repository
//!
//! Append-only history of product adds, edits and deletes.
//!
//! Rows are written only from inside a product mutation's transaction
//! (see [`ProductRepository`](super::product::ProductRepository)); this
//! repository exposes reads.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use stockroom_core::{
    ChangeSource, NewProductLogEntry, ProductAction, ProductLogEntry, ProductSnapshot,
};

use crate::error::DbResult;

#[derive(Debug, FromRow)]
struct ProductLogRow {
    id: i64,
    product_id: Option<i64>,
    product_name: String,
    product_sku: String,
    product_expiry_date: Option<NaiveDate>,
    action: ProductAction,
    source: ChangeSource,
    quantity_change: i64,
    threshold_change: i64,
    current_quantity: Option<i64>,
    current_threshold: Option<i64>,
    timestamp: DateTime<Utc>,
}

impl From<ProductLogRow> for ProductLogEntry {
    fn from(row: ProductLogRow) -> Self {
        ProductLogEntry {
            id: row.id,
            product: ProductSnapshot {
                id: row.product_id,
                name: row.product_name,
                sku: row.product_sku,
                expiry_date: row.product_expiry_date,
            },
            action: row.action,
            source: row.source,
            quantity_change: row.quantity_change,
            threshold_change: row.threshold_change,
            current_quantity: row.current_quantity,
            current_threshold: row.current_threshold,
            timestamp: row.timestamp,
        }
    }
}

/// Appends one row on an open connection or transaction.
pub(crate) async fn insert(conn: &mut SqliteConnection, entry: &NewProductLogEntry) -> DbResult<i64> {
    debug!(
        action = %entry.action,
        product_id = ?entry.product.id,
        quantity_change = entry.quantity_change,
        "Appending product log entry"
    );

    let result = sqlx::query(
        r#"
        INSERT INTO product_log (
            product_id, product_name, product_sku, product_expiry_date,
            action, source, quantity_change, threshold_change,
            current_quantity, current_threshold, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(entry.product.id)
    .bind(&entry.product.name)
    .bind(&entry.product.sku)
    .bind(entry.product.expiry_date)
    .bind(entry.action)
    .bind(entry.source)
    .bind(entry.quantity_change)
    .bind(entry.threshold_change)
    .bind(entry.current_quantity)
    .bind(entry.current_threshold)
    .bind(entry.timestamp)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Read access to the product change log.
#[derive(Debug, Clone)]
pub struct ProductLogRepository {
    pool: SqlitePool,
}

impl ProductLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductLogRepository { pool }
    }

    /// Every row, newest first.
    pub async fn list(&self) -> DbResult<Vec<ProductLogEntry>> {
        let rows = sqlx::query_as::<_, ProductLogRow>(
            r#"
            SELECT id, product_id, product_name, product_sku, product_expiry_date,
                   action, source, quantity_change, threshold_change,
                   current_quantity, current_threshold, timestamp
            FROM product_log
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed product log");
        Ok(rows.into_iter().map(ProductLogEntry::from).collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_log")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use stockroom_core::{ChangeSource, NewProduct};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .create(
                &NewProduct {
                    name: "Tea".to_string(),
                    sku: "TEA-1".to_string(),
                    barcode: None,
                    quantity: 3,
                    alert_threshold: 1,
                    expiry_date: None,
                },
                ChangeSource::Manual,
            )
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_log_rows_cannot_be_edited() {
        let db = seeded().await;
        let result = sqlx::query("UPDATE product_log SET quantity_change = 999")
            .execute(db.pool())
            .await;
        assert!(result.is_err());

        let relink = sqlx::query("UPDATE product_log SET product_id = 42")
            .execute(db.pool())
            .await;
        assert!(relink.is_err());

        assert_eq!(db.product_log().list().await.unwrap()[0].quantity_change, 3);
    }

    #[tokio::test]
    async fn test_log_rows_cannot_be_deleted() {
        let db = seeded().await;
        let result = sqlx::query("DELETE FROM product_log")
            .execute(db.pool())
            .await;
        assert!(result.is_err());
        assert_eq!(db.product_log().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_newest_first() {
        let db = seeded().await;
        let id = db.products().list().await.unwrap()[0].id;
        db.products()
            .delete(id, ChangeSource::Manual)
            .await
            .unwrap();

        let logs = db.product_log().list().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].id > logs[1].id);
        assert!(logs[0].timestamp >= logs[1].timestamp);
    }
}
