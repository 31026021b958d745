//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Mutation + Log Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Every write is one transaction                          │
//! │                                                                         │
//! │  create(new, source)          update(id, patch, source)                │
//! │  ├── INSERT products          ├── SELECT before                        │
//! │  └── INSERT product_log(add)  ├── UPDATE products                      │
//! │                               └── INSERT product_log(edit)             │
//! │                                                                         │
//! │  delete(id, source)                                                    │
//! │  ├── SELECT before                                                     │
//! │  ├── INSERT product_log(delete)                                        │
//! │  └── DELETE products  ──► FK sets product_log/scan_log.product_id NULL │
//! │                                                                         │
//! │  COMMIT, or nothing at all: a product row never changes without its    │
//! │  log row.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use stockroom_core::barcode::similarity_prefix;
use stockroom_core::changelog;
use stockroom_core::{ChangeSource, NewProduct, Product, ProductPatch};

use crate::error::{DbError, DbResult};
use crate::repository::product_log;

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, sku, barcode, quantity, alert_threshold,
           expiry_date, created_at, updated_at
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let created = repo.create(&new_product, ChangeSource::Manual).await?;
/// let product = repo.get(created.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its ID, failing with [`DbError::NotFound`].
    pub async fn get(&self, id: i64) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Products that could answer a lookup of `code`: exact barcode matches
    /// plus everything sharing the similarity prefix, ordered by id.
    ///
    /// The exact/similar decision itself is
    /// [`stockroom_core::barcode::Resolution::resolve`].
    pub async fn candidates_for_barcode(&self, code: &str) -> DbResult<Vec<Product>> {
        let prefix = similarity_prefix(code);

        debug!(code = %code, prefix = %prefix, "Fetching barcode candidates");

        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE barcode = ?1 OR substr(barcode, 1, length(?2)) = ?2 ORDER BY id"
        ))
        .bind(code)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a product and its `add` log row.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its assigned id
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn create(&self, new: &NewProduct, source: ChangeSource) -> DbResult<Product> {
        debug!(sku = %new.sku, %source, "Creating product");

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, sku, barcode, quantity, alert_threshold,
                expiry_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING id, name, sku, barcode, quantity, alert_threshold,
                      expiry_date, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.sku)
        .bind(&new.barcode)
        .bind(new.quantity)
        .bind(new.alert_threshold)
        .bind(new.expiry_date)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&new.sku))?;

        product_log::insert(&mut tx, &changelog::added(&product, source, now)).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(id = product.id, "Product created");
        Ok(product)
    }

    /// Applies `patch` and appends an `edit` log row.
    ///
    /// An empty patch still logs a row with zero deltas.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product after the update
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::UniqueViolation)` - New SKU already in use
    pub async fn update(
        &self,
        id: i64,
        patch: &ProductPatch,
        source: ChangeSource,
    ) -> DbResult<Product> {
        debug!(id, %source, "Updating product");

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let before = fetch_in(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let mut after = patch.apply_to(&before);
        after.updated_at = now;

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                sku = ?3,
                barcode = ?4,
                quantity = ?5,
                alert_threshold = ?6,
                expiry_date = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&after.name)
        .bind(&after.sku)
        .bind(&after.barcode)
        .bind(after.quantity)
        .bind(after.alert_threshold)
        .bind(after.expiry_date)
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&after.sku))?;

        product_log::insert(&mut tx, &changelog::edited(&before, &after, source, now)).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(after)
    }

    /// Hard-deletes a product after logging it.
    ///
    /// Earlier log rows survive with their product reference cleared.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product as it was just before removal
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn delete(&self, id: i64, source: ChangeSource) -> DbResult<Product> {
        debug!(id, %source, "Deleting product");

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let product = fetch_in(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        product_log::insert(&mut tx, &changelog::deleted(&product, source, now)).await?;

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(product)
    }

    /// Counts products (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn fetch_in(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use stockroom_core::ProductAction;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn widget(sku: &str, barcode: Option<&str>) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            sku: sku.to_string(),
            barcode: barcode.map(str::to_string),
            quantity: 50,
            alert_threshold: 5,
            expiry_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_logs_add() {
        let db = db().await;
        let product = db
            .products()
            .create(&widget("WID123", None), ChangeSource::Scanned)
            .await
            .unwrap();

        assert!(product.id > 0);
        assert_eq!(db.products().get(product.id).await.unwrap(), product);

        let logs = db.product_log().list().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, ProductAction::Add);
        assert_eq!(logs[0].source, ChangeSource::Scanned);
        assert_eq!(logs[0].quantity_change, 50);
        assert_eq!(logs[0].product.id, Some(product.id));
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_conflict_without_log() {
        let db = db().await;
        let repo = db.products();
        repo.create(&widget("DUP", None), ChangeSource::Manual)
            .await
            .unwrap();

        let err = repo
            .create(&widget("DUP", None), ChangeSource::Manual)
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "DUP");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(db.product_log().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_logs_deltas() {
        let db = db().await;
        let repo = db.products();
        let product = repo
            .create(&widget("WID123", None), ChangeSource::Manual)
            .await
            .unwrap();

        let patch = ProductPatch {
            quantity: Some(42),
            alert_threshold: Some(8),
            expiry_date: Some(NaiveDate::from_ymd_opt(2030, 1, 1)),
            ..Default::default()
        };
        let updated = repo
            .update(product.id, &patch, ChangeSource::Manual)
            .await
            .unwrap();
        assert_eq!(updated.quantity, 42);
        assert_eq!(updated.name, "Widget");
        assert_eq!(repo.get(product.id).await.unwrap().quantity, 42);

        let logs = db.product_log().list().await.unwrap();
        let edit = &logs[0];
        assert_eq!(edit.action, ProductAction::Edit);
        assert_eq!(edit.quantity_change, -8);
        assert_eq!(edit.threshold_change, 3);
        assert_eq!(edit.current_quantity, Some(42));
        assert_eq!(edit.product.expiry_date, NaiveDate::from_ymd_opt(2030, 1, 1));
    }

    #[tokio::test]
    async fn test_update_to_taken_sku_rolls_back() {
        let db = db().await;
        let repo = db.products();
        repo.create(&widget("A1", None), ChangeSource::Manual)
            .await
            .unwrap();
        let second = repo
            .create(&widget("B2", None), ChangeSource::Manual)
            .await
            .unwrap();

        let patch = ProductPatch {
            sku: Some("A1".to_string()),
            quantity: Some(1),
            ..Default::default()
        };
        let err = repo
            .update(second.id, &patch, ChangeSource::Manual)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        assert_eq!(repo.get(second.id).await.unwrap().quantity, 50);
        assert_eq!(db.product_log().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = db().await;
        let err = db
            .products()
            .update(999, &ProductPatch::default(), ChangeSource::Manual)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_keeps_history() {
        let db = db().await;
        let repo = db.products();
        let product = repo
            .create(&widget("GONE", Some("123456789")), ChangeSource::Manual)
            .await
            .unwrap();
        repo.update(
            product.id,
            &ProductPatch {
                quantity: Some(20),
                ..Default::default()
            },
            ChangeSource::Manual,
        )
        .await
        .unwrap();

        let removed = repo.delete(product.id, ChangeSource::Manual).await.unwrap();
        assert_eq!(removed.quantity, 20);
        assert!(repo.get_by_id(product.id).await.unwrap().is_none());

        let logs = db.product_log().list().await.unwrap();
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|entry| entry.is_product_deleted()));
        assert!(logs.iter().all(|entry| entry.product.sku == "GONE"));

        let delete = &logs[0];
        assert_eq!(delete.action, ProductAction::Delete);
        assert_eq!(delete.quantity_change, -20);
        assert_eq!(delete.current_quantity, Some(20));

        let err = repo.delete(product.id, ChangeSource::Manual).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let db = db().await;
        let repo = db.products();
        let first = repo
            .create(&widget("ONE", None), ChangeSource::Manual)
            .await
            .unwrap();
        repo.delete(first.id, ChangeSource::Manual).await.unwrap();
        let second = repo
            .create(&widget("TWO", None), ChangeSource::Manual)
            .await
            .unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_candidates_for_barcode() {
        let db = db().await;
        let repo = db.products();
        for (sku, barcode) in [
            ("P1", Some("5901234000011")),
            ("P2", Some("5901234000028")),
            ("P3", Some("4000000000000")),
            ("P4", None),
            ("P5", Some("590")),
        ] {
            repo.create(&widget(sku, barcode), ChangeSource::Manual)
                .await
                .unwrap();
        }

        let candidates = repo.candidates_for_barcode("5901239999999").await.unwrap();
        let skus: Vec<&str> = candidates.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["P1", "P2"]);

        let exact = repo.candidates_for_barcode("590").await.unwrap();
        assert!(exact.iter().any(|p| p.sku == "P5"));
    }
}
