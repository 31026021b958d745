//! # Barcode Resolver
//!
//! Server side of a scan: fetch candidates, apply the exact/similar rule,
//! record the scan.
//!
//! ```text
//!   code ──► ProductRepository::candidates_for_barcode
//!                 │  Err ──► DbError (unavailable ≠ not found)
//!                 ▼
//!            Resolution::resolve(code, candidates)
//!                 │
//!                 ├──► ScanLogRepository::record   (best effort, warn on failure)
//!                 ▼
//!            Resolution { exact, similar }
//! ```

use chrono::Utc;
use tracing::{debug, warn};

use stockroom_core::barcode::Resolution;
use stockroom_core::{NewScanLogEntry, ScannedProduct};

use crate::error::DbResult;
use crate::repository::product::ProductRepository;
use crate::repository::scan_log::ScanLogRepository;

#[derive(Debug, Clone)]
pub struct BarcodeResolver {
    products: ProductRepository,
    scan_log: ScanLogRepository,
}

impl BarcodeResolver {
    pub fn new(products: ProductRepository, scan_log: ScanLogRepository) -> Self {
        BarcodeResolver { products, scan_log }
    }

    /// Resolves `code` and records the attempt under `source`.
    ///
    /// A failed lookup is returned as an error and nothing is logged. A
    /// failed scan-log append is only warned about: the caller still gets
    /// the resolution.
    pub async fn resolve(&self, code: &str, source: &str) -> DbResult<Resolution> {
        let candidates = self.products.candidates_for_barcode(code).await?;
        let resolution = Resolution::resolve(code, &candidates);

        debug!(
            code = %code,
            exact = resolution.exact.as_ref().map(|p| p.id),
            similar = resolution.similar.len(),
            "Resolved barcode"
        );

        let entry = NewScanLogEntry {
            barcode: code.to_string(),
            source: source.to_string(),
            product: resolution.exact.as_ref().map(ScannedProduct::from),
            scanned_at: Utc::now(),
        };
        if let Err(err) = self.scan_log.record(&entry).await {
            warn!(code = %code, error = %err, "Failed to record scan");
        }

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use stockroom_core::barcode::ResolutionKind;
    use stockroom_core::{ChangeSource, NewProduct};

    async fn db_with(barcodes: &[(&str, Option<&str>)]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (sku, barcode) in barcodes {
            db.products()
                .create(
                    &NewProduct {
                        name: format!("Item {sku}"),
                        sku: sku.to_string(),
                        barcode: barcode.map(str::to_string),
                        quantity: 5,
                        alert_threshold: 1,
                        expiry_date: None,
                    },
                    ChangeSource::Manual,
                )
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_exact_match_is_logged_with_product() {
        let db = db_with(&[("A", Some("999888777666"))]).await;
        let resolution = db
            .resolver()
            .resolve("999888777666", "scanner")
            .await
            .unwrap();
        assert_eq!(resolution.kind(), ResolutionKind::ExactFound);

        let scans = db.scan_log().list().await.unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].source, "scanner");
        assert_eq!(scans[0].product.as_ref().map(|p| p.sku.as_str()), Some("A"));
    }

    #[tokio::test]
    async fn test_similar_only_and_not_found_are_logged_too() {
        let db = db_with(&[("A", Some("123456001")), ("B", Some("123456002"))]).await;
        let resolver = db.resolver();

        let similar = resolver.resolve("123456999", "scan-from-add").await.unwrap();
        assert!(similar.exact.is_none());
        assert_eq!(similar.similar.len(), 2);

        let none = resolver.resolve("000000", "scanner").await.unwrap();
        assert!(none.is_empty());

        let scans = db.scan_log().list().await.unwrap();
        assert_eq!(scans.len(), 2);
        assert!(scans.iter().all(|s| s.product.is_none()));
        assert_eq!(scans[1].source, "scan-from-add");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_an_error() {
        let db = db_with(&[]).await;
        db.close().await;

        let err = db.resolver().resolve("000111", "scanner").await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
