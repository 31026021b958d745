//! # Product Change Log Derivation
//!
//! Builds the ProductLogEntry that accompanies every product mutation.
//!
//! ## Delta Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  action   quantity_change     threshold_change    current_*             │
//! │  ──────   ───────────────     ────────────────    ─────────             │
//! │  add      +quantity           +threshold          new values            │
//! │  edit     new - old           new - old           new values            │
//! │  delete   -quantity           -threshold          last known values     │
//! │                                                                         │
//! │  An edit that changes neither count still logs a row with 0 / 0.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The snapshot is taken from the product as it stands *after* the action
//! (or just before removal, for deletes), so log rows keep the name the
//! product had when the change happened.

use chrono::{DateTime, Utc};

use crate::types::{ChangeSource, NewProductLogEntry, Product, ProductAction};

/// Log row for a newly created product.
pub fn added(product: &Product, source: ChangeSource, at: DateTime<Utc>) -> NewProductLogEntry {
    NewProductLogEntry {
        product: product.snapshot(),
        action: ProductAction::Add,
        source,
        quantity_change: product.quantity,
        threshold_change: product.alert_threshold,
        current_quantity: Some(product.quantity),
        current_threshold: Some(product.alert_threshold),
        timestamp: at,
    }
}

/// Log row for an update from `before` to `after`.
pub fn edited(
    before: &Product,
    after: &Product,
    source: ChangeSource,
    at: DateTime<Utc>,
) -> NewProductLogEntry {
    NewProductLogEntry {
        product: after.snapshot(),
        action: ProductAction::Edit,
        source,
        quantity_change: after.quantity - before.quantity,
        threshold_change: after.alert_threshold - before.alert_threshold,
        current_quantity: Some(after.quantity),
        current_threshold: Some(after.alert_threshold),
        timestamp: at,
    }
}

/// Log row for a product about to be removed.
pub fn deleted(product: &Product, source: ChangeSource, at: DateTime<Utc>) -> NewProductLogEntry {
    NewProductLogEntry {
        product: product.snapshot(),
        action: ProductAction::Delete,
        source,
        quantity_change: -product.quantity,
        threshold_change: -product.alert_threshold,
        current_quantity: Some(product.quantity),
        current_threshold: Some(product.alert_threshold),
        timestamp: at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64, threshold: i64) -> Product {
        let now = Utc::now();
        Product {
            id: 9,
            name: "Widget".to_string(),
            sku: "WID123".to_string(),
            barcode: None,
            quantity,
            alert_threshold: threshold,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_added_records_full_counts() {
        let entry = added(&product(50, 5), ChangeSource::Scanned, Utc::now());
        assert_eq!(entry.action, ProductAction::Add);
        assert_eq!(entry.source, ChangeSource::Scanned);
        assert_eq!(entry.quantity_change, 50);
        assert_eq!(entry.threshold_change, 5);
        assert_eq!(entry.current_quantity, Some(50));
        assert_eq!(entry.product.id, Some(9));
    }

    #[test]
    fn test_edited_records_signed_deltas() {
        let before = product(50, 5);
        let after = product(42, 8);
        let entry = edited(&before, &after, ChangeSource::Manual, Utc::now());
        assert_eq!(entry.quantity_change, -8);
        assert_eq!(entry.threshold_change, 3);
        assert_eq!(entry.current_quantity, Some(42));
        assert_eq!(entry.current_threshold, Some(8));
    }

    #[test]
    fn test_edit_with_no_change_logs_zero_diff() {
        let before = product(50, 5);
        let entry = edited(&before, &before, ChangeSource::Manual, Utc::now());
        assert_eq!(entry.quantity_change, 0);
        assert_eq!(entry.threshold_change, 0);
    }

    #[test]
    fn test_edit_snapshot_uses_new_name() {
        let before = product(1, 1);
        let mut after = before.clone();
        after.name = "Widget Pro".to_string();
        let entry = edited(&before, &after, ChangeSource::Manual, Utc::now());
        assert_eq!(entry.product.name, "Widget Pro");
    }

    #[test]
    fn test_deleted_records_stock_leaving() {
        let entry = deleted(&product(20, 4), ChangeSource::Manual, Utc::now());
        assert_eq!(entry.action, ProductAction::Delete);
        assert_eq!(entry.quantity_change, -20);
        assert_eq!(entry.threshold_change, -4);
        assert_eq!(entry.current_quantity, Some(20));
        assert_eq!(entry.current_threshold, Some(4));
    }
}
