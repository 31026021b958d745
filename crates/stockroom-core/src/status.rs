//! Display status of a product log row.
//!
//! Computed at render time from the row alone, never stored. Precedence:
//! `Deleted` > `Expired` > `Low Stock` > `OK`.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::ProductLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StockStatus {
    Deleted,
    Expired,
    LowStock,
    Ok,
}

impl StockStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            StockStatus::Deleted => "Deleted",
            StockStatus::Expired => "Expired",
            StockStatus::LowStock => "Low Stock",
            StockStatus::Ok => "OK",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derives the status shown next to `entry` as of `today`.
pub fn derive_status(entry: &ProductLogEntry, today: NaiveDate) -> StockStatus {
    if entry.is_product_deleted() {
        return StockStatus::Deleted;
    }

    if entry.product.expiry_date.is_some_and(|date| date < today) {
        return StockStatus::Expired;
    }

    match (entry.current_quantity, entry.current_threshold) {
        (Some(quantity), Some(threshold)) if quantity <= threshold => StockStatus::LowStock,
        _ => StockStatus::Ok,
    }
}
