//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌──────────────────┐      │
//! │  │    Product      │   │ ProductLogEntry  │   │  ScanLogEntry    │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ──────────────  │      │
//! │  │  id (i64)       │◄──│  product (snap)  │   │  barcode         │      │
//! │  │  sku (unique)   │   │  action, source  │   │  source          │      │
//! │  │  barcode        │   │  *_change        │   │  product (snap)  │──►   │
//! │  │  quantity       │   │  current_*       │   │  scanned_at      │      │
//! │  │  alert_threshold│   │  timestamp       │   └──────────────────┘      │
//! │  │  expiry_date    │   └──────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  Log rows freeze name/sku at write time. The product id inside the     │
//! │  snapshot goes null when the product is deleted; the row survives.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// Product
// =============================================================================

/// A live inventory product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Assigned by the store on creation, never reused.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Stock Keeping Unit - unique across live products.
    pub sku: String,

    /// Barcode as printed on the item. Not unique, may be absent.
    pub barcode: Option<String>,

    /// Units on hand.
    pub quantity: i64,

    /// Quantity at or below which the product counts as low stock.
    pub alert_threshold: i64,

    /// Best-before date, if the product perishes.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// True when stock has fallen to the alert threshold or below.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.alert_threshold
    }

    /// True when the expiry date lies strictly before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|date| date < today)
    }

    /// Freezes the identifying fields for a log row.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: Some(self.id),
            name: self.name.clone(),
            sku: self.sku.clone(),
            expiry_date: self.expiry_date,
        }
    }
}

// =============================================================================
// Product Write Payloads
// =============================================================================

/// Fields for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub quantity: i64,
    /// Defaults to 0 when omitted.
    #[serde(default)]
    pub alert_threshold: i64,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

impl NewProduct {
    /// Trims text fields and turns a blank barcode into `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.sku = self.sku.trim().to_string();
        self.barcode = normalize_barcode(self.barcode);
        self
    }
}

/// A partial update. Absent fields are left untouched.
///
/// `barcode` and `expiry_date` distinguish "absent" (`None`) from
/// "explicitly cleared" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(as = "Option<Option<String>>")]
    pub barcode: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<i64>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(as = "Option<Option<String>>")]
    pub expiry_date: Option<Option<NaiveDate>>,
}

impl ProductPatch {
    /// Trims text fields the same way [`NewProduct::normalized`] does.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self.sku = self.sku.map(|sku| sku.trim().to_string());
        self.barcode = self.barcode.map(normalize_barcode);
        self
    }

    /// True when the patch would not change any field.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.barcode.is_none()
            && self.quantity.is_none()
            && self.alert_threshold.is_none()
            && self.expiry_date.is_none()
    }

    /// Returns `product` with the present fields replaced.
    pub fn apply_to(&self, product: &Product) -> Product {
        let mut updated = product.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(sku) = &self.sku {
            updated.sku = sku.clone();
        }
        if let Some(barcode) = &self.barcode {
            updated.barcode = barcode.clone();
        }
        if let Some(quantity) = self.quantity {
            updated.quantity = quantity;
        }
        if let Some(threshold) = self.alert_threshold {
            updated.alert_threshold = threshold;
        }
        if let Some(expiry) = self.expiry_date {
            updated.expiry_date = expiry;
        }
        updated
    }
}

fn normalize_barcode(barcode: Option<String>) -> Option<String> {
    barcode
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
}

/// Deserializes a field that was present in the payload, even as `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// =============================================================================
// Product Action / Change Source
// =============================================================================

/// What a product log row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductAction {
    Add,
    Edit,
    Delete,
}

impl ProductAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductAction::Add => "add",
            ProductAction::Edit => "edit",
            ProductAction::Delete => "delete",
        }
    }

    /// Capitalized form used in exports and tables.
    pub const fn label(&self) -> &'static str {
        match self {
            ProductAction::Add => "Add",
            ProductAction::Edit => "Edit",
            ProductAction::Delete => "Delete",
        }
    }
}

impl fmt::Display for ProductAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(ProductAction::Add),
            "edit" => Ok(ProductAction::Edit),
            "delete" => Ok(ProductAction::Delete),
            other => Err(CoreError::InvalidQuery(format!("unknown action '{other}'"))),
        }
    }
}

/// How the request that mutated a product originated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// Typed into a form.
    #[default]
    Manual,
    /// Reached through the barcode scanner flow.
    Scanned,
}

impl ChangeSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChangeSource::Manual => "manual",
            ChangeSource::Scanned => "scanned",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ChangeSource::Manual => "Manual",
            ChangeSource::Scanned => "Scanned",
        }
    }
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(ChangeSource::Manual),
            "scanned" => Ok(ChangeSource::Scanned),
            other => Err(CoreError::InvalidQuery(format!("unknown source '{other}'"))),
        }
    }
}

// =============================================================================
// Product Log
// =============================================================================

/// Product identity frozen into a log row at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSnapshot {
    /// `None` once the product has been deleted.
    pub id: Option<i64>,
    pub name: String,
    pub sku: String,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

/// One append-only row of the product change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductLogEntry {
    pub id: i64,
    pub product: ProductSnapshot,
    pub action: ProductAction,
    pub source: ChangeSource,
    /// Signed delta applied to the quantity by this action.
    pub quantity_change: i64,
    /// Signed delta applied to the alert threshold by this action.
    pub threshold_change: i64,
    /// Quantity after the action (last known value for deletes).
    pub current_quantity: Option<i64>,
    /// Threshold after the action (last known value for deletes).
    pub current_threshold: Option<i64>,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl ProductLogEntry {
    /// True when the referenced product no longer exists.
    pub fn is_product_deleted(&self) -> bool {
        self.product.id.is_none()
    }
}

/// A product log row that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductLogEntry {
    pub product: ProductSnapshot,
    pub action: ProductAction,
    pub source: ChangeSource,
    pub quantity_change: i64,
    pub threshold_change: i64,
    pub current_quantity: Option<i64>,
    pub current_threshold: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Scan Log
// =============================================================================

/// Product matched by a scan, frozen at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScannedProduct {
    /// `None` once the product has been deleted.
    pub id: Option<i64>,
    pub name: String,
    pub sku: String,
}

impl From<&Product> for ScannedProduct {
    fn from(product: &Product) -> Self {
        ScannedProduct {
            id: Some(product.id),
            name: product.name.clone(),
            sku: product.sku.clone(),
        }
    }
}

/// One append-only row of the scan history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanLogEntry {
    pub id: i64,
    pub barcode: String,
    /// Origin label, e.g. "scanner" or "scan-from-add".
    pub source: String,
    /// Exact match at scan time, `None` when nothing matched.
    pub product: Option<ScannedProduct>,
    #[ts(as = "String")]
    pub scanned_at: DateTime<Utc>,
}

/// A scan event that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScanLogEntry {
    pub barcode: String,
    pub source: String,
    pub product: Option<ScannedProduct>,
    pub scanned_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
