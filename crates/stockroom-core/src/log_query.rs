//! # Log Query Engine
//!
//! Filter, sort and paginate an in-memory snapshot of log rows.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  entries ──► filter (AND of all set filters)                            │
//! │                 name / sku     case-insensitive substring on snapshot   │
//! │                 action/source  exact match                              │
//! │                 start / end    inclusive, UTC calendar date             │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │              stable sort (timestamp | product_name | quantity_change)   │
//! │                 │                                                       │
//! │                 ├──────────────► CSV export (whole filtered set)        │
//! │                 ▼                                                       │
//! │              paginate (PAGE_SIZE per page, 1-based)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine keeps no state between calls: a [`QuerySpec`] is an immutable
//! value and every change to it, or to the entries, is a fresh [`query`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{ProductAction, ProductLogEntry, ScanLogEntry};
use crate::PAGE_SIZE;

// =============================================================================
// Log Record
// =============================================================================

/// The fields the engine needs from a log row.
pub trait LogRecord {
    /// Snapshot product name, `None` when the row has no product.
    fn product_name(&self) -> Option<&str>;
    fn product_sku(&self) -> Option<&str>;
    /// `None` for rows without an action (scan events).
    fn action(&self) -> Option<ProductAction>;
    fn source_label(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
    /// `None` for rows without a quantity delta (scan events).
    fn quantity_change(&self) -> Option<i64>;
}

impl LogRecord for ProductLogEntry {
    fn product_name(&self) -> Option<&str> {
        Some(&self.product.name)
    }

    fn product_sku(&self) -> Option<&str> {
        Some(&self.product.sku)
    }

    fn action(&self) -> Option<ProductAction> {
        Some(self.action)
    }

    fn source_label(&self) -> &str {
        self.source.as_str()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn quantity_change(&self) -> Option<i64> {
        Some(self.quantity_change)
    }
}

impl LogRecord for ScanLogEntry {
    fn product_name(&self) -> Option<&str> {
        self.product.as_ref().map(|p| p.name.as_str())
    }

    fn product_sku(&self) -> Option<&str> {
        self.product.as_ref().map(|p| p.sku.as_str())
    }

    fn action(&self) -> Option<ProductAction> {
        None
    }

    fn source_label(&self) -> &str {
        &self.source
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    fn quantity_change(&self) -> Option<i64> {
        None
    }
}

// =============================================================================
// Query Spec
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Timestamp,
    ProductName,
    QuantityChange,
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" | "scanned_at" => Ok(SortKey::Timestamp),
            "product_name" | "name" => Ok(SortKey::ProductName),
            "quantity_change" | "qty" => Ok(SortKey::QuantityChange),
            other => Err(CoreError::InvalidQuery(format!("unknown sort key '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(CoreError::InvalidQuery(format!("unknown sort order '{other}'"))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

/// Every filter, the sort and the page of one log view.
///
/// Unset filters match everything. Defaults to newest first, page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub action: Option<ProductAction>,
    pub source: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub sort_key: SortKey,
    pub order: SortOrder,
    /// 1-based; 0 is read as 1.
    pub page: usize,
}

impl Default for QuerySpec {
    fn default() -> Self {
        QuerySpec {
            name: None,
            sku: None,
            action: None,
            source: None,
            start: None,
            end: None,
            sort_key: SortKey::Timestamp,
            order: SortOrder::Desc,
            page: 1,
        }
    }
}

impl QuerySpec {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_action(mut self, action: ProductAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn sorted_by(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_key = key;
        self.order = order;
        self
    }

    pub fn on_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// True when `record` passes every set filter.
    pub fn matches<T: LogRecord>(&self, record: &T) -> bool {
        if let Some(needle) = non_blank(&self.name) {
            if !contains_ignore_case(record.product_name(), needle) {
                return false;
            }
        }

        if let Some(needle) = non_blank(&self.sku) {
            if !contains_ignore_case(record.product_sku(), needle) {
                return false;
            }
        }

        if let Some(action) = self.action {
            if record.action() != Some(action) {
                return false;
            }
        }

        if let Some(source) = non_blank(&self.source) {
            if !record.source_label().eq_ignore_ascii_case(source) {
                return false;
            }
        }

        let date = record.timestamp().date_naive();
        if self.start.is_some_and(|start| date < start) {
            return false;
        }
        if self.end.is_some_and(|end| date > end) {
            return false;
        }

        true
    }

    fn compare<T: LogRecord>(&self, a: &T, b: &T) -> Ordering {
        let ordering = match self.sort_key {
            SortKey::Timestamp => a.timestamp().cmp(&b.timestamp()),
            SortKey::ProductName => sort_name(a).cmp(&sort_name(b)),
            SortKey::QuantityChange => a.quantity_change().cmp(&b.quantity_change()),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

fn non_blank(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase()))
}

fn sort_name<T: LogRecord>(record: &T) -> Option<String> {
    record.product_name().map(str::to_lowercase)
}

// =============================================================================
// Query
// =============================================================================

/// One page of a query plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult<'a, T> {
    pub page: Vec<&'a T>,
    pub total_matching: usize,
    /// Effective 1-based page index.
    pub page_index: usize,
    pub page_count: usize,
}

/// Filtered and sorted rows, before pagination. This is what CSV export
/// serializes.
pub fn filter_and_sort<'a, T: LogRecord>(entries: &'a [T], spec: &QuerySpec) -> Vec<&'a T> {
    let mut matching: Vec<&T> = entries.iter().filter(|e| spec.matches(*e)).collect();
    // sort_by is stable: ties keep insertion order in both directions.
    matching.sort_by(|a, b| spec.compare(*a, *b));
    matching
}

/// Runs `spec` over `entries`.
///
/// A page past the end yields an empty page, never an error.
pub fn query<'a, T: LogRecord>(entries: &'a [T], spec: &QuerySpec) -> QueryResult<'a, T> {
    let matching = filter_and_sort(entries, spec);
    let total_matching = matching.len();
    let page_index = spec.page.max(1);
    let page_count = total_matching.div_ceil(PAGE_SIZE);

    let page = matching
        .into_iter()
        .skip((page_index - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .collect();

    QueryResult {
        page,
        total_matching,
        page_index,
        page_count,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
