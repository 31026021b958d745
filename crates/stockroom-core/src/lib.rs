//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! This crate holds every rule Stockroom applies to products, scans and
//! audit logs, written as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Clients (browser screens, stockroom-cli)           │   │
//! │  │   List ──► Add/Edit ──► Scan ──► Product log ──► Scan log       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    stockroom-api (axum)                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌───────────┐ ┌────────┐  │   │
//! │  │  │  types  │ │changelog │ │ barcode │ │ log_query │ │ export │  │   │
//! │  │  │ Product │ │  deltas  │ │ resolve │ │ filter    │ │  CSV   │  │   │
//! │  │  │ Entries │ │          │ │ session │ │ sort/page │ │        │  │   │
//! │  │  └─────────┘ └──────────┘ └─────────┘ └───────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK READS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockroom-db (Database Layer)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ScanLogEntry, ProductLogEntry, ...)
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation for product writes
//! - [`changelog`] - Derivation of ProductLogEntry deltas for add/edit/delete
//! - [`barcode`] - Exact/similar resolution rule and the client scan session
//! - [`status`] - Display status of a product log row
//! - [`log_query`] - Filter, sort and paginate log snapshots
//! - [`export`] - CSV rendering of filtered log views
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output. "Now" and "today" are
//!    always parameters, never read from the system clock.
//! 2. **No I/O**: database, network and device access live in other crates.
//! 3. **Explicit Errors**: all errors are typed, never strings or panics.
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::log_query::{query, QuerySpec};
//! use stockroom_core::ProductLogEntry;
//!
//! let entries: Vec<ProductLogEntry> = Vec::new();
//! let result = query(&entries, &QuerySpec::default());
//! assert_eq!(result.total_matching, 0);
//! assert!(result.page.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod changelog;
pub mod error;
pub mod export;
pub mod log_query;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, FieldErrors, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of log rows shown per page in the log views.
pub const PAGE_SIZE: usize = 10;

/// Number of leading barcode characters two codes must share to be "similar".
pub const SIMILAR_PREFIX_LEN: usize = 6;

/// Maximum number of similar candidates returned by a resolution.
pub const MAX_SIMILAR: usize = 5;

/// Default origin label for scan events when the caller gives none.
pub const DEFAULT_SCAN_SOURCE: &str = "scanner";
