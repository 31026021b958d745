//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().update(id, &patch, source)                      │
//! │       ▼                                                                 │
//! │  ProductRepository ─────────► product_log::insert (same transaction)   │
//! │  ├── list / get / get_by_id                                            │
//! │  ├── candidates_for_barcode                                            │
//! │  └── create / update / delete                                          │
//! │                                                                         │
//! │  ProductLogRepository          ScanLogRepository                       │
//! │  └── list / count              ├── record                              │
//! │                                └── list / list_on(date)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod product;
pub mod product_log;
pub mod scan_log;
