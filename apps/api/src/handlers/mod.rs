//! # HTTP Handlers
//!
//! One module per resource. Handlers validate input, call exactly one
//! repository operation and map the result; they hold no state of their own.
//!
//! ## Route Table
//! ```text
//! ┌──────────────────────────────────────┬──────────┬────────────────────────┐
//! │ Path                                 │ Method   │ Handler                │
//! ├──────────────────────────────────────┼──────────┼────────────────────────┤
//! │ /  /api/                             │ GET      │ index::api_index       │
//! │ /health                              │ GET      │ index::health          │
//! │ /api/products/                       │ GET POST │ products::*            │
//! │ /api/products/{id}/                  │ GET PUT  │ products::*            │
//! │                                      │ DELETE   │                        │
//! │ /api/products/barcode/{code}/        │ GET      │ barcode::resolve_*     │
//! │ /api/logs/                           │ GET      │ logs::list_product_*   │
//! │ /api/history/                        │ GET      │ logs::list_scan_*      │
//! │ /api/history/today/                  │ GET      │ logs::list_scan_*_today│
//! └──────────────────────────────────────┴──────────┴────────────────────────┘
//! ```

pub mod barcode;
pub mod index;
pub mod logs;
pub mod products;
