//! Barcode lookup endpoint.
//!
//! ```text
//!   GET /api/products/barcode/{code}/?source=scanner
//!        │
//!        ├── invalid code/source ─────► 400
//!        ├── store unreachable ───────► 503   (client: "try again")
//!        ├── no exact, no similar ────► 404   (client: "add new")
//!        └── otherwise ───────────────► 200 { exact, similar }
//! ```
//!
//! Every attempt that reaches the store is recorded in the scan log,
//! including the ones answered with 404.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use stockroom_core::barcode::Resolution;
use stockroom_core::validation::{validate_scan_source, validate_scanned_code};
use stockroom_core::{FieldErrors, DEFAULT_SCAN_SOURCE};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ScanParams {
    pub source: Option<String>,
}

/// `GET /api/products/barcode/{code}/`
pub async fn resolve_barcode(
    State(state): State<AppState>,
    code: Result<Path<String>, PathRejection>,
    params: Result<Query<ScanParams>, QueryRejection>,
) -> ApiResult<Json<Resolution>> {
    let Path(code) = code?;
    let Query(params) = params?;

    let code = code.trim();
    let source = params
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SCAN_SOURCE);

    let mut errors = FieldErrors::new();
    errors.check(validate_scanned_code(code));
    errors.check(validate_scan_source(source));
    errors.into_result()?;

    let resolution = state.db.resolver().resolve(code, source).await?;
    if resolution.is_empty() {
        return Err(ApiError::not_found(format!(
            "No product matches barcode '{}'",
            code
        )));
    }

    Ok(Json(resolution))
}
