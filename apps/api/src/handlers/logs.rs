//! Read-only log endpoints.
//!
//! Both logs are returned whole, newest first. Filtering, sorting and
//! paging happen on the client over this snapshot.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use stockroom_core::{ProductLogEntry, ScanLogEntry};

use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/logs/`
pub async fn list_product_logs(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ProductLogEntry>>> {
    Ok(Json(state.db.product_log().list().await?))
}

/// `GET /api/history/`
pub async fn list_scan_history(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ScanLogEntry>>> {
    Ok(Json(state.db.scan_log().list().await?))
}

/// `GET /api/history/today/` (UTC calendar day)
pub async fn list_scan_history_today(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ScanLogEntry>>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.db.scan_log().list_on(today).await?))
}
