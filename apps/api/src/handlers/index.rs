//! Service index and health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /` and `GET /api/`
pub async fn api_index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Stockroom inventory API",
        "endpoints": {
            "products": "/api/products/",
            "barcode_lookup": "/api/products/barcode/{code}/",
            "scan_history": "/api/history/",
            "scan_history_today": "/api/history/today/",
            "product_logs": "/api/logs/",
            "health": "/health"
        },
        "status": "OK"
    }))
}

/// `GET /health`: 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok" })),
        )
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "database": "unreachable" })),
        )
    }
}
