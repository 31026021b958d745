//! # stockroom-api: HTTP JSON Server
//!
//! axum router over the Stockroom repositories.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  client ──► TraceLayer ──► CorsLayer ──► Router ──► handler            │
//! │                                                        │                │
//! │                                                        ▼                │
//! │                                             stockroom-db repository     │
//! │                                                        │                │
//! │             JSON body  ◄── IntoResponse ◄── ApiResult ◄┘                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The router is built by [`router`] so integration tests can drive it
//! without binding a socket.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

use handlers::{barcode, index, logs, products};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/", get(index::api_index))
        .route("/health", get(index::health))
        .route("/api/", get(index::api_index))
        .route(
            "/api/products/",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/:id/",
            get(products::get_product)
                .put(products::update_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/products/barcode/:code/", get(barcode::resolve_barcode))
        .route("/api/logs/", get(logs::list_product_logs))
        .route("/api/history/", get(logs::list_scan_history))
        .route("/api/history/today/", get(logs::list_scan_history_today))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive when no origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
