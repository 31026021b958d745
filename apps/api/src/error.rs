//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ├── FieldErrors ────────────► 400 VALIDATION_ERROR  (fields)   │
//! │         ├── DbError::NotFound ──────► 404 NOT_FOUND                     │
//! │         ├── DbError::UniqueViolation► 409 CONFLICT          (fields)   │
//! │         ├── DbError unavailable ────► 503 STORE_UNAVAILABLE (retry)    │
//! │         └── anything else ──────────► 500 DATABASE_ERROR / INTERNAL    │
//! │                                                                         │
//! │  Body:                                                                  │
//! │  { "code": "CONFLICT",                                                  │
//! │    "message": "Duplicate sku: 'WID123' already exists",                 │
//! │    "fields": { "sku": ["product with this sku already exists."] } }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "No such product" and "store unreachable" always map to different codes so
//! a client can offer "add new" for the first and "try again" for the second.

use std::collections::BTreeMap;
use std::fmt;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use stockroom_core::{CoreError, FieldErrors};
use stockroom_db::DbError;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Per-field messages for form errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Unique field already taken (409)
    Conflict,

    /// Store unreachable, retry later (503)
    StoreUnavailable,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            fields: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Attaches a message to one field.
    pub fn with_field(mut self, field: &str, message: impl Into<String>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .entry(field.to_string())
            .or_default()
            .push(message.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            tracing::warn!(error = %err, "Store unavailable");
            return ApiError::new(
                ErrorCode::StoreUnavailable,
                "Could not reach the product store, try again",
            );
        }

        match err {
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, value } => {
                let message = format!("Duplicate {}: '{}' already exists", field, value);
                let field_message = format!("product with this {} already exists.", field);
                ApiError::new(ErrorCode::Conflict, message).with_field(&field, field_message)
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            other => {
                tracing::error!("Internal database error: {}", other);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts a failed payload check into a 400 with per-field messages.
impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError {
            code: ErrorCode::ValidationError,
            message: errors.to_string(),
            fields: Some(errors.by_field()),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => ApiError::from(errors),
            CoreError::InvalidQuery(message) => ApiError::validation(message),
            CoreError::Export(e) => {
                tracing::error!("Export failed: {}", e);
                ApiError::internal("Export failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::not_found(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::ValidationError;

    #[test]
    fn test_unique_violation_is_conflict_on_field() {
        let err = ApiError::from(DbError::duplicate("sku", "WID123"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        let fields = err.fields.unwrap();
        assert_eq!(fields["sku"].len(), 1);
    }

    #[test]
    fn test_unavailable_is_not_not_found() {
        let down = ApiError::from(DbError::ConnectionFailed("closed".into()));
        let missing = ApiError::from(DbError::not_found("Product", 7));
        assert_eq!(down.code, ErrorCode::StoreUnavailable);
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(missing.code, ErrorCode::NotFound);
        assert_eq!(missing.message, "Product not found: 7");
    }

    #[test]
    fn test_field_errors_keep_every_field() {
        let mut errors = FieldErrors::new();
        errors.check(Err(ValidationError::Required {
            field: "name".into(),
        }));
        errors.check(Err(ValidationError::Negative {
            field: "quantity".into(),
        }));

        let err = ApiError::from(errors);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let fields = err.fields.unwrap();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("quantity"));
    }

    #[test]
    fn test_body_uses_screaming_codes() {
        let json = serde_json::to_value(ApiError::not_found("gone")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("fields").is_none());
    }
}
