//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - One field failed validation                    │
//! │  └── FieldErrors      - Every failing field of one request             │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  stockroom-api errors (in app)                                         │
//! │  └── ApiError         - What clients see (JSON body + status)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more product fields were rejected.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// A log query parameter could not be understood.
    ///
    /// ## When This Occurs
    /// - Unknown sort key or order from a query string
    /// - Unknown action filter
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Rendering a CSV export failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single field that failed validation.
///
/// Every variant carries the field name so the API can return
/// field-level messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value below zero.
    #[error("{field} must be zero or greater")]
    Negative { field: String },

    /// Invalid format (e.g., whitespace inside a SKU).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// All validation failures for one write, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", summary(.0))]
pub struct FieldErrors(Vec<ValidationError>);

fn summary(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FieldErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        FieldErrors(Vec::new())
    }

    /// Records the outcome of one field check.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.0.push(err);
        }
    }

    /// Returns `Ok(())` when nothing failed, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Groups messages by field name, the shape clients render next to inputs.
    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for err in &self.0 {
            map.entry(err.field().to_string())
                .or_default()
                .push(err.to_string());
        }
        map
    }
}

impl From<ValidationError> for FieldErrors {
    fn from(err: ValidationError) -> Self {
        FieldErrors(vec![err])
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");
        assert_eq!(err.field(), "sku");

        let err = ValidationError::Negative {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be zero or greater");
    }

    #[test]
    fn test_field_errors_group_by_field() {
        let mut errors = FieldErrors::new();
        errors.check(Err(ValidationError::Required {
            field: "name".to_string(),
        }));
        errors.check(Ok(()));
        errors.check(Err(ValidationError::Negative {
            field: "quantity".to_string(),
        }));

        let grouped = errors.by_field();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["name"], vec!["name is required".to_string()]);
        assert!(errors.to_string().contains("quantity must be zero or greater"));
    }

    #[test]
    fn test_empty_field_errors_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_field_errors_convert_to_core_error() {
        let errors: FieldErrors = ValidationError::Required {
            field: "sku".to_string(),
        }
        .into();
        let core_err: CoreError = errors.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
