//! # Validation Module
//!
//! Field validation for product writes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client                                                        │
//! │  └── Required inputs, numeric inputs                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                           │
//! │  ├── Type validation (deserialization)                                  │
//! │  └── THIS MODULE: every field checked, all failures collected           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── UNIQUE(sku) → conflict, reported separately from validation        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_sku, validate_count};
//!
//! assert!(validate_sku("WID-123").is_ok());
//! assert!(validate_count("quantity", -5).is_err());
//! ```

use crate::error::{FieldErrors, ValidationError};
use crate::types::{NewProduct, ProductPatch};

/// Result type for single-field validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product name.
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted SKU.
pub const MAX_SKU_LEN: usize = 50;

/// Longest accepted barcode.
pub const MAX_BARCODE_LEN: usize = 50;

/// Longest scanned code accepted for lookup. Scanned input is not bound to
/// the product barcode column: GS1-128 and 2D payloads run longer.
pub const MAX_SCANNED_CODE_LEN: usize = 512;

/// Longest accepted scan source label.
pub const MAX_SOURCE_LEN: usize = 50;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a product name: non-blank, at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a SKU.
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_SKU_LEN`] characters
/// - No whitespace inside
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert!(validate_sku("A1").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if sku.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional barcode.
///
/// No length or checksum rule beyond the column width: scanners emit many
/// symbologies and the resolver only performs lookups.
pub fn validate_barcode(barcode: Option<&str>) -> ValidationResult<()> {
    match barcode {
        Some(code) if code.chars().count() > MAX_BARCODE_LEN => Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates a scanned code before it is looked up.
///
/// Codes longer than any stored barcode are still valid: they resolve to
/// nothing and are logged like every other attempt.
pub fn validate_scanned_code(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }
    if code.chars().count() > MAX_SCANNED_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_SCANNED_CODE_LEN,
        });
    }
    Ok(())
}

/// Validates a scan origin label.
pub fn validate_scan_source(source: &str) -> ValidationResult<()> {
    if source.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "source".to_string(),
        });
    }
    if source.chars().count() > MAX_SOURCE_LEN {
        return Err(ValidationError::TooLong {
            field: "source".to_string(),
            max: MAX_SOURCE_LEN,
        });
    }
    Ok(())
}

/// Validates a non-negative count such as `quantity` or `alert_threshold`.
pub fn validate_count(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates every field of a create payload, collecting all failures.
pub fn validate_new_product(product: &NewProduct) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check(validate_name(&product.name));
    errors.check(validate_sku(&product.sku));
    errors.check(validate_barcode(product.barcode.as_deref()));
    errors.check(validate_count("quantity", product.quantity));
    errors.check(validate_count("alert_threshold", product.alert_threshold));
    errors.into_result()
}

/// Validates the fields present in a partial update.
pub fn validate_patch(patch: &ProductPatch) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(name) = &patch.name {
        errors.check(validate_name(name));
    }
    if let Some(sku) = &patch.sku {
        errors.check(validate_sku(sku));
    }
    if let Some(barcode) = &patch.barcode {
        errors.check(validate_barcode(barcode.as_deref()));
    }
    if let Some(quantity) = patch.quantity {
        errors.check(validate_count("quantity", quantity));
    }
    if let Some(threshold) = patch.alert_threshold {
        errors.check(validate_count("alert_threshold", threshold));
    }
    errors.into_result()
}

// =============================================================================
// Unit Tests
// =============================================================================
