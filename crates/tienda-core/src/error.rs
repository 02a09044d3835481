//! # Error Types
//!
//! Domain-specific error types for tienda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tienda-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tienda-store errors (separate crate)                                  │
//! │  └── StoreError       - Sheet read/write failures                      │
//! │                                                                         │
//! │  tienda-sync errors (separate crate)                                   │
//! │  └── SyncError        - Config, HTTP and web app failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError   (rejected, nothing changes)       │
//! │        StoreError → SyncError         (logged, local state kept)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, quantities)
//! 3. Errors are enum variants, never String
//! 4. A rejected command never leaves a partial change behind

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Returned by the command functions before any event is produced, so the
/// dataset is untouched whenever one of these comes back.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Editing a product another session already deleted
    /// - Adjusting stock for an id that is not in the catalog
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale form (qty: 5)
    ///      │
    ///      ▼
    /// Ledger: available=3 (+ original qty when editing)
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Funda 15 PRO", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Stock insuficiente para Funda 15 PRO"
    /// ```
    ///
    /// `available` is the post-adjustment figure, i.e. it already includes
    /// the quantity the original version of an edited sale gave back.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Two variants in one batch share the same (color, model) pair.
    #[error("Duplicate variant: model '{model}', color '{color}'")]
    DuplicateVariant { model: String, color: String },

    /// A sale draft had no usable lines after dropping the invalid ones.
    #[error("Sale must contain at least one valid product")]
    NoValidItems,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., unparsable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn must_be_positive(field: &str) -> Self {
        ValidationError::MustBePositive {
            field: field.to_string(),
        }
    }

    pub fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
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
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Funda 15 PRO".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Funda 15 PRO: available 3, requested 5"
        );
        assert_eq!(
            CoreError::NoValidItems.to_string(),
            "Sale must contain at least one valid product"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");
        assert_eq!(
            ValidationError::negative("defaultUnitPrice").to_string(),
            "defaultUnitPrice cannot be negative"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("category").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
