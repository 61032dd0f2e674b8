//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockbook-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures + referential guards          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → REST layer → client     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, available count)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are recovered at the
/// operation boundary and returned to the caller as typed rejections - never
/// raised past the core as unhandled faults.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity exceeds the derived stock level.
    ///
    /// ## When This Occurs
    /// - Creating a line item for more than is in stock
    /// - Merging into an existing line item such that the merged total
    ///   exceeds stock
    /// - Updating a line item to a quantity above stock
    ///
    /// ## Message Contract
    /// The rendered message is surfaced verbatim to the client as user
    /// feedback, so it carries the exact remaining count and product name.
    #[error("{available} {product} left in stock")]
    OutOfStock { available: i64, product: String },

    /// Quantity input rejected: non-positive, or above a permitted maximum
    /// (e.g. returning more than is currently counted as sold).
    #[error("invalid quantity: {reason}")]
    InvalidQuantity { reason: String },

    /// Payment amount is not a positive number of cents.
    #[error("invalid payment amount: {amount} (must be at least 1)")]
    InvalidPaymentAmount { amount: i64 },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds an `InvalidQuantity` rejection for a non-positive quantity.
    pub fn quantity_not_positive(value: i64) -> Self {
        CoreError::InvalidQuantity {
            reason: format!("{value} must be at least 1"),
        }
    }

    /// Builds an `InvalidQuantity` rejection for an over-cap return.
    pub fn return_exceeds_sold(requested: i64, net: i64) -> Self {
        CoreError::InvalidQuantity {
            reason: format!("cannot return {requested}, only {net} currently sold"),
        }
    }

    /// Builds an `InvalidQuantity` rejection for a quantity shrink below
    /// the already-returned total.
    pub fn quantity_below_returned(requested: i64, returned: i64) -> Self {
        CoreError::InvalidQuantity {
            reason: format!("cannot set quantity to {requested}, {returned} already returned"),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet basic shape requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
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

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, bad phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
    fn test_out_of_stock_message_is_verbatim_user_feedback() {
        let err = CoreError::OutOfStock {
            available: 3,
            product: "wheat flour".to_string(),
        };
        assert_eq!(err.to_string(), "3 wheat flour left in stock");
    }

    #[test]
    fn test_invalid_quantity_messages() {
        let err = CoreError::quantity_not_positive(0);
        assert_eq!(err.to_string(), "invalid quantity: 0 must be at least 1");

        let err = CoreError::return_exceeds_sold(7, 5);
        assert_eq!(
            err.to_string(),
            "invalid quantity: cannot return 7, only 5 currently sold"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
