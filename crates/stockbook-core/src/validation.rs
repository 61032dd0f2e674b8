//! # Validation Module
//!
//! The stock guard and input validation for Stockbook.
//!
//! ## The Stock Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stock Guard: check_stock(product, requested)                           │
//! │                                                                         │
//! │  1. requested >= 1?            ── no ──► InvalidQuantity                │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  2. available = ledger.available()                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. requested <= available?    ── no ──► OutOfStock(available, name)   │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  4. Ok                                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Advisory vs. Enforced
//! Called on its own, the guard is advisory - the answer is stale the moment
//! it is produced. Every stock-decreasing mutation in `stockbook-db` runs
//! the guard *inside* its serialized write transaction, so the read and the
//! write it authorizes cannot be interleaved by a concurrent writer.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::stock::StockLedger;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a stored phone number.
pub const PHONE_NUMBER_MAX_LEN: usize = 12;

/// Maximum length of a product name or customer name field.
pub const NAME_MAX_LEN: usize = 255;

// =============================================================================
// Stock Guard
// =============================================================================

/// Validates a requested quantity against the derived stock level.
///
/// ## Rules, in order
/// 1. `requested` must be >= 1, otherwise `InvalidQuantity`
/// 2. `requested` must not exceed `ledger.available()`, otherwise
///    `OutOfStock` carrying the exact remaining count and product name
///    (the rendered message is shown to the user verbatim)
///
/// ## Example
/// ```rust
/// use stockbook_core::stock::StockLedger;
/// use stockbook_core::validation::check_stock;
///
/// let ledger = StockLedger { purchased: 10, produced: 0, sold: 7, returned: 0 };
///
/// assert!(check_stock("maize meal", &ledger, 3).is_ok());
/// let err = check_stock("maize meal", &ledger, 4).unwrap_err();
/// assert_eq!(err.to_string(), "3 maize meal left in stock");
/// ```
pub fn check_stock(product_name: &str, ledger: &StockLedger, requested: i64) -> CoreResult<()> {
    validate_quantity(requested)?;

    let available = ledger.available();
    if requested > available {
        return Err(CoreError::OutOfStock {
            available,
            product: product_name.to_string(),
        });
    }

    Ok(())
}

/// Validates an order/line-item quantity.
///
/// ## Rules
/// - Must be >= 1. Zero used to be accepted by an earlier revision of the
///   system and produced ghost line items; it is rejected here.
pub fn validate_quantity(qty: i64) -> CoreResult<()> {
    if qty < 1 {
        return Err(CoreError::quantity_not_positive(qty));
    }
    Ok(())
}

/// Validates a return quantity against the line item's current net quantity.
///
/// ## Rules
/// - Must be >= 1
/// - Must not exceed `net_quantity` (cannot return more than is currently
///   counted as sold)
pub fn validate_return_quantity(requested: i64, net_quantity: i64) -> CoreResult<()> {
    if requested < 1 {
        return Err(CoreError::quantity_not_positive(requested));
    }
    if requested > net_quantity {
        return Err(CoreError::return_exceeds_sold(requested, net_quantity));
    }
    Ok(())
}

/// Validates a replacement line-item quantity against the total already
/// returned on that line.
///
/// ## Rules
/// - Must not drop below `returned`: the net quantity would go negative,
///   which inflates the derived stock level past what was ever purchased
///   and drives the order total below zero
pub fn validate_quantity_covers_returns(new_quantity: i64, returned: i64) -> CoreResult<()> {
    if new_quantity < returned {
        return Err(CoreError::quantity_below_returned(new_quantity, returned));
    }
    Ok(())
}

/// Validates a stock-inflow quantity (purchase or production run).
///
/// Unlike order quantities, zero is allowed: a voided delivery can be
/// recorded as a zero-quantity row without affecting stock.
pub fn validate_inflow_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Money Validators
// =============================================================================

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (giveaway pricing)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a payment amount in cents.
///
/// ## Rules
/// - Must be at least 1 cent; zero or negative payments are meaningless
///   and would distort the settlement state machine.
pub fn validate_payment_amount(cents: i64) -> CoreResult<()> {
    if cents < 1 {
        return Err(CoreError::InvalidPaymentAmount { amount: cents });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 255 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name_field("name", name)
}

/// Validates a customer name part (given name or surname).
pub fn validate_person_name(field: &str, value: &str) -> ValidationResult<()> {
    validate_name_field(field, value)
}

fn validate_name_field(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > NAME_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: NAME_MAX_LEN,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Must not be empty
/// - Maximum 12 characters
/// - Digits with an optional leading `+`
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone_number".to_string(),
        });
    }

    if phone.len() > PHONE_NUMBER_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "phone_number".to_string(),
            max: PHONE_NUMBER_MAX_LEN,
        });
    }

    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone_number".to_string(),
            reason: "must contain only digits, optionally prefixed with +".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn ledger(available: i64) -> StockLedger {
        StockLedger {
            purchased: available,
            produced: 0,
            sold: 0,
            returned: 0,
        }
    }

    #[test]
    fn test_check_stock_boundaries() {
        let l = ledger(5);

        // Exactly the available amount succeeds
        assert!(check_stock("flour", &l, 5).is_ok());
        // One past it is rejected
        assert!(matches!(
            check_stock("flour", &l, 6),
            Err(CoreError::OutOfStock {
                available: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_check_stock_rejects_non_positive_before_reading_stock() {
        let l = ledger(5);
        assert!(matches!(
            check_stock("flour", &l, 0),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            check_stock("flour", &l, -3),
            Err(CoreError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_out_of_stock_carries_name_and_count() {
        let err = check_stock("maize meal", &ledger(2), 9).unwrap_err();
        assert_eq!(err.to_string(), "2 maize meal left in stock");
    }

    #[test]
    fn test_validate_return_quantity() {
        assert!(validate_return_quantity(1, 5).is_ok());
        assert!(validate_return_quantity(5, 5).is_ok());
        assert!(validate_return_quantity(6, 5).is_err());
        assert!(validate_return_quantity(0, 5).is_err());
        assert!(validate_return_quantity(-1, 5).is_err());
    }

    #[test]
    fn test_validate_quantity_covers_returns() {
        assert!(validate_quantity_covers_returns(5, 4).is_ok());
        // Shrinking exactly to the returned total leaves net zero - allowed
        assert!(validate_quantity_covers_returns(4, 4).is_ok());
        assert!(matches!(
            validate_quantity_covers_returns(3, 4),
            Err(CoreError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_validate_inflow_quantity_allows_zero() {
        assert!(validate_inflow_quantity(0).is_ok());
        assert!(validate_inflow_quantity(10).is_ok());
        assert!(validate_inflow_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(100_000).is_ok());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(-50).is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("770000000").is_ok());
        assert!(validate_phone_number("+221770000").is_ok());
        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("12345678901234").is_err());
        assert!(validate_phone_number("77-00-00").is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_product_name("wheat flour 25kg").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_person_name("surname", "Diop").is_ok());
        assert!(validate_person_name("surname", "").is_err());
        assert!(validate_product_name(&"x".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("").is_err());
    }
}
