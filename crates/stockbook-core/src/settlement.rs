//! # Order Settlement
//!
//! Order totals, net quantities, and the payment-driven status machine.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Settlement                                  │
//! │                                                                         │
//! │  line items ──► net_quantity = quantity - Σ returns                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total_amount = Σ net_quantity × price                                 │
//! │                                                                         │
//! │  payments ───► total_paid = Σ amount                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  remaining = total_amount - total_paid                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  status:  UNPAID ──► REMAIN ──► PAID   (re-derived on every payment)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure arithmetic; the database layer feeds it the sums
//! it reads inside its write transactions and persists the derived status.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::OrderStatus;

// =============================================================================
// Per-Line Settlement Input
// =============================================================================

/// The settlement-relevant slice of one line item: captured price, sold
/// quantity, and the total already returned against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ItemSettlement {
    pub price_cents: i64,
    pub quantity: i64,
    pub returned: i64,
}

impl ItemSettlement {
    /// Net quantity: what still counts as sold after returns.
    ///
    /// ## Example
    /// ```rust
    /// use stockbook_core::settlement::ItemSettlement;
    ///
    /// let item = ItemSettlement { price_cents: 500, quantity: 10, returned: 5 };
    /// assert_eq!(item.net_quantity(), 5);
    /// ```
    #[inline]
    pub const fn net_quantity(&self) -> i64 {
        self.quantity - self.returned
    }

    /// Line total: net quantity times the captured price.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.net_quantity())
    }
}

/// Net quantity for a line item with the given returned total.
#[inline]
pub const fn net_quantity(quantity: i64, returned: i64) -> i64 {
    quantity - returned
}

// =============================================================================
// Totals
// =============================================================================

/// Total amount owed on an order: Σ net_quantity × price over its line items.
pub fn total_amount(items: &[ItemSettlement]) -> Money {
    items.iter().map(ItemSettlement::line_total).sum()
}

/// Total paid on an order: Σ payment amounts (append-only ledger).
pub fn total_paid(amounts_cents: &[i64]) -> Money {
    amounts_cents.iter().copied().map(Money::from_cents).sum()
}

// =============================================================================
// Status Machine
// =============================================================================

/// Derives the order status after payments change.
///
/// ## Rules (evaluated every time a payment is recorded)
/// - already `Paid` stays `Paid` - no transition out of `Paid` is defined,
///   further payments are accepted but not reclassified
/// - `total_paid == total_amount` and non-zero → `Paid`
/// - `total_paid > 0` → `Remain`
/// - otherwise → `Unpaid`
///
/// ## Example
/// ```rust
/// use stockbook_core::money::Money;
/// use stockbook_core::settlement::derive_status;
/// use stockbook_core::types::OrderStatus;
///
/// let total = Money::from_cents(10_000);
///
/// let s = derive_status(OrderStatus::Unpaid, Money::from_cents(4_000), total);
/// assert_eq!(s, OrderStatus::Remain);
///
/// let s = derive_status(s, Money::from_cents(10_000), total);
/// assert_eq!(s, OrderStatus::Paid);
/// ```
pub fn derive_status(current: OrderStatus, total_paid: Money, total_amount: Money) -> OrderStatus {
    if current == OrderStatus::Paid {
        return OrderStatus::Paid;
    }

    if total_paid.is_zero() {
        OrderStatus::Unpaid
    } else if total_paid == total_amount {
        OrderStatus::Paid
    } else {
        OrderStatus::Remain
    }
}

// =============================================================================
// Order Summary
// =============================================================================

/// Settlement snapshot of one order, handed to the REST layer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSummary {
    pub order_id: String,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub total_paid_cents: i64,
    /// total_amount - total_paid. Negative when overpaid.
    pub remaining_cents: i64,
}

impl OrderSummary {
    /// Assembles a summary from the computed totals.
    pub fn new(order_id: String, status: OrderStatus, total_amount: Money, total_paid: Money) -> Self {
        OrderSummary {
            order_id,
            status,
            total_amount_cents: total_amount.cents(),
            total_paid_cents: total_paid.cents(),
            remaining_cents: (total_amount - total_paid).cents(),
        }
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn total_paid(&self) -> Money {
        Money::from_cents(self.total_paid_cents)
    }

    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_quantity_subtracts_all_returns() {
        // quantity=10 with returns of 3 and 2 → net 5
        let item = ItemSettlement {
            price_cents: 100,
            quantity: 10,
            returned: 3 + 2,
        };
        assert_eq!(item.net_quantity(), 5);
        assert_eq!(item.line_total().cents(), 500);
    }

    #[test]
    fn test_total_amount_over_items() {
        let items = [
            ItemSettlement {
                price_cents: 1000,
                quantity: 2,
                returned: 0,
            },
            ItemSettlement {
                price_cents: 500,
                quantity: 4,
                returned: 1,
            },
        ];
        // 2×$10.00 + 3×$5.00 = $35.00
        assert_eq!(total_amount(&items).cents(), 3500);
    }

    #[test]
    fn test_total_amount_empty_order_is_zero() {
        assert!(total_amount(&[]).is_zero());
        assert!(total_paid(&[]).is_zero());
    }

    #[test]
    fn test_status_walk_unpaid_remain_paid() {
        let total = Money::from_cents(10_000); // $100.00

        let s0 = OrderStatus::Unpaid;

        // $40 paid → REMAIN
        let s1 = derive_status(s0, Money::from_cents(4_000), total);
        assert_eq!(s1, OrderStatus::Remain);

        // +$60 → exactly $100 → PAID
        let s2 = derive_status(s1, Money::from_cents(10_000), total);
        assert_eq!(s2, OrderStatus::Paid);
    }

    #[test]
    fn test_status_zero_paid_stays_unpaid() {
        let s = derive_status(
            OrderStatus::Unpaid,
            Money::zero(),
            Money::from_cents(5_000),
        );
        assert_eq!(s, OrderStatus::Unpaid);
    }

    #[test]
    fn test_status_overshoot_without_equality_is_remain() {
        // A single payment past the total never hit equality; it is accepted
        // but not classified as paid.
        let s = derive_status(
            OrderStatus::Unpaid,
            Money::from_cents(12_000),
            Money::from_cents(10_000),
        );
        assert_eq!(s, OrderStatus::Remain);
    }

    #[test]
    fn test_no_transition_out_of_paid() {
        // Once paid, a further payment does not demote the order even though
        // total_paid no longer equals total_amount.
        let s = derive_status(
            OrderStatus::Paid,
            Money::from_cents(11_000),
            Money::from_cents(10_000),
        );
        assert_eq!(s, OrderStatus::Paid);
    }

    #[test]
    fn test_summary_round_trip() {
        let summary = OrderSummary::new(
            "o1".to_string(),
            OrderStatus::Remain,
            Money::from_cents(10_000),
            Money::from_cents(4_000),
        );
        assert_eq!(summary.remaining_cents, 6_000);
        assert_eq!(summary.total_amount() - summary.total_paid(), summary.remaining());
    }
}
