//! # Stock Ledger
//!
//! Derived stock level for a product.
//!
//! ## Derived-Field-As-Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │             How a Product's Stock Level Is Computed                     │
//! │                                                                         │
//! │   purchases ───► Σ quantity ──┐                                        │
//! │   productions ─► Σ quantity ──┤ (+)                                    │
//! │                               ├──► available stock                     │
//! │   order_items ─► Σ quantity ──┤ (-)                                    │
//! │   returns ─────► Σ quantity ──┘ (+)                                    │
//! │                                                                         │
//! │   Each sum defaults to 0 when no rows exist (never null-propagates).   │
//! │   The level is recomputed on every read - there is no stored stock     │
//! │   column anywhere that could drift out of sync.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer fills a [`StockLedger`] from a single aggregating query
//! (one pass per product, batched for listings); this module owns the
//! arithmetic so it can be tested without a database.

use serde::{Deserialize, Serialize};

// =============================================================================
// Stock Ledger
// =============================================================================

/// The four independent sums a product's stock level is derived from.
///
/// ## Example
/// ```rust
/// use stockbook_core::stock::StockLedger;
///
/// let ledger = StockLedger {
///     purchased: 40,
///     produced: 10,
///     sold: 30,
///     returned: 5,
/// };
/// assert_eq!(ledger.available(), 25);
///
/// // No rows in any ledger: everything defaults to zero
/// assert_eq!(StockLedger::default().available(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLedger {
    /// Total quantity bought in from suppliers.
    pub purchased: i64,
    /// Total quantity manufactured.
    pub produced: i64,
    /// Total quantity on order line items, across all orders.
    pub sold: i64,
    /// Total quantity returned against those line items.
    pub returned: i64,
}

impl StockLedger {
    /// Current available stock.
    ///
    /// May be negative only transiently while a guarded mutation is being
    /// rejected - no mutation path commits a state where this persists
    /// below zero.
    #[inline]
    pub const fn available(&self) -> i64 {
        self.purchased + self.produced - self.sold + self.returned
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_combines_all_four_ledgers() {
        let ledger = StockLedger {
            purchased: 100,
            produced: 20,
            sold: 70,
            returned: 10,
        };
        assert_eq!(ledger.available(), 60);
    }

    #[test]
    fn test_empty_ledgers_default_to_zero() {
        assert_eq!(StockLedger::default().available(), 0);

        // A single populated ledger must not be poisoned by the empty ones
        let only_produced = StockLedger {
            produced: 15,
            ..Default::default()
        };
        assert_eq!(only_produced.available(), 15);
    }

    #[test]
    fn test_returns_flow_back_into_stock() {
        let ledger = StockLedger {
            purchased: 10,
            produced: 0,
            sold: 10,
            returned: 4,
        };
        assert_eq!(ledger.available(), 4);
    }

    #[test]
    fn test_transiently_negative_is_representable() {
        // The guard rejects the mutation that caused this; the math itself
        // must not saturate or wrap.
        let ledger = StockLedger {
            purchased: 5,
            produced: 0,
            sold: 8,
            returned: 0,
        };
        assert_eq!(ledger.available(), -3);
    }
}
