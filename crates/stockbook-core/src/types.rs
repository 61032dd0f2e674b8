//! # Domain Types
//!
//! Core domain types used throughout Stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  customer_id    │   │  order_id (FK)  │       │
//! │  │  purchase_price │   │  status         │   │  method         │       │
//! │  │  customer_price │   │                 │   │  amount_cents   │       │
//! │  └────────┬────────┘   └────────┬────────┘   └─────────────────┘       │
//! │           │                     │                                       │
//! │  ┌────────┴────────┐   ┌────────┴────────┐   ┌─────────────────┐       │
//! │  │ Purchase        │   │    LineItem     │   │   ItemReturn    │       │
//! │  │ Production      │   │  price snapshot │──►│  quantity       │       │
//! │  │ (stock inflow)  │   │  quantity       │   │  reason         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Stock is DERIVED: purchases + productions - sold items + returns      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! An Order exclusively owns its LineItems and Payments; a LineItem
//! exclusively owns its ItemReturns. Products and Customers are referenced,
//! never owned - deleting one with live dependents is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue.
///
/// Stock quantity is intentionally absent: it is always derived from the
/// four ledgers (see [`crate::stock`]), never stored where it could drift.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name. Also appears verbatim in out-of-stock messages.
    pub name: String,

    /// What we pay for the product, in cents. Charged to supplier customers.
    pub purchase_price_cents: i64,

    /// What a regular customer pays, in cents.
    pub customer_price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the purchase price as Money.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Returns the customer price as Money.
    #[inline]
    pub fn customer_price(&self) -> Money {
        Money::from_cents(self.customer_price_cents)
    }

    /// Price snapshotted onto a new line item.
    ///
    /// Supplier customers are charged the purchase price; everyone else
    /// the customer price.
    #[inline]
    pub fn price_for(&self, is_supplier: bool) -> Money {
        if is_supplier {
            self.purchase_price()
        } else {
            self.customer_price()
        }
    }
}

/// Input for creating or replacing a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub purchase_price_cents: i64,
    pub customer_price_cents: i64,
}

/// A product row joined with its derived stock level.
///
/// Produced by the batched listing query so that callers never fall into
/// per-row stock recomputation (N+1).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductWithStock {
    pub id: String,
    pub name: String,
    pub purchase_price_cents: i64,
    pub customer_price_cents: i64,
    /// Derived: purchases + productions - sold + returned.
    pub quantity_in_stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Inflows: Production & Purchase
// =============================================================================

/// A record of manufactured quantity added to stock. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Production {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub production_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a production run.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductionInput {
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub production_date: DateTime<Utc>,
}

/// A record of quantity bought in from a supplier. Immutable once created.
///
/// The unit price is the price paid *at the time*, kept separately from the
/// product's current purchase price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub product_id: String,
    pub purchase_unit_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a stock purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseInput {
    pub product_id: String,
    pub purchase_unit_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer placing orders.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub given_name: String,
    pub surname: String,
    pub phone_number: String,
    /// Supplier customers get line items priced at the product's purchase
    /// price instead of the customer price.
    pub is_supplier: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Display name: "given_name surname".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.surname)
    }
}

/// Input for creating or replacing a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub given_name: String,
    pub surname: String,
    pub phone_number: String,
    pub is_supplier: bool,
}

// =============================================================================
// Order Status
// =============================================================================

/// Payment-driven lifecycle status of an order.
///
/// ```text
/// UNPAID ──(0 < paid < total)──► REMAIN ──(paid == total)──► PAID
///    └────────────(paid == total in one go)──────────────────┘
/// ```
///
/// There is no transition out of `Paid`; further payments are accepted but
/// do not reclassify the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// No payment recorded yet.
    Unpaid,
    /// Partially paid: 0 < total_paid < total_amount.
    Remain,
    /// Fully paid: total_paid == total_amount.
    Paid,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Unpaid
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer's order, aggregating line items and payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Line Item
// =============================================================================

/// One product line within an order.
///
/// Uses the snapshot pattern: `price_cents` is captured from the product at
/// creation time (purchase or customer price depending on the customer) and
/// is NOT re-snapshotted when quantities merge or change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Unit price in cents at the time the line was created (frozen).
    pub price_cents: i64,
    /// Quantity sold. Always >= 1; returns reduce the *net* quantity
    /// without rewriting this field.
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LineItem {
    /// Returns the captured unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Item Return
// =============================================================================

/// A partial or full return against a line item. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ItemReturn {
    pub id: String,
    pub item_id: String,
    pub quantity: i64,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub return_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Credit card.
    CreditCard,
    /// Bank transfer.
    BankTransfer,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// A payment towards an order. Append-only: never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    /// Amount paid in cents. Always >= 1.
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            name: "wheat flour".to_string(),
            purchase_price_cents: 700,
            customer_price_cents: 1000,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_for_supplier_uses_purchase_price() {
        let p = product();
        assert_eq!(p.price_for(true).cents(), 700);
        assert_eq!(p.price_for(false).cents(), 1000);
    }

    #[test]
    fn test_customer_full_name() {
        let now = Utc::now();
        let c = Customer {
            id: "c1".to_string(),
            given_name: "Awa".to_string(),
            surname: "Diop".to_string(),
            phone_number: "770000000".to_string(),
            is_supplier: false,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(c.full_name(), "Awa Diop");
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Unpaid);
    }

    #[test]
    fn test_payment_defaults() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }
}
