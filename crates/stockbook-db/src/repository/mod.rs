//! # Repository Implementations
//!
//! One repository per aggregate root:
//!
//! - [`product`] - catalogue CRUD, purchase/production ledgers, derived
//!   stock level (single-pass aggregation, batched for listings)
//! - [`customer`] - customer CRUD with order-deletion guard
//! - [`order`] - orders, line items (stock-guarded), returns, payments,
//!   settlement
//!
//! All repositories share the pool by cloning it (SqlitePool is an Arc
//! internally, cloning is cheap).

pub mod customer;
pub mod order;
pub mod product;

use sqlx::Sqlite;

use crate::error::DbResult;
use stockbook_core::StockLedger;

/// Generates a new entity ID.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// One-pass aggregation of the four stock ledgers for a single product.
///
/// Each sum COALESCEs to 0 so empty ledgers never null-poison the result.
const STOCK_LEDGER_SQL: &str = r#"
SELECT
    COALESCE((SELECT SUM(quantity) FROM purchases
              WHERE product_id = ?1), 0) AS purchased,
    COALESCE((SELECT SUM(quantity) FROM productions
              WHERE product_id = ?1), 0) AS produced,
    COALESCE((SELECT SUM(quantity) FROM order_items
              WHERE product_id = ?1), 0) AS sold,
    COALESCE((SELECT SUM(r.quantity) FROM item_returns r
              JOIN order_items i ON r.item_id = i.id
              WHERE i.product_id = ?1), 0) AS returned
"#;

/// Fetches the stock ledger sums for one product in a single statement.
///
/// Takes any executor so it can run against the pool (advisory read) or
/// inside a write transaction (enforced stock guard). Inside a
/// `BEGIN IMMEDIATE` transaction this read is serialized with the write it
/// authorizes.
pub(crate) async fn fetch_stock_ledger<'e, E>(executor: E, product_id: &str) -> DbResult<StockLedger>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let ledger = sqlx::query_as::<_, StockLedger>(STOCK_LEDGER_SQL)
        .bind(product_id)
        .fetch_one(executor)
        .await?;

    Ok(ledger)
}
