//! # Order Repository
//!
//! Orders, stock-guarded line items, returns, payments, and settlement.
//!
//! ## Write Transaction Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Every read-then-write runs under BEGIN IMMEDIATE             │
//! │                                                                         │
//! │  add_line_item          read stock + existing line  →  insert/merge    │
//! │  update_line_quantity   read stock                  →  update          │
//! │  create_return          read net quantity           →  insert          │
//! │  record_payment         read totals                 →  insert + status │
//! │                                                                         │
//! │  IMMEDIATE takes the write lock BEFORE the first read, so a second     │
//! │  writer queues (busy_timeout) and then sees committed state. The       │
//! │  loser of a stock race gets a clean OutOfStock, never an oversell      │
//! │  and never a duplicate (order, product) row.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Settlement totals are recomputed from the ledgers on every payment and
//! the derived status is persisted on the order row. The payments table is
//! append-only.

use chrono::Utc;
use sqlx::{Connection, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{fetch_stock_ledger, new_id};
use stockbook_core::settlement::{self, ItemSettlement};
use stockbook_core::validation::{
    check_stock, validate_payment_amount, validate_quantity, validate_quantity_covers_returns,
    validate_return_quantity,
};
use stockbook_core::{
    ItemReturn, LineItem, Order, OrderStatus, OrderSummary, Payment, PaymentMethod, PaymentStatus,
    Product,
};

const ORDER_COLUMNS: &str = "id, customer_id, status, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, order_id, product_id, price_cents, quantity, created_at, updated_at";
const RETURN_COLUMNS: &str =
    "id, item_id, quantity, reason, return_date, created_at, updated_at";
const PAYMENT_COLUMNS: &str =
    "id, order_id, amount_cents, method, status, created_at, updated_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Order CRUD
    // =========================================================================

    /// Creates an empty order for a customer, starting `Unpaid`.
    pub async fn create_order(&self, customer_id: &str) -> DbResult<Order> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE id = ?1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Err(DbError::not_found("Customer", customer_id));
        }

        let now = Utc::now();
        let order = Order {
            id: new_id(),
            customer_id: customer_id.to_string(),
            status: OrderStatus::Unpaid,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.id, customer_id = %customer_id, "Creating order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&order.id)
        .bind(&order.customer_id)
        .bind(order.status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists orders, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lists a customer's orders, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Deletes an order. Rejected while line items or payments reference it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;

        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let payments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE order_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if items > 0 || payments > 0 {
            let mut dependents = Vec::new();
            if items > 0 {
                dependents.push(format!("{items} line items"));
            }
            if payments > 0 {
                dependents.push(format!("{payments} payments"));
            }
            return Err(DbError::deletion_blocked("Order", id, dependents.join(", ")));
        }

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        tx.commit().await?;

        debug!(id = %id, "Deleted order");
        Ok(())
    }

    // =========================================================================
    // Line Items
    // =========================================================================

    /// Adds a product to an order, merging into an existing line for the
    /// same product.
    ///
    /// ## Behavior (inside one IMMEDIATE transaction)
    /// 1. Resolve order, its customer, and the product
    /// 2. Read the derived stock level
    /// 3. No existing line → guard `quantity`, snapshot the price
    ///    (purchase price for supplier customers, customer price otherwise),
    ///    insert
    /// 4. Existing line → guard the merged `existing + quantity` total,
    ///    bump the quantity; the original price snapshot is kept
    pub async fn add_line_item(
        &self,
        order_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<LineItem> {
        validate_quantity(quantity).map_err(DbError::Core)?;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let is_supplier: bool =
            sqlx::query_scalar("SELECT is_supplier FROM customers WHERE id = ?1")
                .bind(&order.customer_id)
                .fetch_one(&mut *tx)
                .await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, purchase_price_cents, customer_price_cents,
                   created_at, updated_at
            FROM products WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let ledger = fetch_stock_ledger(&mut *tx, product_id).await?;

        let existing = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 AND product_id = ?2"
        ))
        .bind(order_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let now = Utc::now();
        let item = match existing {
            None => {
                check_stock(&product.name, &ledger, quantity).map_err(DbError::Core)?;

                let item = LineItem {
                    id: new_id(),
                    order_id: order_id.to_string(),
                    product_id: product_id.to_string(),
                    price_cents: product.price_for(is_supplier).cents(),
                    quantity,
                    created_at: now,
                    updated_at: now,
                };

                sqlx::query(
                    r#"
                    INSERT INTO order_items (
                        id, order_id, product_id, price_cents, quantity,
                        created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                )
                .bind(&item.id)
                .bind(&item.order_id)
                .bind(&item.product_id)
                .bind(item.price_cents)
                .bind(item.quantity)
                .bind(item.created_at)
                .bind(item.updated_at)
                .execute(&mut *tx)
                .await?;

                debug!(
                    order_id = %order_id,
                    product = %product.name,
                    quantity,
                    "Added line item"
                );

                item
            }
            Some(mut existing) => {
                let merged = existing.quantity + quantity;
                check_stock(&product.name, &ledger, merged).map_err(DbError::Core)?;

                sqlx::query(
                    "UPDATE order_items SET quantity = ?2, updated_at = ?3 WHERE id = ?1",
                )
                .bind(&existing.id)
                .bind(merged)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                debug!(
                    order_id = %order_id,
                    product = %product.name,
                    merged,
                    "Merged line item quantity"
                );

                existing.quantity = merged;
                existing.updated_at = now;
                existing
            }
        };

        tx.commit().await?;
        Ok(item)
    }

    /// Replaces a line item's quantity.
    ///
    /// The new quantity is guarded against the current derived stock level
    /// and must not drop below the total already returned on the line (net
    /// quantity never goes negative). The price snapshot is never touched.
    pub async fn update_line_item_quantity(
        &self,
        item_id: &str,
        new_quantity: i64,
    ) -> DbResult<LineItem> {
        validate_quantity(new_quantity).map_err(DbError::Core)?;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;

        let mut item = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE id = ?1"
        ))
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("LineItem", item_id))?;

        let returned: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM item_returns WHERE item_id = ?1",
        )
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;
        validate_quantity_covers_returns(new_quantity, returned).map_err(DbError::Core)?;

        let product_name: String = sqlx::query_scalar("SELECT name FROM products WHERE id = ?1")
            .bind(&item.product_id)
            .fetch_one(&mut *tx)
            .await?;

        let ledger = fetch_stock_ledger(&mut *tx, &item.product_id).await?;
        check_stock(&product_name, &ledger, new_quantity).map_err(DbError::Core)?;

        let now = Utc::now();
        sqlx::query("UPDATE order_items SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(item_id)
            .bind(new_quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        item.quantity = new_quantity;
        item.updated_at = now;
        Ok(item)
    }

    /// Lists an order's line items, newest first.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // =========================================================================
    // Returns
    // =========================================================================

    /// Records a return against a line item.
    ///
    /// Capped at the line's current net quantity (sold minus already
    /// returned); the line's stored quantity is never rewritten, so the
    /// returned stock flows straight back into the derived level.
    pub async fn create_return(
        &self,
        item_id: &str,
        quantity: i64,
        reason: Option<&str>,
    ) -> DbResult<ItemReturn> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;

        let item = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE id = ?1"
        ))
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("LineItem", item_id))?;

        let returned: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM item_returns WHERE item_id = ?1",
        )
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        let net = settlement::net_quantity(item.quantity, returned);
        validate_return_quantity(quantity, net).map_err(DbError::Core)?;

        let now = Utc::now();
        let item_return = ItemReturn {
            id: new_id(),
            item_id: item_id.to_string(),
            quantity,
            reason: reason.map(str::to_string),
            return_date: now,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO item_returns (
                id, item_id, quantity, reason, return_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item_return.id)
        .bind(&item_return.item_id)
        .bind(item_return.quantity)
        .bind(&item_return.reason)
        .bind(item_return.return_date)
        .bind(item_return.created_at)
        .bind(item_return.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(item_id = %item_id, quantity, "Recorded return");
        Ok(item_return)
    }

    /// Lists returns recorded against a line item, newest first.
    pub async fn get_returns(&self, item_id: &str) -> DbResult<Vec<ItemReturn>> {
        let returns = sqlx::query_as::<_, ItemReturn>(&format!(
            "SELECT {RETURN_COLUMNS} FROM item_returns WHERE item_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }

    // =========================================================================
    // Payments & Settlement
    // =========================================================================

    /// Records a payment and re-derives the order status.
    ///
    /// ## Behavior (inside one IMMEDIATE transaction)
    /// 1. Insert the payment (append-only, default status `pending`)
    /// 2. Recompute total_amount (Σ net_quantity × price) and total_paid
    ///    (Σ all payments, the new one included)
    /// 3. Derive and persist the new order status
    ///
    /// Returns the payment together with the status the order landed on.
    pub async fn record_payment(
        &self,
        order_id: &str,
        amount_cents: i64,
        method: PaymentMethod,
    ) -> DbResult<(Payment, OrderStatus)> {
        validate_payment_amount(amount_cents).map_err(DbError::Core)?;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let now = Utc::now();
        let payment = Payment {
            id: new_id(),
            order_id: order_id.to_string(),
            amount_cents,
            method,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, amount_cents, method, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await?;

        let total_amount = Self::fetch_total_amount(&mut tx, order_id).await?;
        let total_paid = Self::fetch_total_paid(&mut tx, order_id).await?;

        let new_status = settlement::derive_status(order.status, total_paid, total_amount);

        if new_status != order.status {
            sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(order_id)
                .bind(new_status)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(
            order_id = %order_id,
            amount_cents,
            status = ?new_status,
            "Recorded payment"
        );

        Ok((payment, new_status))
    }

    /// Lists an order's payments, oldest first.
    pub async fn get_payments(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1 ORDER BY created_at"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Settlement snapshot of one order.
    ///
    /// The status, totals, and remaining balance are read within a single
    /// transaction so the numbers are mutually consistent.
    pub async fn order_summary(&self, order_id: &str) -> DbResult<OrderSummary> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let total_amount = Self::fetch_total_amount(&mut tx, order_id).await?;
        let total_paid = Self::fetch_total_paid(&mut tx, order_id).await?;

        tx.commit().await?;

        Ok(OrderSummary::new(
            order.id,
            order.status,
            total_amount,
            total_paid,
        ))
    }

    /// Σ net_quantity × captured price over the order's line items.
    async fn fetch_total_amount(
        tx: &mut Transaction<'_, Sqlite>,
        order_id: &str,
    ) -> DbResult<stockbook_core::Money> {
        let items = sqlx::query_as::<_, ItemSettlement>(
            r#"
            SELECT i.price_cents, i.quantity, COALESCE(r.total, 0) AS returned
            FROM order_items i
            LEFT JOIN (SELECT item_id, SUM(quantity) AS total
                       FROM item_returns GROUP BY item_id) r
                   ON r.item_id = i.id
            WHERE i.order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(settlement::total_amount(&items))
    }

    /// Σ amounts over the order's payment ledger, regardless of status.
    async fn fetch_total_paid(
        tx: &mut Transaction<'_, Sqlite>,
        order_id: &str,
    ) -> DbResult<stockbook_core::Money> {
        let amounts: Vec<i64> =
            sqlx::query_scalar("SELECT amount_cents FROM payments WHERE order_id = ?1")
                .bind(order_id)
                .fetch_all(&mut **tx)
                .await?;

        Ok(settlement::total_paid(&amounts))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
