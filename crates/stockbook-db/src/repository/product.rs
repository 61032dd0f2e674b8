//! # Product Repository
//!
//! Catalogue CRUD, the purchase/production inflow ledgers, and the derived
//! stock level.
//!
//! ## Derived Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              stock_level(product) - one pass, no N+1                    │
//! │                                                                         │
//! │  Single product:  four COALESCE'd scalar subqueries in ONE statement   │
//! │                                                                         │
//! │  Bulk listing:    list_with_stock() joins four GROUP BY subqueries     │
//! │                   against the whole catalogue in ONE statement -       │
//! │                   callers must never loop stock_level() per row        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The advisory read here can go stale immediately; the *enforced* stock
//! guard runs inside the order repository's write transactions.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{fetch_stock_ledger, new_id};
use stockbook_core::validation::{
    check_stock, validate_inflow_quantity, validate_price_cents, validate_product_name,
};
use stockbook_core::{
    CoreError, Product, ProductInput, ProductWithStock, Production, ProductionInput, Purchase,
    PurchaseInput,
};

const PRODUCT_COLUMNS: &str =
    "id, name, purchase_price_cents, customer_price_cents, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Catalogue CRUD
    // =========================================================================

    /// Creates a product.
    ///
    /// Both prices must be non-negative; the name must be non-empty.
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        validate_product_name(&input.name).map_err(CoreError::from)?;
        validate_price_cents(input.purchase_price_cents).map_err(CoreError::from)?;
        validate_price_cents(input.customer_price_cents).map_err(CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            name: input.name.trim().to_string(),
            purchase_price_cents: input.purchase_price_cents,
            customer_price_cents: input.customer_price_cents,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, purchase_price_cents, customer_price_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.purchase_price_cents)
        .bind(product.customer_price_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products with their derived stock level, ordered by name.
    ///
    /// This is THE way to get stock for many products: one statement with
    /// four grouped ledger subqueries, instead of a stock_level() call per
    /// row.
    pub async fn list_with_stock(&self, limit: u32) -> DbResult<Vec<ProductWithStock>> {
        let products = sqlx::query_as::<_, ProductWithStock>(
            r#"
            SELECT
                p.id,
                p.name,
                p.purchase_price_cents,
                p.customer_price_cents,
                COALESCE(pu.total, 0) + COALESCE(pr.total, 0)
                    - COALESCE(so.total, 0) + COALESCE(re.total, 0)
                    AS quantity_in_stock,
                p.created_at,
                p.updated_at
            FROM products p
            LEFT JOIN (SELECT product_id, SUM(quantity) AS total
                       FROM purchases GROUP BY product_id) pu
                   ON pu.product_id = p.id
            LEFT JOIN (SELECT product_id, SUM(quantity) AS total
                       FROM productions GROUP BY product_id) pr
                   ON pr.product_id = p.id
            LEFT JOIN (SELECT product_id, SUM(quantity) AS total
                       FROM order_items GROUP BY product_id) so
                   ON so.product_id = p.id
            LEFT JOIN (SELECT i.product_id, SUM(r.quantity) AS total
                       FROM item_returns r
                       JOIN order_items i ON r.item_id = i.id
                       GROUP BY i.product_id) re
                   ON re.product_id = p.id
            ORDER BY p.name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Replaces a product's name and prices.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        validate_product_name(&input.name).map_err(CoreError::from)?;
        validate_price_cents(input.purchase_price_cents).map_err(CoreError::from)?;
        validate_price_cents(input.customer_price_cents).map_err(CoreError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                purchase_price_cents = ?3,
                customer_price_cents = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.purchase_price_cents)
        .bind(input.customer_price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// Rejected with `DeletionBlocked` while any purchase, production, or
    /// line item still references it - the inflow ledgers ARE the product's
    /// history and must not be orphaned.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        use sqlx::Connection;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;

        let purchases: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let productions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM productions WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if purchases > 0 || productions > 0 || items > 0 {
            let mut dependents = Vec::new();
            if purchases > 0 {
                dependents.push(format!("{purchases} purchases"));
            }
            if productions > 0 {
                dependents.push(format!("{productions} productions"));
            }
            if items > 0 {
                dependents.push(format!("{items} line items"));
            }
            return Err(DbError::deletion_blocked(
                "Product",
                id,
                dependents.join(", "),
            ));
        }

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        tx.commit().await?;

        debug!(id = %id, "Deleted product");
        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Stock Level
    // =========================================================================

    /// Derived stock level for one product.
    ///
    /// Advisory: the value can go stale as soon as it is returned. The
    /// enforced check happens inside the order repository's write
    /// transactions.
    pub async fn stock_level(&self, id: &str) -> DbResult<i64> {
        // Distinguish "unknown product" from "zero stock"
        if self.get_by_id(id).await?.is_none() {
            return Err(DbError::not_found("Product", id));
        }

        let ledger = fetch_stock_ledger(&self.pool, id).await?;
        Ok(ledger.available())
    }

    /// Advisory stock guard for a prospective quantity.
    ///
    /// Resolves the product, reads the derived ledger, and applies the same
    /// guard the order mutations enforce - including the verbatim
    /// out-of-stock message. Advisory only: the verdict can go stale the
    /// moment it is returned, and the enforced check re-runs inside the
    /// order repository's write transaction.
    pub async fn validate_stock(&self, product_id: &str, quantity: i64) -> DbResult<()> {
        let product = self
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let ledger = fetch_stock_ledger(&self.pool, product_id).await?;
        check_stock(&product.name, &ledger, quantity).map_err(DbError::Core)?;
        Ok(())
    }

    // =========================================================================
    // Stock Inflows
    // =========================================================================

    /// Records a stock purchase. Immutable once created; increases stock.
    pub async fn record_purchase(&self, input: &PurchaseInput) -> DbResult<Purchase> {
        validate_inflow_quantity(input.quantity).map_err(CoreError::from)?;
        validate_price_cents(input.purchase_unit_price_cents).map_err(CoreError::from)?;

        if self.get_by_id(&input.product_id).await?.is_none() {
            return Err(DbError::not_found("Product", &input.product_id));
        }

        let now = Utc::now();
        let purchase = Purchase {
            id: new_id(),
            product_id: input.product_id.clone(),
            purchase_unit_price_cents: input.purchase_unit_price_cents,
            quantity: input.quantity,
            purchase_date: input.purchase_date,
            created_at: now,
            updated_at: now,
        };

        debug!(
            product_id = %purchase.product_id,
            quantity = purchase.quantity,
            "Recording purchase"
        );

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, product_id, purchase_unit_price_cents, quantity,
                purchase_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.product_id)
        .bind(purchase.purchase_unit_price_cents)
        .bind(purchase.quantity)
        .bind(purchase.purchase_date)
        .bind(purchase.created_at)
        .bind(purchase.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(purchase)
    }

    /// Records a production run. Immutable once created; increases stock.
    pub async fn record_production(&self, input: &ProductionInput) -> DbResult<Production> {
        validate_inflow_quantity(input.quantity).map_err(CoreError::from)?;

        if self.get_by_id(&input.product_id).await?.is_none() {
            return Err(DbError::not_found("Product", &input.product_id));
        }

        let now = Utc::now();
        let production = Production {
            id: new_id(),
            product_id: input.product_id.clone(),
            quantity: input.quantity,
            production_date: input.production_date,
            created_at: now,
            updated_at: now,
        };

        debug!(
            product_id = %production.product_id,
            quantity = production.quantity,
            "Recording production"
        );

        sqlx::query(
            r#"
            INSERT INTO productions (
                id, product_id, quantity, production_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&production.id)
        .bind(&production.product_id)
        .bind(production.quantity)
        .bind(production.production_date)
        .bind(production.created_at)
        .bind(production.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(production)
    }

    /// Lists purchases for a product, newest purchase date first.
    pub async fn list_purchases(&self, product_id: &str) -> DbResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, product_id, purchase_unit_price_cents, quantity,
                   purchase_date, created_at, updated_at
            FROM purchases
            WHERE product_id = ?1
            ORDER BY purchase_date DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Lists production runs for a product, newest production date first.
    pub async fn list_productions(&self, product_id: &str) -> DbResult<Vec<Production>> {
        let productions = sqlx::query_as::<_, Production>(
            r#"
            SELECT id, product_id, quantity, production_date, created_at, updated_at
            FROM productions
            WHERE product_id = ?1
            ORDER BY production_date DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(productions)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product_input(name: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            purchase_price_cents: 700,
            customer_price_cents: 1000,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let created = db.products().create(&product_input("wheat flour")).await.unwrap();

        let fetched = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "wheat flour");
        assert_eq!(fetched.purchase_price_cents, 700);
        assert_eq!(fetched.customer_price_cents, 1000);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let db = test_db().await;

        let mut input = product_input("  ");
        assert!(db.products().create(&input).await.is_err());

        input = product_input("bran");
        input.customer_price_cents = -5;
        assert!(db.products().create(&input).await.is_err());
    }

    #[tokio::test]
    async fn test_stock_level_defaults_to_zero() {
        let db = test_db().await;
        let product = db.products().create(&product_input("bran")).await.unwrap();

        assert_eq!(db.products().stock_level(&product.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stock_level_unknown_product_is_not_found() {
        let db = test_db().await;
        let err = db.products().stock_level("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_inflows_increase_stock() {
        let db = test_db().await;
        let product = db.products().create(&product_input("maize meal")).await.unwrap();

        db.products()
            .record_purchase(&PurchaseInput {
                product_id: product.id.clone(),
                purchase_unit_price_cents: 650,
                quantity: 40,
                purchase_date: Utc::now(),
            })
            .await
            .unwrap();

        db.products()
            .record_production(&ProductionInput {
                product_id: product.id.clone(),
                quantity: 10,
                production_date: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(db.products().stock_level(&product.id).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_validate_stock_advisory_guard() {
        let db = test_db().await;
        let product = db.products().create(&product_input("maize meal")).await.unwrap();

        db.products()
            .record_purchase(&PurchaseInput {
                product_id: product.id.clone(),
                purchase_unit_price_cents: 650,
                quantity: 2,
                purchase_date: Utc::now(),
            })
            .await
            .unwrap();

        // Boundary: exactly the available amount passes
        db.products().validate_stock(&product.id, 2).await.unwrap();

        let err = db.products().validate_stock(&product.id, 3).await.unwrap_err();
        assert_eq!(err.to_string(), "2 maize meal left in stock");

        let err = db.products().validate_stock("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_inflow_rejects_negative_quantity() {
        let db = test_db().await;
        let product = db.products().create(&product_input("bran")).await.unwrap();

        let err = db
            .products()
            .record_production(&ProductionInput {
                product_id: product.id.clone(),
                quantity: -1,
                production_date: Utc::now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_list_with_stock_is_batched_and_correct() {
        let db = test_db().await;
        let a = db.products().create(&product_input("aaa flour")).await.unwrap();
        let b = db.products().create(&product_input("zzz bran")).await.unwrap();

        db.products()
            .record_purchase(&PurchaseInput {
                product_id: a.id.clone(),
                purchase_unit_price_cents: 100,
                quantity: 7,
                purchase_date: Utc::now(),
            })
            .await
            .unwrap();

        let listing = db.products().list_with_stock(50).await.unwrap();
        assert_eq!(listing.len(), 2);
        // Ordered by name
        assert_eq!(listing[0].id, a.id);
        assert_eq!(listing[0].quantity_in_stock, 7);
        assert_eq!(listing[1].id, b.id);
        assert_eq!(listing[1].quantity_in_stock, 0);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_purchase_rows() {
        let db = test_db().await;
        let product = db.products().create(&product_input("bran")).await.unwrap();

        db.products()
            .record_purchase(&PurchaseInput {
                product_id: product.id.clone(),
                purchase_unit_price_cents: 100,
                quantity: 1,
                purchase_date: Utc::now(),
            })
            .await
            .unwrap();

        let err = db.products().delete(&product.id).await.unwrap_err();
        assert!(matches!(err, DbError::DeletionBlocked { .. }));
    }

    #[tokio::test]
    async fn test_delete_succeeds_without_dependents() {
        let db = test_db().await;
        let product = db.products().create(&product_input("bran")).await.unwrap();

        db.products().delete(&product.id).await.unwrap();
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let db = test_db().await;
        let product = db.products().create(&product_input("bran")).await.unwrap();

        let updated = db
            .products()
            .update(
                &product.id,
                &ProductInput {
                    name: "fine bran".to_string(),
                    purchase_price_cents: 800,
                    customer_price_cents: 1200,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "fine bran");
        assert_eq!(updated.purchase_price_cents, 800);
    }
}
