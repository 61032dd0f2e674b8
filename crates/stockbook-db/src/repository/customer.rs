//! # Customer Repository
//!
//! Customer CRUD. Deleting a customer is rejected while any order still
//! references them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use stockbook_core::validation::{validate_person_name, validate_phone_number};
use stockbook_core::{CoreError, Customer, CustomerInput};

const CUSTOMER_COLUMNS: &str =
    "id, given_name, surname, phone_number, is_supplier, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    fn validate(input: &CustomerInput) -> DbResult<()> {
        validate_person_name("given_name", &input.given_name).map_err(CoreError::from)?;
        validate_person_name("surname", &input.surname).map_err(CoreError::from)?;
        validate_phone_number(&input.phone_number).map_err(CoreError::from)?;
        Ok(())
    }

    /// Creates a customer.
    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        Self::validate(input)?;

        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            given_name: input.given_name.trim().to_string(),
            surname: input.surname.trim().to_string(),
            phone_number: input.phone_number.trim().to_string(),
            is_supplier: input.is_supplier,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, name = %customer.full_name(), "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, given_name, surname, phone_number, is_supplier,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.given_name)
        .bind(&customer.surname)
        .bind(&customer.phone_number)
        .bind(customer.is_supplier)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by their ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists customers ordered by surname.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY surname, given_name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Replaces a customer's details.
    ///
    /// Changing `is_supplier` does NOT re-snapshot prices on existing line
    /// items; it only affects lines created afterwards.
    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        Self::validate(input)?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                given_name = ?2,
                surname = ?3,
                phone_number = ?4,
                is_supplier = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.given_name.trim())
        .bind(input.surname.trim())
        .bind(input.phone_number.trim())
        .bind(input.is_supplier)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer. Rejected while any order references them.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        use sqlx::Connection;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if orders > 0 {
            return Err(DbError::deletion_blocked(
                "Customer",
                id,
                format!("{orders} orders"),
            ));
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        tx.commit().await?;

        debug!(id = %id, "Deleted customer");
        Ok(())
    }

    /// Counts all customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn customer_input(given: &str, surname: &str) -> CustomerInput {
        CustomerInput {
            given_name: given.to_string(),
            surname: surname.to_string(),
            phone_number: "770000000".to_string(),
            is_supplier: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let created = db
            .customers()
            .create(&customer_input("Awa", "Diop"))
            .await
            .unwrap();

        let fetched = db.customers().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.full_name(), "Awa Diop");
        assert!(!fetched.is_supplier);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_phone() {
        let db = test_db().await;
        let mut input = customer_input("Awa", "Diop");
        input.phone_number = "not-a-phone".to_string();
        assert!(db.customers().create(&input).await.is_err());
    }

    #[tokio::test]
    async fn test_list_ordered_by_surname() {
        let db = test_db().await;
        db.customers().create(&customer_input("Awa", "Ndiaye")).await.unwrap();
        db.customers().create(&customer_input("Moussa", "Ba")).await.unwrap();

        let all = db.customers().list(50).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].surname, "Ba");
        assert_eq!(all[1].surname, "Ndiaye");
    }

    #[tokio::test]
    async fn test_update_flips_supplier_flag() {
        let db = test_db().await;
        let created = db
            .customers()
            .create(&customer_input("Awa", "Diop"))
            .await
            .unwrap();

        let mut input = customer_input("Awa", "Diop");
        input.is_supplier = true;
        let updated = db.customers().update(&created.id, &input).await.unwrap();
        assert!(updated.is_supplier);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_orders() {
        let db = test_db().await;
        let customer = db
            .customers()
            .create(&customer_input("Awa", "Diop"))
            .await
            .unwrap();

        db.orders().create_order(&customer.id).await.unwrap();

        let err = db.customers().delete(&customer.id).await.unwrap_err();
        assert!(matches!(err, DbError::DeletionBlocked { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let db = test_db().await;
        let err = db.customers().delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
