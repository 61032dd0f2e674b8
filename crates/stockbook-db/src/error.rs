//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)            CoreError (stockbook-core)      │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  DbError (this module) ← categorized ← DbError::Core (transparent)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  REST layer maps each kind to a response; the core never sees HTTP     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rejections (`OutOfStock`, `InvalidQuantity`, ...) pass through
//! as `DbError::Core` so callers can match on the typed kind. Storage
//! failures not covered by a typed variant propagate as fatal errors - no
//! silent recovery is attempted.

use stockbook_core::CoreError;
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Business rule rejection from stockbook-core (out of stock,
    /// invalid quantity, invalid payment amount).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Referential-integrity guard tripped: the row still has dependents.
    ///
    /// ## When This Occurs
    /// - Deleting a product that has purchases or productions
    /// - Deleting a customer that has orders
    /// - Deleting an order that has line items
    #[error("cannot delete {entity} {id}: {dependents} still reference it")]
    DeletionBlocked {
        entity: String,
        id: String,
        dependents: String,
    },

    /// The serialized write lock could not be acquired within the busy
    /// timeout. The caller may retry the whole operation.
    #[error("concurrent write conflict: database is locked")]
    ConcurrencyConflict,

    /// Unique constraint violation.
    #[error("duplicate {field}: value already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a DeletionBlocked error.
    pub fn deletion_blocked(
        entity: impl Into<String>,
        id: impl Into<String>,
        dependents: impl Into<String>,
    ) -> Self {
        DbError::DeletionBlocked {
            entity: entity.into(),
            id: id.into(),
            dependents: dependents.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound       → DbError::NotFound
/// sqlx::Error::Database (busy)   → DbError::ConcurrencyConflict
/// sqlx::Error::Database (unique) → DbError::UniqueViolation
/// sqlx::Error::Database (fk)     → DbError::ForeignKeyViolation
/// sqlx::Error::PoolTimedOut      → DbError::PoolExhausted
/// Other                          → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // Lock contention: "database is locked" (SQLITE_BUSY)
                if msg.contains("database is locked") || msg.contains("database table is locked") {
                    DbError::ConcurrencyConflict
                } else if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_passes_through_transparently() {
        let core = CoreError::OutOfStock {
            available: 2,
            product: "bran".to_string(),
        };
        let db: DbError = core.into();
        assert_eq!(db.to_string(), "2 bran left in stock");
    }

    #[test]
    fn test_deletion_blocked_message() {
        let err = DbError::deletion_blocked("Product", "p1", "2 purchases");
        assert_eq!(
            err.to_string(),
            "cannot delete Product p1: 2 purchases still reference it"
        );
    }
}
