//! # stockbook-db: Database Layer for Stockbook
//!
//! This crate provides database access for the Stockbook inventory and
//! order-management core. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Data Flow                              │
//! │                                                                         │
//! │  REST handler (add_line_item, record_payment, ...)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ product.rs    │    │  (embedded)  │  │   │
//! │  │   │               │    │ customer.rs   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ order.rs      │    │ 001_init.sql │  │   │
//! │  │   │ WAL + busy    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │        stock guard + settlement run INSIDE the write           │   │
//! │  │        transaction, using stockbook-core's pure functions      │   │
//! │  └────────────────────────────────┼───────────────────────────────┘   │
//! │                                   ▼                                    │
//! │                          SQLite Database                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Discipline
//!
//! Every operation that reads an aggregate (stock level, existing line item,
//! total paid) and then writes based on that read runs inside a
//! `BEGIN IMMEDIATE` transaction. IMMEDIATE takes the database write lock
//! *before* the first read, so two concurrent `add_line_item` calls for the
//! same product serialize: the second waits (up to the busy timeout), then
//! sees the first one's committed quantities and fails cleanly with
//! `OutOfStock` instead of overselling or inserting a duplicate row.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, customer, order)

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
