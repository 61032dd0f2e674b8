//! # stockbook-core: Pure Business Logic for Stockbook
//!
//! This crate is the **heart** of Stockbook, an inventory and order-management
//! backend. It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stockbook Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              REST API layer (separate application)              │   │
//! │  │    products ──► orders ──► line items ──► payments ──► returns  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockbook-db (Database Layer)                    │   │
//! │  │     SQLite repositories, serialized write transactions          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ stockbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │ settlement │  │ validation│  │   │
//! │  │   │  Product  │  │  Ledger   │  │   totals   │  │stock guard│  │   │
//! │  │   │   Order   │  │ available │  │   status   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, LineItem, Payment, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Derived stock level from the four ledgers
//! - [`settlement`] - Order totals, net quantities, payment status machine
//! - [`validation`] - Stock guard and input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Derived Stock**: Stock level is never stored, always recomputed from ledgers
//! 5. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbook_core::stock::StockLedger;
//! use stockbook_core::validation::check_stock;
//!
//! let ledger = StockLedger {
//!     purchased: 40,
//!     produced: 10,
//!     sold: 30,
//!     returned: 5,
//! };
//! assert_eq!(ledger.available(), 25);
//!
//! // The stock guard rejects anything beyond the derived level
//! assert!(check_stock("wheat flour", &ledger, 25).is_ok());
//! assert!(check_stock("wheat flour", &ledger, 26).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod settlement;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockbook_core::Money` instead of
// `use stockbook_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use settlement::OrderSummary;
pub use stock::StockLedger;
pub use types::*;
