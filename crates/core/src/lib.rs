//! Trattoria Core - shared types and business rules.
//!
//! This crate is used by every Trattoria component:
//! - `storefront` - Public ordering site (menu, cart, checkout, tracking)
//! - `admin` - Back-office for menu and order management
//! - `cli` - Migrations, admin bootstrap, and menu seeding
//!
//! # Architecture
//!
//! Without features the core crate performs no I/O. The `postgres` feature
//! adds sqlx support for the newtypes and the shared order queries in
//! [`db`].
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, money, and status enums
//! - [`pricing`] - Subtotal, tax, and fee calculation
//! - [`lifecycle`] - Legal order status transitions
//! - [`models`] - Menu, customer, and order records
//! - `db` - Order reads and status changes (`postgres` feature)

#![cfg_attr(not(test), forbid(unsafe_code))]

#[cfg(feature = "postgres")]
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod pricing;
pub mod types;

pub use lifecycle::{TransitionError, happy_path};
pub use models::{Category, Customer, Order, OrderItem, Product, StatusChange};
pub use pricing::{MAX_LINE_QUANTITY, OrderTotals, PricedLine, PricingError, PricingRules};
pub use types::*;
