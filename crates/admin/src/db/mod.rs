//! Database access for the admin panel.
//!
//! # Tables (shared `PostgreSQL` database)
//!
//! - `restaurant.category`, `restaurant.product` - the menu, managed here
//! - `restaurant.customer` - storefront accounts, viewed and disabled here
//! - `restaurant.order`, `restaurant.order_item`,
//!   `restaurant.order_status_history` - moved through the lifecycle here
//! - `admin.admin_user` - back-office accounts
//! - `admin.session` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations live in `migrations/` at the workspace root and run via:
//! ```bash
//! cargo run -p trattoria-cli -- migrate
//! ```

pub mod admin_users;
pub mod categories;
pub mod customers;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::{AdminUserRepository, NewAdminUser};
pub use categories::{CategoryRepository, CategoryWithCount};
pub use customers::{CustomerRepository, CustomerSummary};
pub use orders::{OrderFilter, OrderRepository, OrderStats};
pub use products::{ProductFilter, ProductListing, ProductRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),


    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
