//! Product queries for the public menu.
//!
//! Products in inactive categories are never returned.

use sqlx::PgPool;
use tracing::instrument;

use trattoria_core::{Product, ProductId};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.name, p.description, p.price, \
     p.image_url, p.featured, p.in_stock, p.created_at, p.updated_at";

/// Read-only access to visible menu products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product in an active category, ordered for the menu page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_visible(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM restaurant.product p \
             JOIN restaurant.category c ON c.id = p.category_id \
             WHERE c.active \
             ORDER BY c.sort_order, c.name, p.name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Featured, in-stock products for the home and offers pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_featured(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM restaurant.product p \
             JOIN restaurant.category c ON c.id = p.category_id \
             WHERE c.active AND p.featured AND p.in_stock \
             ORDER BY p.updated_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Get a visible product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_visible(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM restaurant.product p \
             JOIN restaurant.category c ON c.id = p.category_id \
             WHERE p.id = $1 AND c.active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Fetch the visible products among `ids`. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM restaurant.product p \
             JOIN restaurant.category c ON c.id = p.category_id \
             WHERE p.id = ANY($1) AND c.active"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}
