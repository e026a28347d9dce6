//! Product management queries.

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use trattoria_core::{CategoryId, Money, Product, ProductId};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.name, p.description, p.price, \
     p.image_url, p.featured, p.in_stock, p.created_at, p.updated_at";

/// Validated fields for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub featured: bool,
    pub in_stock: bool,
}

/// Filters for the product list.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    /// Case-insensitive match on name or description.
    pub query: Option<String>,
}

/// A product row with its category name for the list page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductListing {
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: String,
}

/// Repository for menu products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products matching `filter`, grouped by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<ProductListing>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS}, c.name AS category_name \
             FROM restaurant.product p \
             JOIN restaurant.category c ON c.id = p.category_id \
             WHERE TRUE"
        ));
        if let Some(category) = filter.category {
            query.push(" AND p.category_id = ").push_bind(category);
        }
        if let Some(term) = filter.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(term));
            query
                .push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY c.sort_order, c.name, p.name");

        let rows = query
            .build_query_as::<ProductListing>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a product by ID, whatever its category's visibility.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM restaurant.product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO restaurant.product AS p \
             (category_id, name, description, price, image_url, featured, in_stock) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.image_url.as_deref())
        .bind(input.featured)
        .bind(input.in_stock)
        .fetch_one(self.pool)
        .await?;
        Ok(product)
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE restaurant.product AS p \
             SET category_id = $2, name = $3, description = $4, price = $5, \
                 image_url = $6, featured = $7, in_stock = $8, updated_at = NOW() \
             WHERE p.id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.image_url.as_deref())
        .bind(input.featured)
        .bind(input.in_stock)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Flip the featured flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn toggle_featured(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.toggle(id, "featured").await
    }

    /// Flip the in-stock flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn toggle_stock(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.toggle(id, "in_stock").await
    }

    async fn toggle(&self, id: ProductId, column: &'static str) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE restaurant.product AS p \
             SET {column} = NOT p.{column}, updated_at = NOW() \
             WHERE p.id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product and return it, so its stored image can be removed.
    ///
    /// Order items keep their snapshot; their product reference becomes null.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "DELETE FROM restaurant.product AS p WHERE p.id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Total and in-stock product counts for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn counts(&self) -> Result<(i64, i64), RepositoryError> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE in_stock) FROM restaurant.product",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }
}

/// Escape `LIKE` wildcards so a search term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("pizza"), "pizza");
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
    }
}
