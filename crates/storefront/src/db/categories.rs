//! Category queries for the public menu.

use sqlx::PgPool;
use tracing::instrument;

use trattoria_core::Category;

use super::RepositoryError;

const CATEGORY_COLUMNS: &str =
    "id, name, description, active, sort_order, created_at, updated_at";

/// Read-only access to menu categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active categories in menu order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM restaurant.category \
             WHERE active ORDER BY sort_order, name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }
}
