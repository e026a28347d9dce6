//! Customer account queries.

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use trattoria_core::{Customer, CustomerId, Money};

use super::RepositoryError;
use super::products::escape_like;

const CUSTOMER_COLUMNS: &str =
    "c.id, c.email, c.name, c.phone, c.address, c.disabled, c.created_at, c.updated_at";

/// A customer with lifetime order figures. Canceled orders do not count
/// toward spend.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerSummary {
    #[sqlx(flatten)]
    pub customer: Customer,
    pub order_count: i64,
    pub total_spent: Money,
}

/// Repository for storefront customers as seen from the back office.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Customers with their order stats, newest accounts first.
    ///
    /// `query` matches name, email, or phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_with_stats(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<CustomerSummary>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {CUSTOMER_COLUMNS}, \
                 COUNT(o.id) AS order_count, \
                 COALESCE(SUM(o.total) FILTER (WHERE o.status <> 'canceled'), 0) AS total_spent \
             FROM restaurant.customer c \
             LEFT JOIN restaurant.\"order\" o ON o.customer_id = c.id \
             WHERE TRUE"
        ));
        if let Some(term) = query.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(term));
            builder
                .push(" AND (c.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.phone ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" GROUP BY c.id ORDER BY c.created_at DESC");

        let customers = builder
            .build_query_as::<CustomerSummary>()
            .fetch_all(self.pool)
            .await?;
        Ok(customers)
    }

    /// One customer with their order stats.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: CustomerId) -> Result<Option<CustomerSummary>, RepositoryError> {
        let customer = sqlx::query_as::<_, CustomerSummary>(&format!(
            "SELECT {CUSTOMER_COLUMNS}, \
                 COUNT(o.id) AS order_count, \
                 COALESCE(SUM(o.total) FILTER (WHERE o.status <> 'canceled'), 0) AS total_spent \
             FROM restaurant.customer c \
             LEFT JOIN restaurant.\"order\" o ON o.customer_id = c.id \
             WHERE c.id = $1 \
             GROUP BY c.id"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(customer)
    }

    /// Flip the disabled flag. Disabled customers cannot sign in to the
    /// storefront; their orders are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    #[instrument(skip(self))]
    pub async fn toggle_disabled(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            "UPDATE restaurant.customer AS c \
             SET disabled = NOT c.disabled, updated_at = NOW() \
             WHERE c.id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Number of customer accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM restaurant.customer")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
