//! Order queue queries.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use trattoria_core::db::{ORDER_COLUMNS, OrderStore};
use trattoria_core::{
    CustomerId, Money, Order, OrderId, OrderItem, OrderStatus, OrderType, StatusChange,
};

use super::RepositoryError;
use super::products::escape_like;

/// Most orders shown on one list page.
pub const ORDER_LIST_LIMIT: i64 = 200;

/// Filters for the order queue.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    /// Matches customer name, email or phone, or an exact order number.
    pub query: Option<String>,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderStats {
    /// Orders placed since `since`, canceled ones excluded.
    pub orders_today: i64,
    /// Revenue of those orders.
    pub revenue_today: Money,
    /// Orders not yet delivered, completed, or canceled.
    pub open_orders: i64,
    pub pending_orders: i64,
}

/// Repository for the admin order queue.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM restaurant.\"order\" WHERE TRUE"
        ));
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(order_type) = filter.order_type {
            query.push(" AND order_type = ").push_bind(order_type);
        }
        if let Some(term) = filter.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(term));
            query
                .push(" AND (customer_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR customer_email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR customer_phone ILIKE ")
                .push_bind(pattern);
            if let Ok(number) = term.trim_start_matches('#').parse::<i32>() {
                query.push(" OR id = ").push_bind(number);
            }
            query.push(")");
        }
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(ORDER_LIST_LIMIT);

        let orders = query.build_query_as::<Order>().fetch_all(self.pool).await?;
        Ok(orders)
    }

    /// The most recent orders, for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM restaurant.\"order\" ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Get an order header by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(OrderStore::new(self.pool).get(id).await?)
    }

    /// Items of an order in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        Ok(OrderStore::new(self.pool).items(order_id).await?)
    }

    /// Status history of an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn history(&self, order_id: OrderId) -> Result<Vec<StatusChange>, RepositoryError> {
        Ok(OrderStore::new(self.pool).history(order_id).await?)
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        Ok(OrderStore::new(self.pool)
            .list_for_customer(customer_id)
            .await?)
    }

    /// Move an order from `from` to `to` if it is still in `from`, recording
    /// the change in the history.
    ///
    /// Returns `None` when the order's status no longer matches `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self))]
    pub async fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        changed_by: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(OrderStore::new(self.pool)
            .compare_and_set_status(id, from, to, changed_by)
            .await?)
    }

    /// Delete an order with its items and history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM restaurant.\"order\" WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Dashboard counts, with "today" starting at `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn stats(&self, since: DateTime<Utc>) -> Result<OrderStats, RepositoryError> {
        let stats = sqlx::query_as::<_, OrderStats>(
            "SELECT \
                 COUNT(*) FILTER (WHERE created_at >= $1 AND status <> 'canceled') \
                     AS orders_today, \
                 COALESCE(SUM(total) FILTER (WHERE created_at >= $1 AND status <> 'canceled'), 0) \
                     AS revenue_today, \
                 COUNT(*) FILTER (WHERE status NOT IN ('delivered', 'completed', 'canceled')) \
                     AS open_orders, \
                 COUNT(*) FILTER (WHERE status = 'pending') AS pending_orders \
             FROM restaurant.\"order\"",
        )
        .bind(since)
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }
}
