//! Order placement and tracking queries.

use sqlx::PgPool;
use tracing::instrument;

use trattoria_core::db::{ORDER_COLUMNS, OrderStore};
use trattoria_core::{
    CustomerId, Email, Money, Order, OrderId, OrderItem, OrderStatus, OrderTotals, OrderType,
    PaymentMethod, ProductId, StatusChange,
};

use super::RepositoryError;

/// An order header ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: String,
    pub delivery_address: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub totals: OrderTotals,
}

/// A priced line snapshot ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i32,
    pub line_total: Money,
}

/// Repository for placing and reading orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order, its items, and the initial `pending` history entry
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    #[instrument(skip(self, order, items), fields(order_type = %order.order_type, items = items.len()))]
    pub async fn create(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO restaurant.\"order\" (customer_id, customer_name, customer_email, \
             customer_phone, delivery_address, table_number, notes, order_type, payment_method, \
             subtotal, tax, delivery_fee, service_fee, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.customer_id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(order.delivery_address.as_deref())
        .bind(order.table_number.as_deref())
        .bind(order.notes.as_deref())
        .bind(order.order_type)
        .bind(order.payment_method)
        .bind(order.totals.subtotal)
        .bind(order.totals.tax)
        .bind(order.totals.delivery_fee)
        .bind(order.totals.service_fee)
        .bind(order.totals.total)
        .fetch_one(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO restaurant.order_item \
                 (order_id, product_id, product_name, unit_price, quantity, line_total) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(created.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO restaurant.order_status_history (order_id, status, changed_by) \
             VALUES ($1, $2, NULL)",
        )
        .bind(created.id)
        .bind(OrderStatus::Pending)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
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
}
