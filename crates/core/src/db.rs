//! Order queries shared by the storefront and admin.
//!
//! Both servers read orders and move them through the lifecycle against the
//! same tables, so the SQL lives here once. Errors are plain [`sqlx::Error`];
//! each server wraps them in its own repository error.

use sqlx::PgPool;

use crate::models::{Order, OrderItem, StatusChange};
use crate::types::{CustomerId, OrderId, OrderStatus};

/// Columns selected into an [`Order`].
pub const ORDER_COLUMNS: &str = "id, customer_id, customer_name, customer_email, \
     customer_phone, delivery_address, table_number, notes, order_type, payment_method, \
     status, subtotal, tax, delivery_fee, service_fee, total, created_at, updated_at";

/// Reads and status changes on `restaurant."order"`.
#[derive(Debug, Clone, Copy)]
pub struct OrderStore<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order header by ID.
    ///
    /// # Errors
    ///
    /// Returns the query error.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM restaurant.\"order\" WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
    }

    /// Items of an order in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the query error.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, product_name, unit_price, quantity, line_total \
             FROM restaurant.order_item WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await
    }

    /// Status history of an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the query error.
    pub async fn history(&self, order_id: OrderId) -> Result<Vec<StatusChange>, sqlx::Error> {
        sqlx::query_as::<_, StatusChange>(
            "SELECT status, changed_by, created_at FROM restaurant.order_status_history \
             WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns the query error.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM restaurant.\"order\" \
             WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await
    }

    /// Move an order from `from` to `to` only if it is still in `from`, and
    /// record who did it in the history.
    ///
    /// Returns `None` when the order's status no longer matches `from`.
    /// `changed_by` is an admin email or `"customer"`.
    ///
    /// # Errors
    ///
    /// Returns the query error; nothing is written in that case.
    pub async fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        changed_by: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Order>(&format!(
            "UPDATE restaurant.\"order\" SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_some() {
            sqlx::query(
                "INSERT INTO restaurant.order_status_history (order_id, status, changed_by) \
                 VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(to)
            .bind(changed_by)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_columns_match_order_fields() {
        let columns: Vec<&str> = ORDER_COLUMNS.split(',').map(str::trim).collect();
        assert_eq!(columns.len(), 18);
        assert_eq!(columns.first(), Some(&"id"));
        assert_eq!(columns.last(), Some(&"updated_at"));
        for field in ["status", "order_type", "payment_method", "total"] {
            assert!(columns.contains(&field), "missing {field}");
        }
    }
}
