//! Order queue operations for staff.

use sqlx::PgPool;
use tracing::instrument;

use trattoria_core::{Order, OrderId, OrderItem, OrderStatus, StatusChange, TransitionError};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::CurrentAdmin;

/// Errors from order management.
#[derive(thiserror::Error, Debug)]
pub enum OrderError {
    #[error("order not found")]
    NotFound,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// Someone else changed the order between load and update.
    #[error("order was updated by someone else; reload and try again")]
    Conflict,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// An order with its items and status history.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<StatusChange>,
}

/// Moves orders through their lifecycle on behalf of staff.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Load an order with items and history.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: OrderId) -> Result<OrderDetail, OrderError> {
        let order = self.orders.get(id).await?.ok_or(OrderError::NotFound)?;
        let items = self.orders.items(id).await?;
        let history = self.orders.history(id).await?;
        Ok(OrderDetail {
            order,
            items,
            history,
        })
    }

    /// Move an order to `to`, recording `admin` in the history.
    ///
    /// The update only applies if the order is still in the status that was
    /// validated, so two staff members cannot both advance it.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Transition` if the lifecycle forbids the move
    /// and `OrderError::Conflict` if the order changed underneath us.
    #[instrument(skip(self, admin), fields(admin = %admin.email))]
    pub async fn update_status(
        &self,
        id: OrderId,
        to: OrderStatus,
        admin: &CurrentAdmin,
    ) -> Result<Order, OrderError> {
        let order = self.orders.get(id).await?.ok_or(OrderError::NotFound)?;
        let from = order.status;
        from.transition(to, order.order_type)?;

        if let Some(updated) = self
            .orders
            .compare_and_set_status(id, from, to, admin.email.as_str())
            .await?
        {
            tracing::info!(order_id = %id, %from, %to, "Order status changed");
            return Ok(updated);
        }

        // Lost the race: report against the status that won.
        let current = self.orders.get(id).await?.ok_or(OrderError::NotFound)?;
        current.status.transition(to, current.order_type)?;
        Err(OrderError::Conflict)
    }

    /// Delete an order outright.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    #[instrument(skip(self, admin), fields(admin = %admin.email))]
    pub async fn delete(&self, id: OrderId, admin: &CurrentAdmin) -> Result<(), OrderError> {
        self.orders.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::NotFound,
            other => other.into(),
        })?;
        tracing::warn!(order_id = %id, "Order deleted");
        Ok(())
    }
}
