//! Order tracking and customer cancellation.

use sqlx::PgPool;
use tracing::instrument;

use trattoria_core::{Order, OrderId, OrderItem, OrderStatus, StatusChange, TransitionError};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::CurrentCustomer;

/// Recorded as `changed_by` when a customer cancels.
const CUSTOMER_ACTOR: &str = "customer";

/// Errors from order tracking.
#[derive(thiserror::Error, Debug)]
pub enum OrderError {
    #[error("order not found")]
    NotFound,
    #[error(transparent)]
    Transition(#[from] TransitionError),
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

/// Whether the requester may see `order`.
///
/// Signed-in owners can always see their orders. Anyone can see an order
/// whose ID was placed from their session.
#[must_use]
pub fn can_view(order: &Order, customer: Option<&CurrentCustomer>, guest_orders: &[OrderId]) -> bool {
    let owns = match (order.customer_id, customer) {
        (Some(owner), Some(current)) => owner == current.id,
        _ => false,
    };
    owns || guest_orders.contains(&order.id)
}

/// Order reads scoped to the current requester.
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

    /// Load an order visible to the requester.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` when the order does not exist or the
    /// requester may not see it.
    #[instrument(skip(self, customer, guest_orders))]
    pub async fn visible_order(
        &self,
        id: OrderId,
        customer: Option<&CurrentCustomer>,
        guest_orders: &[OrderId],
    ) -> Result<Order, OrderError> {
        let order = self.orders.get(id).await?.ok_or(OrderError::NotFound)?;
        if can_view(&order, customer, guest_orders) {
            Ok(order)
        } else {
            Err(OrderError::NotFound)
        }
    }

    /// Load an order with items and history.
    ///
    /// # Errors
    ///
    /// See [`Self::visible_order`].
    pub async fn detail(
        &self,
        id: OrderId,
        customer: Option<&CurrentCustomer>,
        guest_orders: &[OrderId],
    ) -> Result<OrderDetail, OrderError> {
        let order = self.visible_order(id, customer, guest_orders).await?;
        let items = self.orders.items(id).await?;
        let history = self.orders.history(id).await?;
        Ok(OrderDetail {
            order,
            items,
            history,
        })
    }

    /// The signed-in customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn history_for(&self, customer: &CurrentCustomer) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_customer(customer.id).await?)
    }

    /// Cancel a pending order on the customer's behalf.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Transition` if the order has moved past
    /// `pending`, including when the kitchen confirms it concurrently.
    #[instrument(skip(self, customer, guest_orders))]
    pub async fn cancel(
        &self,
        id: OrderId,
        customer: Option<&CurrentCustomer>,
        guest_orders: &[OrderId],
    ) -> Result<Order, OrderError> {
        let order = self.visible_order(id, customer, guest_orders).await?;
        check_customer_cancel(order.status)?;

        let updated = self
            .orders
            .compare_and_set_status(id, OrderStatus::Pending, OrderStatus::Canceled, CUSTOMER_ACTOR)
            .await?;

        match updated {
            Some(order) => {
                tracing::info!(order_id = %id, "Order canceled by customer");
                Ok(order)
            }
            None => {
                let current = self.orders.get(id).await?.ok_or(OrderError::NotFound)?;
                check_customer_cancel(current.status)?;
                Err(OrderError::Transition(TransitionError::NotAllowed {
                    from: current.status,
                    to: OrderStatus::Canceled,
                }))
            }
        }
    }
}

fn check_customer_cancel(status: OrderStatus) -> Result<(), TransitionError> {
    if status.customer_can_cancel() {
        Ok(())
    } else if status.is_terminal() {
        Err(TransitionError::Terminal(status))
    } else {
        Err(TransitionError::NotAllowed {
            from: status,
            to: OrderStatus::Canceled,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use trattoria_core::{CustomerId, Email, Money, OrderType, PaymentMethod};

    use super::*;

    fn order(id: i32, customer_id: Option<i32>) -> Order {
        Order {
            id: OrderId::new(id),
            customer_id: customer_id.map(CustomerId::new),
            customer_name: "Guest".to_string(),
            customer_email: Email::parse("guest@example.com").unwrap(),
            customer_phone: "555".to_string(),
            delivery_address: None,
            table_number: None,
            notes: None,
            order_type: OrderType::Pickup,
            payment_method: PaymentMethod::Cash,
            status: OrderStatus::Pending,
            subtotal: Money::ZERO,
            tax: Money::ZERO,
            delivery_fee: Money::ZERO,
            service_fee: Money::ZERO,
            total: Money::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn customer(id: i32) -> CurrentCustomer {
        CurrentCustomer {
            id: CustomerId::new(id),
            email: Email::parse("c@example.com").unwrap(),
            name: "C".to_string(),
        }
    }

    #[test]
    fn test_owner_can_view() {
        assert!(can_view(&order(1, Some(7)), Some(&customer(7)), &[]));
        assert!(!can_view(&order(1, Some(7)), Some(&customer(8)), &[]));
    }

    #[test]
    fn test_guest_session_can_view_its_orders() {
        assert!(can_view(&order(3, None), None, &[OrderId::new(3)]));
        assert!(!can_view(&order(3, None), None, &[OrderId::new(4)]));
        assert!(!can_view(&order(3, None), Some(&customer(1)), &[]));
    }

    #[test]
    fn test_customer_cancel_rules() {
        assert!(check_customer_cancel(OrderStatus::Pending).is_ok());
        assert_eq!(
            check_customer_cancel(OrderStatus::Preparing),
            Err(TransitionError::NotAllowed {
                from: OrderStatus::Preparing,
                to: OrderStatus::Canceled
            })
        );
        assert_eq!(
            check_customer_cancel(OrderStatus::Canceled),
            Err(TransitionError::Terminal(OrderStatus::Canceled))
        );
    }
}
