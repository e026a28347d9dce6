//! Order status lifecycle.
//!
//! Orders move forward along a happy path that depends on the order type:
//!
//! ```text
//! delivery:        pending → confirmed → preparing → ready → out_for_delivery → delivered
//! pickup/dine-in:  pending → confirmed → preparing → ready → completed
//! ```
//!
//! Any non-terminal order may be canceled by staff. Customers may cancel
//! only while the kitchen has not yet confirmed the order.

use crate::types::{OrderStatus, OrderType};

/// A status change that the lifecycle does not allow.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("order is already {0}")]
    Unchanged(OrderStatus),
    #[error("order is {0} and can no longer change")]
    Terminal(OrderStatus),
    #[error("cannot move an order from {from} to {to}")]
    NotAllowed { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    /// Delivered, completed, and canceled orders never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Completed | Self::Canceled)
    }

    /// Statuses an order of `order_type` may move to from `self`.
    #[must_use]
    pub const fn next_statuses(self, order_type: OrderType) -> &'static [Self] {
        match (self, order_type) {
            (Self::Pending, _) => &[Self::Confirmed, Self::Canceled],
            (Self::Confirmed, _) => &[Self::Preparing, Self::Canceled],
            (Self::Preparing, _) => &[Self::Ready, Self::Canceled],
            (Self::Ready, OrderType::Delivery) => &[Self::OutForDelivery, Self::Canceled],
            (Self::Ready, OrderType::Pickup | OrderType::DineIn) => {
                &[Self::Completed, Self::Canceled]
            }
            (Self::OutForDelivery, _) => &[Self::Delivered, Self::Canceled],
            (Self::Delivered | Self::Completed | Self::Canceled, _) => &[],
        }
    }

    /// Validate a move to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when `to` equals the current status, the
    /// current status is terminal, or `to` is not a legal successor.
    pub fn transition(self, to: Self, order_type: OrderType) -> Result<Self, TransitionError> {
        if self == to {
            return Err(TransitionError::Unchanged(self));
        }
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        if self.next_statuses(order_type).contains(&to) {
            Ok(to)
        } else {
            Err(TransitionError::NotAllowed { from: self, to })
        }
    }

    /// Whether the customer may still cancel the order themselves.
    #[must_use]
    pub const fn customer_can_cancel(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Position along the happy path for `order_type`, starting at 0.
    ///
    /// Returns `None` for canceled orders and for statuses that are not on
    /// the path for this order type (e.g. `completed` on a delivery).
    #[must_use]
    pub fn progress_step(self, order_type: OrderType) -> Option<usize> {
        happy_path(order_type).iter().position(|s| *s == self)
    }
}

/// The forward path an order of `order_type` follows when nothing goes wrong.
#[must_use]
pub const fn happy_path(order_type: OrderType) -> &'static [OrderStatus] {
    match order_type {
        OrderType::Delivery => &[
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ],
        OrderType::Pickup | OrderType::DineIn => &[
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_walkable() {
        for order_type in OrderType::ALL {
            let path = happy_path(order_type);
            for pair in path.windows(2) {
                if let [from, to] = pair {
                    assert_eq!(from.transition(*to, order_type), Ok(*to));
                }
            }
        }
    }

    #[test]
    fn test_ready_branches_on_order_type() {
        assert_eq!(
            OrderStatus::Ready.next_statuses(OrderType::Delivery),
            &[OrderStatus::OutForDelivery, OrderStatus::Canceled]
        );
        assert_eq!(
            OrderStatus::Ready.next_statuses(OrderType::Pickup),
            &[OrderStatus::Completed, OrderStatus::Canceled]
        );
        assert!(matches!(
            OrderStatus::Ready.transition(OrderStatus::OutForDelivery, OrderType::DineIn),
            Err(TransitionError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_terminal_statuses_are_frozen() {
        for status in [
            OrderStatus::Delivered,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            assert!(status.is_terminal());
            assert!(status.next_statuses(OrderType::Delivery).is_empty());
            assert_eq!(
                status.transition(OrderStatus::Pending, OrderType::Delivery),
                Err(TransitionError::Terminal(status))
            );
        }
    }

    #[test]
    fn test_rejects_skips_and_same_status() {
        assert_eq!(
            OrderStatus::Pending.transition(OrderStatus::Pending, OrderType::Pickup),
            Err(TransitionError::Unchanged(OrderStatus::Pending))
        );
        assert_eq!(
            OrderStatus::Pending.transition(OrderStatus::Ready, OrderType::Pickup),
            Err(TransitionError::NotAllowed {
                from: OrderStatus::Pending,
                to: OrderStatus::Ready
            })
        );
        assert!(
            OrderStatus::Preparing
                .transition(OrderStatus::Confirmed, OrderType::Pickup)
                .is_err()
        );
    }

    #[test]
    fn test_any_open_order_can_be_canceled_by_staff() {
        for status in OrderStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert_eq!(
                status.transition(OrderStatus::Canceled, OrderType::Delivery),
                Ok(OrderStatus::Canceled)
            );
        }
    }

    #[test]
    fn test_customer_cancel_only_while_pending() {
        assert!(OrderStatus::Pending.customer_can_cancel());
        assert!(!OrderStatus::Confirmed.customer_can_cancel());
        assert!(!OrderStatus::Canceled.customer_can_cancel());
    }

    #[test]
    fn test_progress_step() {
        assert_eq!(OrderStatus::Pending.progress_step(OrderType::Pickup), Some(0));
        assert_eq!(
            OrderStatus::Delivered.progress_step(OrderType::Delivery),
            Some(5)
        );
        assert_eq!(OrderStatus::Completed.progress_step(OrderType::DineIn), Some(4));
        assert_eq!(OrderStatus::Completed.progress_step(OrderType::Delivery), None);
        assert_eq!(OrderStatus::Canceled.progress_step(OrderType::Pickup), None);
    }
}
