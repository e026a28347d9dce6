//! View models shared by page templates.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use trattoria_core::{Money, Order, OrderStatus, OrderTotals, OrderType, happy_path};

use crate::middleware::{CspNonce, load_cart};
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

/// Data every page layout needs: header, cart badge, and nonce.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub restaurant_name: String,
    pub customer: Option<CurrentCustomer>,
    pub cart_count: u32,
    pub nonce: String,
    pub current_path: String,
}

impl Layout {
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.customer.is_some()
    }

    /// Whether `prefix` is the active nav section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|n| n.value().to_string())
            .unwrap_or_default();

        let (customer, cart_count) = match parts.extensions.get::<Session>() {
            Some(session) => {
                let customer = session
                    .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
                    .await
                    .ok()
                    .flatten();
                let cart_count = match load_cart(session).await {
                    Ok(cart) => cart.item_count(),
                    Err(e) => {
                        tracing::warn!("Failed to read cart from session: {e}");
                        0
                    }
                };
                (customer, cart_count)
            }
            None => (None, 0),
        };

        Ok(Self {
            restaurant_name: state.config().restaurant.name.clone(),
            customer,
            cart_count,
            nonce,
            current_path: parts.uri.path().to_string(),
        })
    }
}

/// Tax, fees, and total rows for templates.
#[derive(Debug, Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub tax: String,
    pub delivery_fee: Option<String>,
    pub service_fee: Option<String>,
    pub total: String,
}

impl From<&OrderTotals> for TotalsView {
    fn from(totals: &OrderTotals) -> Self {
        let non_zero = |m: Money| (m != Money::ZERO).then(|| m.to_string());
        Self {
            subtotal: totals.subtotal.to_string(),
            tax: totals.tax.to_string(),
            delivery_fee: non_zero(totals.delivery_fee),
            service_fee: non_zero(totals.service_fee),
            total: totals.total.to_string(),
        }
    }
}

/// One step of the order progress bar.
#[derive(Debug, Clone)]
pub struct ProgressStep {
    pub label: &'static str,
    pub done: bool,
    pub current: bool,
}

/// Progress bar for an order, empty for canceled orders.
#[must_use]
pub fn progress_steps(status: OrderStatus, order_type: OrderType) -> Vec<ProgressStep> {
    let Some(position) = status.progress_step(order_type) else {
        return Vec::new();
    };
    happy_path(order_type)
        .iter()
        .enumerate()
        .map(|(i, step)| ProgressStep {
            label: step.label(),
            done: i < position,
            current: i == position,
        })
        .collect()
}

/// Row in an order list.
#[derive(Debug, Clone)]
pub struct OrderSummaryView {
    pub id: String,
    pub placed_at: String,
    pub order_type: &'static str,
    pub status: &'static str,
    pub status_class: &'static str,
    pub total: String,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            placed_at: order.created_at.format("%b %-d, %Y %H:%M").to_string(),
            order_type: order.order_type.label(),
            status: order.status.label(),
            status_class: status_class(order.status),
            total: order.total.to_string(),
        }
    }
}

/// CSS modifier for a status badge.
#[must_use]
pub const fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "status--pending",
        OrderStatus::Confirmed | OrderStatus::Preparing => "status--active",
        OrderStatus::Ready | OrderStatus::OutForDelivery => "status--ready",
        OrderStatus::Delivered | OrderStatus::Completed => "status--done",
        OrderStatus::Canceled => "status--canceled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_marks_done_and_current() {
        let steps = progress_steps(OrderStatus::Preparing, OrderType::Pickup);
        assert_eq!(steps.len(), 5);
        assert!(steps.iter().take(2).all(|s| s.done && !s.current));
        assert!(steps.get(2).is_some_and(|s| s.current));
        assert!(steps.iter().skip(3).all(|s| !s.done && !s.current));
    }

    #[test]
    fn test_canceled_orders_have_no_progress() {
        assert!(progress_steps(OrderStatus::Canceled, OrderType::Delivery).is_empty());
    }

    #[test]
    fn test_totals_view_hides_zero_fees() {
        let view = TotalsView::from(&OrderTotals {
            subtotal: Money::from_cents(1000),
            tax: Money::from_cents(83),
            delivery_fee: Money::ZERO,
            service_fee: Money::from_cents(100),
            total: Money::from_cents(1183),
        });
        assert_eq!(view.delivery_fee, None);
        assert_eq!(view.service_fee.as_deref(), Some("$1.00"));
        assert_eq!(view.total, "$11.83");
    }

    #[test]
    fn test_layout_active_section() {
        let layout = Layout {
            current_path: "/menu/4".to_string(),
            ..Layout::default()
        };
        assert!(layout.is_active("/menu"));
        assert!(!layout.is_active("/"));
    }
}
