//! Order queue route handlers.

use std::str::FromStr;

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::{
    Order, OrderId, OrderItem, OrderStatus, OrderType, ParseEnumError, StatusChange, happy_path,
};

use crate::{
    db::{OrderFilter, OrderRepository},
    error::AppError,
    filters,
    middleware::{
        Flash,
        auth::{RequireAdminAuth, RequireSuperAdmin, RequireWriteAccess},
    },
    services::{OrderDetail, OrderError, OrderService},
    state::AppState,
};

use super::dashboard::AdminUserView;
use super::{page_flash, redirect_with, render};

/// Order list query parameters. Blank values mean "any".
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub order_type: Option<String>,
    pub q: Option<String>,
}

impl OrderQuery {
    /// Parse into a filter, ignoring unknown status or type values.
    fn to_filter(&self) -> OrderFilter {
        OrderFilter {
            status: parse_choice(self.status.as_deref()),
            order_type: parse_choice(self.order_type.as_deref()),
            query: self.q.clone().filter(|q| !q.trim().is_empty()),
        }
    }
}

fn parse_choice<T: FromStr>(value: Option<&str>) -> Option<T> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Orders list page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub orders: Vec<Order>,
    pub statuses: [OrderStatus; 8],
    pub order_types: [OrderType; 3],
    pub selected_status: Option<OrderStatus>,
    pub selected_type: Option<OrderType>,
    pub search_query: String,
}

impl OrdersIndexTemplate {
    fn status_selected(&self, status: &OrderStatus) -> bool {
        self.selected_status.as_ref() == Some(status)
    }

    fn type_selected(&self, order_type: &OrderType) -> bool {
        self.selected_type.as_ref() == Some(order_type)
    }
}

/// A progress step on the order detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub label: &'static str,
    pub done: bool,
    pub current: bool,
}

/// Build the progress steps for an order. Canceled orders have none.
fn progress_steps(order: &Order) -> Vec<StepView> {
    let Some(position) = order.status.progress_step(order.order_type) else {
        return vec![];
    };
    happy_path(order.order_type)
        .iter()
        .enumerate()
        .map(|(i, status)| StepView {
            label: status.label(),
            done: i <= position,
            current: i == position,
        })
        .collect()
}

/// Order detail page template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<StatusChange>,
    pub next_statuses: &'static [OrderStatus],
    pub steps: Vec<StepView>,
    pub error: Option<String>,
}

/// Orders list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrderQuery>,
) -> Html<String> {
    let filter = query.to_filter();
    let orders = OrderRepository::new(state.pool())
        .list(&filter)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch orders: {e}");
            vec![]
        });

    render(&OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        flash: page_flash(&session).await,
        orders,
        statuses: OrderStatus::ALL,
        order_types: OrderType::ALL,
        selected_status: filter.status,
        selected_type: filter.order_type,
        search_query: filter.query.unwrap_or_default(),
    })
}

fn show_template(
    admin_user: AdminUserView,
    flash: Option<Flash>,
    detail: OrderDetail,
    error: Option<String>,
) -> OrderShowTemplate {
    let OrderDetail {
        order,
        items,
        history,
    } = detail;
    let next_statuses = order.status.next_statuses(order.order_type);
    let steps = progress_steps(&order);
    OrderShowTemplate {
        admin_user,
        current_path: "/orders".to_string(),
        flash,
        order,
        items,
        history,
        next_statuses,
        steps,
        error,
    }
}

/// Order detail page handler.
///
/// # Errors
///
/// Returns `AppError::Order` if the order does not exist.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let detail = OrderService::new(state.pool())
        .detail(OrderId::new(id))
        .await?;
    Ok(render(&show_template(
        AdminUserView::from(&admin),
        page_flash(&session).await,
        detail,
        None,
    )))
}

/// Apply a status change.
///
/// A rejected transition or a lost race re-renders the detail page with
/// the current state and a message.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown status and
/// `AppError::Order` if the order does not exist.
#[instrument(skip(admin, state, session, form), fields(to = %form.status))]
pub async fn update_status(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let to: OrderStatus = form
        .status
        .parse()
        .map_err(|e: ParseEnumError| AppError::BadRequest(e.to_string()))?;
    let id = OrderId::new(id);
    let service = OrderService::new(state.pool());

    match service.update_status(id, to, &admin).await {
        Ok(order) => {
            redirect_with(
                &session,
                &format!("/orders/{id}"),
                Flash::success(format!("Order #{id} is now {}.", order.status.label())),
            )
            .await
        }
        Err(err @ (OrderError::Transition(_) | OrderError::Conflict)) => {
            tracing::warn!(error = %err, "Order status change rejected");
            let detail = service.detail(id).await?;
            let page = render(&show_template(
                AdminUserView::from(&admin),
                None,
                detail,
                Some(err.to_string()),
            ));
            Ok((StatusCode::CONFLICT, page).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete an order outright (super admin only).
///
/// # Errors
///
/// Returns `AppError::Order` if the order does not exist.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    OrderService::new(state.pool())
        .delete(OrderId::new(id), &admin)
        .await?;
    redirect_with(
        &session,
        "/orders",
        Flash::success(format!("Order #{id} deleted.")),
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use trattoria_core::{Email, Money, PaymentMethod};

    use super::*;

    fn order(status: OrderStatus, order_type: OrderType) -> Order {
        Order {
            id: OrderId::new(12),
            customer_id: None,
            customer_name: "Marco".to_string(),
            customer_email: Email::parse("marco@example.com").unwrap(),
            customer_phone: "555-0100".to_string(),
            delivery_address: None,
            table_number: None,
            notes: None,
            order_type,
            payment_method: PaymentMethod::Cash,
            status,
            subtotal: Money::from_cents(1000),
            tax: Money::from_cents(83),
            delivery_fee: Money::ZERO,
            service_fee: Money::ZERO,
            total: Money::from_cents(1083),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_query_to_filter_ignores_blank_and_unknown() {
        let query = OrderQuery {
            status: Some("ready".to_string()),
            order_type: Some(String::new()),
            q: Some("  ".to_string()),
        };
        let filter = query.to_filter();
        assert_eq!(filter.status, Some(OrderStatus::Ready));
        assert_eq!(filter.order_type, None);
        assert_eq!(filter.query, None);

        let query = OrderQuery {
            status: Some("lost".to_string()),
            order_type: Some("dine_in".to_string()),
            q: Some("marco".to_string()),
        };
        let filter = query.to_filter();
        assert_eq!(filter.status, None);
        assert_eq!(filter.order_type, Some(OrderType::DineIn));
        assert_eq!(filter.query.as_deref(), Some("marco"));
    }

    #[test]
    fn test_progress_steps() {
        let steps = progress_steps(&order(OrderStatus::Preparing, OrderType::Pickup));
        assert_eq!(steps.len(), 5);
        assert!(steps[2].current);
        assert!(steps[1].done);
        assert!(!steps[3].done);
        assert_eq!(steps[4].label, "Completed");

        assert!(progress_steps(&order(OrderStatus::Canceled, OrderType::Delivery)).is_empty());
    }
}
