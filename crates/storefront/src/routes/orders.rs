//! Order history and tracking route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::{OrderId, OrderItem};

use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, guest_orders};
use crate::services::{OrderDetail, OrderService};
use crate::state::AppState;
use crate::views::{Layout, OrderSummaryView, ProgressStep, TotalsView, progress_steps, status_class};

/// Order header fields for the tracking page.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub placed_at: String,
    pub customer_name: String,
    pub order_type: &'static str,
    pub payment_method: &'static str,
    pub delivery_address: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
    pub status: &'static str,
    pub status_class: &'static str,
    pub is_open: bool,
    pub can_cancel: bool,
}

/// One status history entry.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub status: &'static str,
    pub at: String,
}

/// Tracking page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderView,
    pub status: OrderStatusView,
    pub items: Vec<OrderItem>,
    pub totals: TotalsView,
    pub history: Vec<HistoryView>,
}

/// Status block shared by the page and the polled fragment.
#[derive(Debug, Clone)]
pub struct OrderStatusView {
    pub order_id: String,
    pub label: &'static str,
    pub class: &'static str,
    pub steps: Vec<ProgressStep>,
    /// Keep polling while the order can still change.
    pub poll: bool,
}

/// Status fragment template (for HTMX polling).
#[derive(Template, WebTemplate)]
#[template(path = "partials/order_status.html")]
pub struct OrderStatusTemplate {
    pub status: OrderStatusView,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrderIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderSummaryView>,
}

fn status_view(detail: &trattoria_core::Order) -> OrderStatusView {
    OrderStatusView {
        order_id: detail.id.to_string(),
        label: detail.status.label(),
        class: status_class(detail.status),
        steps: progress_steps(detail.status, detail.order_type),
        poll: !detail.status.is_terminal(),
    }
}

impl OrderShowTemplate {
    fn new(layout: Layout, detail: &OrderDetail) -> Self {
        let order = &detail.order;
        Self {
            layout,
            order: OrderView {
                id: order.id.to_string(),
                placed_at: order.created_at.format("%b %-d, %Y %H:%M").to_string(),
                customer_name: order.customer_name.clone(),
                order_type: order.order_type.label(),
                payment_method: order.payment_method.label(),
                delivery_address: order.delivery_address.clone(),
                table_number: order.table_number.clone(),
                notes: order.notes.clone(),
                status: order.status.label(),
                status_class: status_class(order.status),
                is_open: !order.status.is_terminal(),
                can_cancel: order.status.customer_can_cancel(),
            },
            status: status_view(order),
            items: detail.items.clone(),
            totals: TotalsView::from(&order.totals()),
            history: detail
                .history
                .iter()
                .map(|h| HistoryView {
                    status: h.status.label(),
                    at: h.created_at.format("%b %-d, %H:%M").to_string(),
                })
                .collect(),
        }
    }
}

/// Signed-in customer's order history.
///
/// # Errors
///
/// Returns `AppError` if the orders cannot be loaded.
#[instrument(skip(state, layout, customer))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(customer): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let orders = OrderService::new(state.pool()).history_for(&customer).await?;
    Ok(OrderIndexTemplate {
        layout,
        orders: orders.iter().map(OrderSummaryView::from).collect(),
    })
}

/// Order tracking page.
///
/// # Errors
///
/// Returns 404 unless the requester owns the order or placed it from this
/// session.
#[instrument(skip(state, session, layout, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let guests = guest_orders(&session).await?;
    let detail = OrderService::new(state.pool())
        .detail(OrderId::new(id), customer.as_ref(), &guests)
        .await?;

    Ok(OrderShowTemplate::new(layout, &detail))
}

/// Status fragment, polled by the tracking page.
///
/// # Errors
///
/// Returns 404 for orders the requester may not see.
#[instrument(skip(state, session, customer))]
pub async fn status(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let guests = guest_orders(&session).await?;
    let order = OrderService::new(state.pool())
        .visible_order(OrderId::new(id), customer.as_ref(), &guests)
        .await?;

    Ok(OrderStatusTemplate {
        status: status_view(&order),
    })
}

/// Cancel a pending order.
///
/// HTMX requests get a full-page refresh; plain form posts are redirected
/// back to the tracking page.
///
/// # Errors
///
/// Returns 409 if the order is no longer pending.
#[instrument(skip(state, session, customer, headers))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let guests = guest_orders(&session).await?;
    let order = OrderService::new(state.pool())
        .cancel(OrderId::new(id), customer.as_ref(), &guests)
        .await?;

    let location = format!("/orders/{}", order.id);
    if headers.contains_key("hx-request") {
        Ok([("HX-Redirect", location)].into_response())
    } else {
        Ok(Redirect::to(&location).into_response())
    }
}
