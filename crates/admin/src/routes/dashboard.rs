//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use chrono::{DateTime, NaiveTime, Utc};
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::{Money, Order};

use crate::{
    db::{CustomerRepository, OrderRepository, OrderStats, ProductRepository},
    filters,
    middleware::{Flash, auth::RequireAdminAuth},
    models::CurrentAdmin,
    state::AppState,
};

use super::{page_flash, render};

/// How many orders the dashboard lists.
const RECENT_ORDER_LIMIT: i64 = 10;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub is_super_admin: bool,
    pub can_write: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            is_super_admin: admin.is_super_admin(),
            can_write: admin.can_write(),
        }
    }
}

/// Dashboard metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub orders_today: i64,
    pub revenue_today: Money,
    pub open_orders: i64,
    pub pending_orders: i64,
    pub products: i64,
    pub products_in_stock: i64,
    pub customers: i64,
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self {
            orders_today: 0,
            revenue_today: Money::ZERO,
            open_orders: 0,
            pending_orders: 0,
            products: 0,
            products_in_stock: 0,
            customers: 0,
        }
    }
}

impl DashboardMetrics {
    fn with_order_stats(mut self, stats: OrderStats) -> Self {
        self.orders_today = stats.orders_today;
        self.revenue_today = stats.revenue_today;
        self.open_orders = stats.open_orders;
        self.pending_orders = stats.pending_orders;
        self
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub metrics: DashboardMetrics,
    pub orders: Vec<Order>,
}

/// Midnight UTC at the start of `now`'s day.
fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Dashboard page handler.
///
/// A failing query blanks its panel rather than the whole page.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let orders = OrderRepository::new(state.pool());
    let products = ProductRepository::new(state.pool());
    let customers = CustomerRepository::new(state.pool());

    let (stats_result, product_result, customer_result, recent_result) = tokio::join!(
        orders.stats(start_of_day(Utc::now())),
        products.counts(),
        customers.count(),
        orders.recent(RECENT_ORDER_LIMIT),
    );

    let mut metrics = DashboardMetrics::default();
    match stats_result {
        Ok(stats) => metrics = metrics.with_order_stats(stats),
        Err(e) => tracing::error!("Failed to fetch order stats: {e}"),
    }
    match product_result {
        Ok((total, in_stock)) => {
            metrics.products = total;
            metrics.products_in_stock = in_stock;
        }
        Err(e) => tracing::error!("Failed to count products: {e}"),
    }
    match customer_result {
        Ok(count) => metrics.customers = count,
        Err(e) => tracing::error!("Failed to count customers: {e}"),
    }
    let recent_orders = recent_result.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch recent orders: {e}");
        vec![]
    });

    render(&DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash: page_flash(&session).await,
        metrics,
        orders: recent_orders,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_start_of_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 18, 45, 12).unwrap();
        assert_eq!(
            start_of_day(now),
            Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_metrics_take_order_stats() {
        let metrics = DashboardMetrics::default().with_order_stats(OrderStats {
            orders_today: 4,
            revenue_today: Money::from_cents(8_150),
            open_orders: 3,
            pending_orders: 1,
        });
        assert_eq!(metrics.orders_today, 4);
        assert_eq!(metrics.revenue_today.to_string(), "$81.50");
        assert_eq!(metrics.customers, 0);
    }
}
