//! Informational pages: services, offers, and location.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use trattoria_core::{Money, OrderType, Product};

use crate::config::RestaurantInfo;
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;
use crate::views::Layout;

/// One way to receive an order, with the fee that applies.
#[derive(Debug, Clone)]
pub struct ServiceView {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub fee: String,
}

/// Describe each order type with the configured fees.
#[must_use]
pub fn service_views(delivery_fee: Money, service_rate_percent: &str) -> Vec<ServiceView> {
    OrderType::ALL
        .into_iter()
        .map(|order_type| match order_type {
            OrderType::Delivery => ServiceView {
                key: order_type.as_str(),
                title: order_type.label(),
                description: "Hot food brought to your door by our own drivers.",
                fee: format!("{delivery_fee} delivery fee"),
            },
            OrderType::Pickup => ServiceView {
                key: order_type.as_str(),
                title: order_type.label(),
                description: "Order ahead and collect at the counter when it's ready.",
                fee: "No extra fees".to_string(),
            },
            OrderType::DineIn => ServiceView {
                key: order_type.as_str(),
                title: order_type.label(),
                description: "Order from your table and we'll bring it over.",
                fee: format!("{service_rate_percent}% service fee"),
            },
        })
        .collect()
}

/// Services page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/services.html")]
pub struct ServicesTemplate {
    pub layout: Layout,
    pub services: Vec<ServiceView>,
    pub tax_percent: String,
}

/// Offers page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/offers.html")]
pub struct OffersTemplate {
    pub layout: Layout,
    pub offers: Vec<Product>,
}

/// Location page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/location.html")]
pub struct LocationTemplate {
    pub layout: Layout,
    pub restaurant: RestaurantInfo,
}

/// Format a fraction such as `0.0825` as `8.25`.
fn percent(rate: rust_decimal::Decimal) -> String {
    (rate * rust_decimal::Decimal::ONE_HUNDRED).normalize().to_string()
}

/// Display the services page.
#[instrument(skip(state, layout))]
pub async fn services(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    let pricing = &state.config().pricing;
    ServicesTemplate {
        layout,
        services: service_views(pricing.delivery_fee, &percent(pricing.dine_in_service_rate)),
        tax_percent: percent(pricing.tax_rate),
    }
}

/// Display featured dishes as offers.
///
/// # Errors
///
/// Returns `AppError::Database` if the products cannot be loaded.
#[instrument(skip(state, layout))]
pub async fn offers(
    State(state): State<AppState>,
    layout: Layout,
) -> Result<impl IntoResponse, AppError> {
    let offers = state.menu().featured().await?;
    Ok(OffersTemplate {
        layout,
        offers: offers.as_ref().clone(),
    })
}

/// Display address, phone, and opening hours.
#[instrument(skip(state, layout))]
pub async fn location(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    LocationTemplate {
        layout,
        restaurant: state.config().restaurant.clone(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_percent_formatting() {
        assert_eq!(percent(Decimal::new(825, 4)), "8.25");
        assert_eq!(percent(Decimal::new(10, 2)), "10");
    }

    #[test]
    fn test_service_views_show_fees() {
        let views = service_views(Money::from_cents(399), "10");
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].fee, "$3.99 delivery fee");
        assert_eq!(views[1].fee, "No extra fees");
        assert_eq!(views[2].fee, "10% service fee");
        assert_eq!(views[2].key, "dine_in");
    }
}
