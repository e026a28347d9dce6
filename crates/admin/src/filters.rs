//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::borrow::Borrow;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use trattoria_core::OrderStatus;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(Utc::now().year())
}

/// Short UTC timestamp for tables, e.g. `Oct 18, 19:05`.
///
/// Usage in templates: `{{ order.created_at|timestamp }}`
#[askama::filter_fn]
pub fn timestamp(
    value: impl Borrow<DateTime<Utc>>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(value.borrow().format("%b %-d, %H:%M").to_string())
}

/// CSS modifier for an order status badge.
///
/// Usage in templates: `<span class="status {{ order.status|status_class }}">`
#[askama::filter_fn]
pub fn status_class(
    value: impl Borrow<OrderStatus>,
    _env: &dyn askama::Values,
) -> askama::Result<&'static str> {
    Ok(match value.borrow() {
        OrderStatus::Pending => "status--pending",
        OrderStatus::Confirmed | OrderStatus::Preparing | OrderStatus::OutForDelivery => {
            "status--active"
        }
        OrderStatus::Ready => "status--ready",
        OrderStatus::Delivered | OrderStatus::Completed => "status--done",
        OrderStatus::Canceled => "status--canceled",
    })
}
