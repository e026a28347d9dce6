//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::{OrderType, PaymentMethod};

use crate::db::CustomerRepository;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, remember_guest_order, save_cart};
use crate::models::Cart;
use crate::routes::cart::{CartView, priced_session_cart};
use crate::services::{CheckoutDetails, CheckoutError, CheckoutService, PricedCart};
use crate::state::AppState;
use crate::views::{Layout, TotalsView};

/// Checkout form data.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
}

impl From<CheckoutForm> for CheckoutDetails {
    fn from(form: CheckoutForm) -> Self {
        Self {
            name: form.name,
            email: form.email,
            phone: form.phone,
            order_type: form.order_type,
            payment_method: form.payment_method,
            delivery_address: form.delivery_address,
            table_number: form.table_number,
            notes: form.notes,
        }
    }
}

/// Values shown in the checkout form.
#[derive(Debug, Clone, Default)]
pub struct CheckoutFormView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub order_type: String,
    pub payment_method: String,
    pub delivery_address: String,
    pub table_number: String,
    pub notes: String,
}

impl From<&CheckoutForm> for CheckoutFormView {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            order_type: form.order_type.as_str().to_string(),
            payment_method: form.payment_method.to_string(),
            delivery_address: form.delivery_address.clone().unwrap_or_default(),
            table_number: form.table_number.clone().unwrap_or_default(),
            notes: form.notes.clone().unwrap_or_default(),
        }
    }
}

/// An order type choice in the form.
#[derive(Debug, Clone)]
pub struct OrderTypeOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Quote query parameters.
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub order_type: Option<OrderType>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub totals: Option<TotalsView>,
    pub form: CheckoutFormView,
    pub order_types: Vec<OrderTypeOption>,
    pub error: Option<String>,
}

/// Totals fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/quote.html")]
pub struct QuoteTemplate {
    pub totals: Option<TotalsView>,
    pub order_type: &'static str,
}

fn order_type_options() -> Vec<OrderTypeOption> {
    OrderType::ALL
        .into_iter()
        .map(|t| OrderTypeOption {
            value: t.as_str(),
            label: t.label(),
        })
        .collect()
}

fn quote_view(state: &AppState, priced: &PricedCart, order_type: OrderType) -> Option<TotalsView> {
    priced
        .quote(&state.config().pricing, order_type)
        .ok()
        .map(|totals| TotalsView::from(&totals))
}

/// Display the checkout form with a quote for the default order type.
///
/// Signed-in customers get their profile details prefilled.
///
/// # Errors
///
/// Returns `AppError` if the cart or profile cannot be loaded.
#[instrument(skip(state, session, layout, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response, AppError> {
    let (cart, priced) = priced_session_cart(&state, &session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut form = CheckoutFormView {
        order_type: OrderType::Pickup.as_str().to_string(),
        payment_method: PaymentMethod::Cash.to_string(),
        ..CheckoutFormView::default()
    };
    if let Some(current) = customer {
        if let Some(profile) = CustomerRepository::new(state.pool())
            .get_by_id(current.id)
            .await?
        {
            form.name = profile.name;
            form.email = profile.email.to_string();
            form.phone = profile.phone.unwrap_or_default();
            form.delivery_address = profile.address.unwrap_or_default();
        }
    }

    Ok(CheckoutTemplate {
        totals: quote_view(&state, &priced, OrderType::Pickup),
        layout,
        cart: CartView::from(&priced),
        form,
        order_types: order_type_options(),
        error: None,
    }
    .into_response())
}

/// Totals for the selected order type (HTMX).
///
/// # Errors
///
/// Returns `AppError` if the cart cannot be priced.
#[instrument(skip(state, session))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<QuoteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let order_type = query.order_type.unwrap_or(OrderType::Pickup);
    let (_, priced) = priced_session_cart(&state, &session).await?;
    Ok(QuoteTemplate {
        totals: quote_view(&state, &priced, order_type),
        order_type: order_type.as_str(),
    })
}

/// Place the order.
///
/// On success the cart is cleared, the order is remembered in the session
/// for guest tracking, and the customer is sent to the tracking page.
/// Validation problems re-render the form with the entered values.
///
/// # Errors
///
/// Returns `AppError` for session or database failures.
#[instrument(skip(state, session, layout, customer, form), fields(order_type = %form.order_type))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let (cart, priced) = priced_session_cart(&state, &session).await?;
    let service = CheckoutService::new(state.pool(), &state.config().pricing);
    let form_view = CheckoutFormView::from(&form);
    let order_type = form.order_type;

    match service
        .place_order(&cart, &form.into(), customer.as_ref().map(|c| c.id))
        .await
    {
        Ok(order) => {
            save_cart(&session, &Cart::default()).await?;
            remember_guest_order(&session, order.id).await?;

            let order_id = order.id.to_string();
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_id", order_id.as_str())]),
            );

            Ok(Redirect::to(&format!("/orders/{}", order.id)).into_response())
        }
        Err(CheckoutError::EmptyCart) => Ok(Redirect::to("/cart").into_response()),
        Err(err) if err.is_user_error() => {
            tracing::info!(error = %err, "Checkout rejected");
            let page = CheckoutTemplate {
                totals: quote_view(&state, &priced, order_type),
                layout,
                cart: CartView::from(&priced),
                form: form_view,
                order_types: order_type_options(),
                error: Some(err.to_string()),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(err) => Err(err.into()),
    }
}
