//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart lives in the session as product IDs and quantities; every view
//! re-prices it against the current menu.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::ProductId;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{load_cart, save_cart};
use crate::models::Cart;
use crate::services::{CheckoutService, PricedCart};
use crate::state::AppState;
use crate::views::Layout;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
    pub available: bool,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    pub has_unavailable: bool,
}

impl From<&PricedCart> for CartView {
    fn from(cart: &PricedCart) -> Self {
        let items: Vec<CartItemView> = cart
            .lines
            .iter()
            .map(|line| CartItemView {
                product_id: line.product.id.as_i32(),
                name: line.product.name.clone(),
                image_url: line.product.image_url.clone(),
                unit_price: line.product.price.to_string(),
                quantity: line.quantity,
                line_total: line.line_total.to_string(),
                available: line.available(),
            })
            .collect();
        Self {
            has_unavailable: items.iter().any(|i| !i.available),
            item_count: items.iter().map(|i| i.quantity).sum(),
            subtotal: cart.subtotal().to_string(),
            items,
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Price the session cart, dropping lines whose product left the menu.
///
/// # Errors
///
/// Returns `AppError` if the session or database fails.
pub async fn priced_session_cart(
    state: &AppState,
    session: &Session,
) -> Result<(Cart, PricedCart), AppError> {
    let mut cart = load_cart(session).await?;
    let priced = CheckoutService::new(state.pool(), &state.config().pricing)
        .price_cart(&cart)
        .await?;

    if !priced.dropped.is_empty() {
        tracing::info!(dropped = priced.dropped.len(), "Removing unavailable products from cart");
        cart.retain_products(|id| !priced.dropped.contains(&id));
        save_cart(session, &cart).await?;
    }

    Ok((cart, priced))
}

/// Display cart page.
///
/// # Errors
///
/// Returns `AppError` if the cart cannot be priced.
#[instrument(skip(state, session, layout))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    mut layout: Layout,
) -> Result<impl IntoResponse, AppError> {
    let (cart, priced) = priced_session_cart(&state, &session).await?;
    layout.cart_count = cart.item_count();

    Ok(CartShowTemplate {
        layout,
        cart: CartView::from(&priced),
    })
}

/// Add item to cart (HTMX).
///
/// Returns the count badge and an `HX-Trigger` so other cart widgets refresh.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product isn't on the menu and
/// `AppError::BadRequest` if it's out of stock.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let product_id = ProductId::new(form.product_id);
    let product = state
        .menu()
        .product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    if !product.in_stock {
        return Err(AppError::BadRequest(format!(
            "{} is currently unavailable",
            product.name
        )));
    }

    let mut cart = load_cart(&session).await?;
    let quantity = cart.add(product_id, form.quantity.unwrap_or(1));
    save_cart(&session, &cart).await?;

    let (id_text, quantity_text) = (product_id.to_string(), quantity.to_string());
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product_id", id_text.as_str()),
            ("quantity", quantity_text.as_str()),
        ]),
    );

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX). A quantity of zero removes the line.
///
/// # Errors
///
/// Returns `AppError` if the session or database fails.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response, AppError> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(ProductId::new(form.product_id), form.quantity);
    save_cart(&session, &cart).await?;

    items_fragment(&state, &session).await
}

/// Remove item from cart (HTMX).
///
/// # Errors
///
/// Returns `AppError` if the session or database fails.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, AppError> {
    let mut cart = load_cart(&session).await?;
    cart.remove(ProductId::new(form.product_id));
    save_cart(&session, &cart).await?;

    items_fragment(&state, &session).await
}

async fn items_fragment(state: &AppState, session: &Session) -> Result<Response, AppError> {
    let (_, priced) = priced_session_cart(state, session).await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(&priced),
        },
    )
        .into_response())
}

/// Get cart count badge (HTMX).
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be read.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse, AppError> {
    let cart = load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use trattoria_core::{CategoryId, Money, Product};

    use super::*;

    fn product(id: i32, in_stock: bool) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Dish {id}"),
            description: String::new(),
            price: Money::from_cents(850),
            image_url: None,
            featured: false,
            in_stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_view_totals_and_flags() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(2), 1);
        let priced = PricedCart::build(&cart, &[product(1, true), product(2, false)]);

        let view = CartView::from(&priced);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "$25.50");
        assert!(view.has_unavailable);
        assert_eq!(view.items[0].line_total, "$17.00");
    }
}
