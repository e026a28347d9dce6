//! Cart pricing and order placement.

use sqlx::PgPool;
use tracing::instrument;

use trattoria_core::{
    CustomerId, Email, EmailError, Money, Order, OrderTotals, OrderType, PaymentMethod,
    PricedLine, PricingError, PricingRules, Product, ProductId,
};

use crate::db::{NewOrder, NewOrderItem, OrderRepository, ProductRepository, RepositoryError};
use crate::models::Cart;

const MAX_NAME_LENGTH: usize = 120;
const MAX_PHONE_LENGTH: usize = 40;
const MAX_ADDRESS_LENGTH: usize = 500;
const MAX_TABLE_LENGTH: usize = 10;
const MAX_NOTES_LENGTH: usize = 1000;

/// Errors that stop a checkout.
#[derive(thiserror::Error, Debug)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,
    #[error("some items are no longer available: {}", .0.join(", "))]
    OutOfStock(Vec<String>),
    #[error("please enter your name")]
    MissingName,
    #[error("please enter a phone number")]
    MissingPhone,
    #[error("{0}")]
    InvalidEmail(#[from] EmailError),
    #[error("delivery orders need an address")]
    MissingAddress,
    #[error("{field} is too long")]
    TooLong { field: &'static str },
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Whether the customer can fix this by changing the form or cart.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::Repository(_))
    }
}

/// A cart line joined with the current product row.
#[derive(Debug, Clone)]
pub struct PricedCartLine {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Money,
}

impl PricedCartLine {
    #[must_use]
    pub const fn available(&self) -> bool {
        self.product.in_stock
    }
}

/// The session cart priced against the current menu.
#[derive(Debug, Clone, Default)]
pub struct PricedCart {
    pub lines: Vec<PricedCartLine>,
    /// Products that were in the cart but are no longer on the menu.
    pub dropped: Vec<ProductId>,
}

impl PricedCart {
    /// Join cart lines with `products`. Lines without a product are
    /// reported in `dropped`.
    #[must_use]
    pub fn build(cart: &Cart, products: &[Product]) -> Self {
        let mut priced = Self::default();
        for line in cart.lines() {
            match products.iter().find(|p| p.id == line.product_id) {
                Some(product) => priced.lines.push(PricedCartLine {
                    product: product.clone(),
                    quantity: line.quantity,
                    line_total: PricedLine::new(product.price, line.quantity).line_total(),
                }),
                None => priced.dropped.push(line.product_id),
            }
        }
        priced
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line totals, before tax and fees.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|l| l.line_total).sum()
    }

    /// Names of lines whose product is out of stock.
    #[must_use]
    pub fn unavailable(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|l| !l.available())
            .map(|l| l.product.name.clone())
            .collect()
    }

    /// Totals for `order_type`.
    ///
    /// # Errors
    ///
    /// Returns `PricingError` if the cart is empty or has an invalid line.
    pub fn quote(
        &self,
        rules: &PricingRules,
        order_type: OrderType,
    ) -> Result<OrderTotals, PricingError> {
        let lines: Vec<PricedLine> = self
            .lines
            .iter()
            .map(|l| PricedLine::new(l.product.price, l.quantity))
            .collect();
        rules.quote(&lines, order_type)
    }
}

/// Raw checkout form values.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
}

/// Checkout values after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDetails {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutDetails {
    /// Trim and validate the form.
    ///
    /// The delivery address is kept only for delivery orders and the table
    /// number only for dine-in.
    ///
    /// # Errors
    ///
    /// Returns the first `CheckoutError` found.
    pub fn validate(&self) -> Result<ValidatedDetails, CheckoutError> {
        let name = required(&self.name, CheckoutError::MissingName)?;
        check_len(name, MAX_NAME_LENGTH, "name")?;
        let email = Email::parse(&self.email)?;
        let phone = required(&self.phone, CheckoutError::MissingPhone)?;
        check_len(phone, MAX_PHONE_LENGTH, "phone")?;

        let delivery_address = match self.order_type {
            OrderType::Delivery => {
                let address = optional(self.delivery_address.as_deref())
                    .ok_or(CheckoutError::MissingAddress)?;
                check_len(address, MAX_ADDRESS_LENGTH, "address")?;
                Some(address.to_string())
            }
            OrderType::Pickup | OrderType::DineIn => None,
        };

        let table_number = match self.order_type {
            OrderType::DineIn => optional(self.table_number.as_deref())
                .map(|t| check_len(t, MAX_TABLE_LENGTH, "table number").map(|()| t.to_string()))
                .transpose()?,
            OrderType::Delivery | OrderType::Pickup => None,
        };

        let notes = optional(self.notes.as_deref())
            .map(|n| check_len(n, MAX_NOTES_LENGTH, "notes").map(|()| n.to_string()))
            .transpose()?;

        Ok(ValidatedDetails {
            name: name.to_string(),
            email,
            phone: phone.to_string(),
            order_type: self.order_type,
            payment_method: self.payment_method,
            delivery_address,
            table_number,
            notes,
        })
    }
}

fn required(value: &str, err: CheckoutError) -> Result<&str, CheckoutError> {
    let value = value.trim();
    if value.is_empty() { Err(err) } else { Ok(value) }
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_len(value: &str, max: usize, field: &'static str) -> Result<(), CheckoutError> {
    if value.chars().count() > max {
        Err(CheckoutError::TooLong { field })
    } else {
        Ok(())
    }
}

/// Prices carts and places orders.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    rules: &'a PricingRules,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, rules: &'a PricingRules) -> Self {
        Self { pool, rules }
    }

    /// Price the session cart against the current menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the products cannot be loaded.
    #[instrument(skip(self, cart), fields(lines = cart.lines().len()))]
    pub async fn price_cart(&self, cart: &Cart) -> Result<PricedCart, RepositoryError> {
        let products = ProductRepository::new(self.pool)
            .get_many(&cart.product_ids())
            .await?;
        Ok(PricedCart::build(cart, &products))
    }

    /// Price the cart for `order_type`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the cart cannot be priced.
    pub async fn quote(
        &self,
        cart: &Cart,
        order_type: OrderType,
    ) -> Result<(PricedCart, OrderTotals), CheckoutError> {
        let priced = self.price_cart(cart).await?;
        if priced.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let totals = priced.quote(self.rules, order_type)?;
        Ok((priced, totals))
    }

    /// Validate, price, and persist an order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` for an empty or unavailable cart, invalid
    /// details, or a database failure. Nothing is written on error.
    #[instrument(skip(self, cart, details), fields(order_type = %details.order_type))]
    pub async fn place_order(
        &self,
        cart: &Cart,
        details: &CheckoutDetails,
        customer_id: Option<CustomerId>,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let details = details.validate()?;

        let (priced, totals) = self.quote(cart, details.order_type).await?;
        let mut unavailable = priced.unavailable();
        if !priced.dropped.is_empty() {
            unavailable.push("items removed from the menu".to_string());
        }
        if !unavailable.is_empty() {
            return Err(CheckoutError::OutOfStock(unavailable));
        }

        let items: Vec<NewOrderItem> = priced
            .lines
            .iter()
            .map(|l| NewOrderItem {
                product_id: l.product.id,
                product_name: l.product.name.clone(),
                unit_price: l.product.price,
                quantity: i32::try_from(l.quantity).unwrap_or(i32::MAX),
                line_total: l.line_total,
            })
            .collect();

        let order = NewOrder {
            customer_id,
            customer_name: details.name,
            customer_email: details.email,
            customer_phone: details.phone,
            delivery_address: details.delivery_address,
            table_number: details.table_number,
            notes: details.notes,
            order_type: details.order_type,
            payment_method: details.payment_method,
            totals,
        };

        let created = OrderRepository::new(self.pool).create(&order, &items).await?;
        tracing::info!(order_id = %created.id, total = %created.total, "Order placed");
        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use trattoria_core::CategoryId;

    use super::*;

    fn product(id: i32, cents: i64, in_stock: bool) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Dish {id}"),
            description: String::new(),
            price: Money::from_cents(cents),
            image_url: None,
            featured: false,
            in_stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn details(order_type: OrderType) -> CheckoutDetails {
        CheckoutDetails {
            name: "  Ada Lovelace ".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            order_type,
            payment_method: PaymentMethod::Cash,
            delivery_address: Some("1 Analytical Way".to_string()),
            table_number: Some("12".to_string()),
            notes: Some("   ".to_string()),
        }
    }

    #[test]
    fn test_build_drops_missing_products() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(2), 1);
        let priced = PricedCart::build(&cart, &[product(1, 1250, true)]);

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.dropped, vec![ProductId::new(2)]);
        assert_eq!(priced.subtotal(), Money::from_cents(2500));
    }

    #[test]
    fn test_unavailable_lists_out_of_stock_names() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 1);
        cart.add(ProductId::new(2), 1);
        let priced = PricedCart::build(&cart, &[product(1, 100, true), product(2, 100, false)]);
        assert_eq!(priced.unavailable(), vec!["Dish 2".to_string()]);
    }

    #[test]
    fn test_quote_uses_current_prices() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 2);
        let priced = PricedCart::build(&cart, &[product(1, 1000, true)]);
        let totals = priced
            .quote(&PricingRules::default(), OrderType::Delivery)
            .unwrap();
        assert_eq!(totals.total, Money::from_cents(2564));
    }

    #[test]
    fn test_validate_trims_and_keeps_relevant_fields() {
        let pickup = details(OrderType::Pickup).validate().unwrap();
        assert_eq!(pickup.name, "Ada Lovelace");
        assert_eq!(pickup.delivery_address, None);
        assert_eq!(pickup.table_number, None);
        assert_eq!(pickup.notes, None);

        let dine_in = details(OrderType::DineIn).validate().unwrap();
        assert_eq!(dine_in.table_number.as_deref(), Some("12"));

        let delivery = details(OrderType::Delivery).validate().unwrap();
        assert_eq!(delivery.delivery_address.as_deref(), Some("1 Analytical Way"));
    }

    #[test]
    fn test_delivery_requires_address() {
        let mut form = details(OrderType::Delivery);
        form.delivery_address = Some(" ".to_string());
        assert!(matches!(form.validate(), Err(CheckoutError::MissingAddress)));
    }

    #[test]
    fn test_dine_in_table_is_optional() {
        let mut form = details(OrderType::DineIn);
        form.table_number = None;
        assert_eq!(form.validate().unwrap().table_number, None);
    }

    #[test]
    fn test_required_contact_fields() {
        let mut form = details(OrderType::Pickup);
        form.name = String::new();
        assert!(matches!(form.validate(), Err(CheckoutError::MissingName)));

        let mut form = details(OrderType::Pickup);
        form.phone = "  ".to_string();
        assert!(matches!(form.validate(), Err(CheckoutError::MissingPhone)));

        let mut form = details(OrderType::Pickup);
        form.email = "not-an-email".to_string();
        assert!(matches!(form.validate(), Err(CheckoutError::InvalidEmail(_))));
    }

    #[test]
    fn test_repository_errors_are_not_user_errors() {
        assert!(CheckoutError::EmptyCart.is_user_error());
        assert!(!CheckoutError::Repository(RepositoryError::NotFound).is_user_error());
    }
}
