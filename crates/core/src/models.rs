//! Records shared by the storefront and admin.
//!
//! With the `postgres` feature these decode straight from query rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::OrderTotals;
use crate::types::{
    CategoryId, CustomerId, Email, Money, OrderId, OrderItemId, OrderStatus, OrderType,
    PaymentMethod, ProductId,
};

/// A menu section such as "Pasta" or "Desserts".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    /// Inactive categories and their products are hidden from the menu.
    pub active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A dish or drink on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub featured: bool,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A storefront account. The password hash never leaves the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Disabled customers cannot sign in.
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order header with its computed financials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: OrderId,
    /// `None` for guest checkouts.
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: String,
    pub delivery_address: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
    pub service_fee: Money,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The stored financials as an [`OrderTotals`].
    #[must_use]
    pub const fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            tax: self.tax,
            delivery_fee: self.delivery_fee,
            service_fee: self.service_fee,
            total: self.total,
        }
    }
}

/// A line of an order, snapshotted at checkout so later menu edits do not
/// change what the customer was charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted from the menu.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i32,
    pub line_total: Money,
}

/// One entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct StatusChange {
    pub status: OrderStatus,
    /// Admin email, `"customer"`, or `None` for system entries.
    pub changed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
