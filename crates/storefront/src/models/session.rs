//! Session-related types.
//!
//! Types stored in the session for authentication and guest tracking.

use serde::{Deserialize, Serialize};

use trattoria_core::{Customer, CustomerId, Email};

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the signed-in customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentCustomer {
    /// Customer's database ID.
    pub id: CustomerId,
    /// Customer's email address.
    pub email: Email,
    /// Customer's display name.
    pub name: String,
}

impl From<&Customer> for CurrentCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email.clone(),
            name: customer.name.clone(),
        }
    }
}

/// Session keys for storefront data.
pub mod keys {
    /// Key for storing the current signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the cart lines.
    pub const CART: &str = "cart";

    /// Key for orders placed in this session, so guests can track them.
    pub const GUEST_ORDERS: &str = "guest_orders";
}
