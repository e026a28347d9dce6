//! Business logic services.

pub mod auth;
pub mod checkout;
pub mod menu;
pub mod orders;

pub use auth::{AuthError, AuthService, Registration};
pub use checkout::{CheckoutDetails, CheckoutError, CheckoutService, PricedCart};
pub use menu::{MenuFilter, MenuSection, MenuService};
pub use orders::{OrderDetail, OrderError, OrderService};
