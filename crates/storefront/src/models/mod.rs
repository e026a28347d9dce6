//! Session-held state for the storefront.

pub mod cart;
pub mod session;

pub use cart::{Cart, CartLine};
pub use session::{CurrentCustomer, keys as session_keys};
