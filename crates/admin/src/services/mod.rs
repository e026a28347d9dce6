//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password authentication and admin account management
//! - `media` - Product image storage
//! - `orders` - Order lifecycle changes with optimistic concurrency
//! - `products` - Product writes that keep stored images in step

pub mod auth;
pub mod media;
pub mod orders;
pub mod products;

pub use auth::{AdminAuthError, AdminAuthService};
pub use media::{LocalMediaStore, MediaError, MediaStore};
pub use orders::{OrderDetail, OrderError, OrderService};
pub use products::{ImageChange, ProductError, ProductService};
