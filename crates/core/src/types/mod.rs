//! Core domain types for Trattoria.
//!
//! Type-safe wrappers for IDs, emails, money, and the status enums.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
