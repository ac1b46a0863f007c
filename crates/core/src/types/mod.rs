//! Core value types for Bazaar.
//!
//! This module provides type-safe wrappers for ids, prices, phone numbers and
//! payment methods.

pub mod id;
pub mod payment;
pub mod phone;
pub mod price;

pub use id::{ProductId, ProductIdError};
pub use payment::PaymentMethod;
pub use phone::{MobilePhone, PhoneError};
pub use price::{CurrencyCode, Price, PriceError};
