//! Bazaar Core - cart, checkout and order types.
//!
//! This crate holds everything the storefront widget decides on its own:
//! - [`catalog`] - read-only product list the cart draws names and prices from
//! - [`cart`] - the cart store (add, set quantity, remove, clear, totals)
//! - [`render`] - pure projection of a cart into display strings
//! - [`checkout`] - checkout form validation
//! - [`order`] - order payload and the [`OrderSubmitter`] boundary
//! - [`widget`] - one page's cart and checkout state, sequencing events,
//!   renders and submissions
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no clocks. The storefront binary supplies those.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod render;
pub mod types;
pub mod widget;

pub use cart::{Cart, CartError, CartLine, CartSnapshot};
pub use catalog::{Catalog, CatalogError, CatalogProduct};
pub use checkout::{
    AcceptedCheckout, CheckoutError, CheckoutField, CheckoutForm, CheckoutState,
    CheckoutValidator, PaymentFields,
};
pub use order::{OrderLine, OrderPayload, OrderSubmitter, SubmitOutcome};
pub use render::{CartRowView, CartView, render};
pub use types::*;
pub use widget::{
    CartEvent, CartWidget, CheckoutPolicy, CheckoutResult, PendingOrder, WidgetError,
};
