//! Order payload and the outbound submission boundary.
//!
//! The receiving end is a third-party webhook that may not tell us whether it
//! accepted the order. [`SubmitOutcome`] makes that explicit so the caller
//! decides, as policy, what to do with the cart when delivery is unknown.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartLine, CartSnapshot};
use crate::checkout::AcceptedCheckout;
use crate::types::{CurrencyCode, PaymentMethod, ProductId};

/// One line of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id().clone(),
            name: line.name().to_string(),
            unit_price: line.unit_price(),
            quantity: line.quantity(),
        }
    }
}

/// JSON body sent to the order webhook.
///
/// Card and UPI details are deliberately absent; only the method is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub customer_name: String,
    pub address: String,
    pub mobile_phone: String,
    pub lines: Vec<OrderLine>,
    pub grand_total: Decimal,
    pub currency: CurrencyCode,
    pub payment_method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
}

impl OrderPayload {
    /// Build the payload for an accepted checkout of `cart`.
    #[must_use]
    pub fn from_checkout(
        checkout: &AcceptedCheckout,
        cart: &CartSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_name: checkout.customer_name.clone(),
            address: checkout.address.clone(),
            mobile_phone: checkout.mobile_phone.as_str().to_string(),
            lines: cart.lines().iter().map(OrderLine::from).collect(),
            grand_total: cart.grand_total(),
            currency: cart.currency(),
            payment_method: checkout.payment_method,
            timestamp,
        }
    }

    /// Sum of quantities in the order.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// What is known about an order after handing it to the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The receiver acknowledged the order.
    Delivered,
    /// The request never completed (network error, timeout, or an explicit
    /// rejection from an acknowledging receiver).
    Failed(String),
    /// The request completed but the receiver's verdict is not visible.
    Unknown,
}

/// Outbound channel for placed orders.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Send an order. Never panics; every failure is reported as an outcome.
    async fn submit(&self, order: &OrderPayload) -> SubmitOutcome;
}
