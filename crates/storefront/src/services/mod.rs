//! Outbound services for the storefront.
//!
//! # Services
//!
//! - `webhook` - Order delivery to a configured HTTP endpoint
//! - [`LoggingSubmitter`] - Fallback when no endpoint is configured

pub mod webhook;

use async_trait::async_trait;
use bazaar_core::{OrderPayload, OrderSubmitter, SubmitOutcome};

pub use webhook::{WebhookError, WebhookSubmitter};

/// Submitter that only logs orders.
///
/// Used for local development. Nothing confirms the order, so the outcome
/// is always [`SubmitOutcome::Unknown`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSubmitter;

#[async_trait]
impl OrderSubmitter for LoggingSubmitter {
    async fn submit(&self, order: &OrderPayload) -> SubmitOutcome {
        tracing::info!(
            customer = %order.customer_name,
            items = order.item_count(),
            total = %order.grand_total,
            currency = %order.currency,
            payment_method = %order.payment_method,
            "Order received (no webhook configured)"
        );
        SubmitOutcome::Unknown
    }
}
