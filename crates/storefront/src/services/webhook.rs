//! Order webhook client.
//!
//! Posts the order payload as JSON to a configured URL. Typical receivers
//! are spreadsheet or form-automation endpoints that either never report a
//! verdict ([`WebhookMode::Opaque`]) or answer 2xx for accepted orders
//! ([`WebhookMode::Acknowledged`]).

use async_trait::async_trait;
use bazaar_core::{OrderPayload, OrderSubmitter, SubmitOutcome};
use thiserror::Error;
use tracing::instrument;

use crate::config::{WebhookConfig, WebhookMode, webhook_url};

/// Errors that can occur when creating the webhook client.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Order submitter backed by an HTTP webhook.
#[derive(Clone)]
pub struct WebhookSubmitter {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookSubmitter {
    /// Create a new webhook submitter.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("bazaar-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Response handling mode.
    #[must_use]
    pub const fn mode(&self) -> WebhookMode {
        self.config.mode
    }
}

#[async_trait]
impl OrderSubmitter for WebhookSubmitter {
    #[instrument(
        skip(self, order),
        fields(mode = ?self.config.mode, lines = order.lines.len(), total = %order.grand_total)
    )]
    async fn submit(&self, order: &OrderPayload) -> SubmitOutcome {
        let result = self
            .client
            .post(webhook_url(&self.config))
            .json(order)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                // The URL carries the deployment key; keep it out of logs.
                let e = e.without_url();
                tracing::warn!(error = %e, "Order webhook request failed");
                return SubmitOutcome::Failed(e.to_string());
            }
        };

        let status = response.status();
        match self.config.mode {
            WebhookMode::Opaque => {
                tracing::info!(status = status.as_u16(), "Order sent to webhook");
                SubmitOutcome::Unknown
            }
            WebhookMode::Acknowledged if status.is_success() => {
                tracing::info!(status = status.as_u16(), "Order acknowledged by webhook");
                SubmitOutcome::Delivered
            }
            WebhookMode::Acknowledged => {
                tracing::warn!(status = status.as_u16(), "Order rejected by webhook");
                SubmitOutcome::Failed(format!("webhook returned {status}"))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use bazaar_core::{CurrencyCode, OrderLine, PaymentMethod, ProductId};
    use chrono::Utc;
    use secrecy::SecretString;

    use super::*;

    fn order() -> OrderPayload {
        OrderPayload {
            customer_name: "Asha Rao".to_string(),
            address: "12 MG Road, Pune".to_string(),
            mobile_phone: "9876543210".to_string(),
            lines: vec![OrderLine {
                product_id: ProductId::parse("alphonso-box").unwrap(),
                name: "Alphonso Mango Box".to_string(),
                unit_price: "100".parse().unwrap(),
                quantity: 2,
            }],
            grand_total: "200".parse().unwrap(),
            currency: CurrencyCode::INR,
            payment_method: PaymentMethod::CashOnDelivery,
            timestamp: Utc::now(),
        }
    }

    fn submitter(url: String, mode: WebhookMode) -> WebhookSubmitter {
        WebhookSubmitter::new(WebhookConfig {
            url: SecretString::from(url),
            mode,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    /// Spawn a receiver that records bodies and answers with `status`.
    async fn spawn_receiver(status: StatusCode) -> (String, Arc<Mutex<Vec<serde_json::Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/orders",
                post(
                    move |State(received): State<Arc<Mutex<Vec<serde_json::Value>>>>,
                          Json(body): Json<serde_json::Value>| async move {
                        received.lock().unwrap().push(body);
                        status
                    },
                ),
            )
            .with_state(Arc::clone(&received));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/orders"), received)
    }

    #[tokio::test]
    async fn test_opaque_mode_reports_unknown() {
        let (url, received) = spawn_receiver(StatusCode::OK).await;
        let outcome = submitter(url, WebhookMode::Opaque).submit(&order()).await;

        assert_eq!(outcome, SubmitOutcome::Unknown);
        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["customerName"], "Asha Rao");
        assert_eq!(bodies[0]["grandTotal"], "200");
    }

    #[tokio::test]
    async fn test_opaque_mode_ignores_error_status() {
        let (url, _) = spawn_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
        let outcome = submitter(url, WebhookMode::Opaque).submit(&order()).await;
        assert_eq!(outcome, SubmitOutcome::Unknown);
    }

    #[tokio::test]
    async fn test_acknowledged_mode() {
        let (url, _) = spawn_receiver(StatusCode::CREATED).await;
        let outcome = submitter(url, WebhookMode::Acknowledged).submit(&order()).await;
        assert_eq!(outcome, SubmitOutcome::Delivered);

        let (url, _) = spawn_receiver(StatusCode::BAD_REQUEST).await;
        let outcome = submitter(url, WebhookMode::Acknowledged).submit(&order()).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(msg) if msg.contains("400")));
    }

    #[tokio::test]
    async fn test_unreachable_webhook_fails() {
        let outcome = submitter(
            "http://127.0.0.1:9/orders?key=secret-key".to_string(),
            WebhookMode::Opaque,
        )
        .submit(&order())
        .await;

        match outcome {
            SubmitOutcome::Failed(msg) => assert!(!msg.contains("secret-key")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
