//! Integration tests for Bazaar.
//!
//! Tests drive the full storefront router in-process with
//! `tower::ServiceExt::oneshot`; no listener or network is needed. Orders go
//! to a [`RecordingSubmitter`] instead of a real webhook.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use bazaar_core::{Catalog, OrderPayload, OrderSubmitter, SubmitOutcome};
use bazaar_storefront::{config::StorefrontConfig, state::AppState};
use tokio::sync::{Notify, Semaphore};
use tower::ServiceExt;
use uuid::Uuid;

/// Catalog used by every test: three products priced in rupees.
pub const TEST_CATALOG: &str = r#"{
  "currency": "INR",
  "products": [
    { "id": "A", "name": "Alphonso Mango Box", "price": "₹100", "images": ["/static/img/a-1.svg", "/static/img/a-2.svg"] },
    { "id": "B", "name": "Mango Pickle", "price": "37.50", "images": ["/static/img/b-1.svg"] },
    { "id": "C", "name": "Aam Papad", "price": 180 }
  ]
}"#;

/// Order submitter that records every order and answers with a fixed outcome.
///
/// With a gate set, each submission waits for a permit, so tests can hold an
/// order in flight.
pub struct RecordingSubmitter {
    outcome: SubmitOutcome,
    orders: Mutex<Vec<OrderPayload>>,
    gate: Option<Arc<Semaphore>>,
    started: Notify,
}

impl RecordingSubmitter {
    #[must_use]
    pub fn new(outcome: SubmitOutcome) -> Self {
        Self {
            outcome,
            orders: Mutex::new(Vec::new()),
            gate: None,
            started: Notify::new(),
        }
    }

    /// Hold submissions until permits are added to `gate`.
    #[must_use]
    pub fn gated(outcome: SubmitOutcome, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(outcome)
        }
    }

    /// Orders received so far.
    pub fn orders(&self) -> Vec<OrderPayload> {
        self.orders.lock().unwrap().clone()
    }

    /// Wait until a submission has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl OrderSubmitter for RecordingSubmitter {
    async fn submit(&self, order: &OrderPayload) -> SubmitOutcome {
        self.orders.lock().unwrap().push(order.clone());
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        self.outcome.clone()
    }
}

/// A response with its body read to a string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// The storefront router wired to a [`RecordingSubmitter`].
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub submitter: Arc<RecordingSubmitter>,
}

impl TestApp {
    /// App whose submitter reports `Unknown` (an opaque webhook) and
    /// treats that as placed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_submitter(RecordingSubmitter::new(SubmitOutcome::Unknown), &[])
    }

    /// App with a custom submitter and extra environment variables.
    #[must_use]
    pub fn with_submitter(submitter: RecordingSubmitter, vars: &[(&str, &str)]) -> Self {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let catalog = Catalog::from_json(TEST_CATALOG).unwrap();

        let submitter = Arc::new(submitter);
        let state = AppState::new(config, catalog, Arc::clone(&submitter) as Arc<dyn OrderSubmitter>);

        Self {
            router: bazaar_storefront::app(state.clone()),
            state,
            submitter,
        }
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Send a form-encoded POST request.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("hx-request", "true")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// Load the storefront page and return the id of its new cart widget.
    pub async fn open_page(&self) -> Uuid {
        let page = self.get("/").await;
        assert_eq!(page.status, StatusCode::OK);
        widget_id_in(&page.body)
    }

    /// Post a cart event for `widget`.
    pub async fn event(&self, widget: Uuid, fields: &[(&str, &str)]) -> TestResponse {
        self.post_form(&format!("/widget/{widget}/events"), fields).await
    }

    /// Add `product_id` to the cart once.
    pub async fn add(&self, widget: Uuid, product_id: &str) -> TestResponse {
        self.event(widget, &[("action", "add"), ("product_id", product_id)])
            .await
    }

    /// Submit the checkout form for `widget`.
    pub async fn checkout(&self, widget: Uuid, fields: &[(&str, &str)]) -> TestResponse {
        self.post_form(&format!("/widget/{widget}/checkout"), fields)
            .await
    }

    /// Current cart fragment for `widget`.
    pub async fn cart(&self, widget: Uuid) -> TestResponse {
        self.get(&format!("/widget/{widget}/cart")).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete cash-on-delivery checkout form.
pub const COD_FORM: &[(&str, &str)] = &[
    ("customer_name", "Asha Rao"),
    ("address", "12 MG Road, Pune"),
    ("mobile_phone", "9876543210"),
    ("payment_method", "cashOnDelivery"),
];

/// Extract the first widget id referenced in a page.
#[must_use]
pub fn widget_id_in(html: &str) -> Uuid {
    let start = html.find("/widget/").unwrap() + "/widget/".len();
    let id = html.get(start..start + 36).unwrap();
    Uuid::parse_str(id).unwrap()
}
