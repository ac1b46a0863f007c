//! Integration tests for checkout and order submission.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::http::StatusCode;
use bazaar_core::{PaymentMethod, SubmitOutcome};
use bazaar_integration_tests::{COD_FORM, RecordingSubmitter, TestApp};
use tokio::sync::Semaphore;

const EMPTY_PLACEHOLDER: &str = r#"<p class="cart-empty">Your cart is empty.</p>"#;

fn form_with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
    let mut fields: Vec<_> = COD_FORM
        .iter()
        .filter(|(key, _)| !overrides.iter().any(|(k, _)| k == key))
        .copied()
        .collect();
    fields.extend_from_slice(overrides);
    fields
}

// =============================================================================
// Accepted Orders
// =============================================================================

#[tokio::test]
async fn test_cash_on_delivery_happy_path() {
    let app = TestApp::new();
    let widget = app.open_page().await;
    app.add(widget, "A").await;
    app.add(widget, "A").await;

    let response = app.checkout(widget, COD_FORM).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Order placed! Please keep ₹200.00 ready for cash on delivery."));
    assert!(response.body.contains("status-success"));
    // Out-of-band cart re-render shows the cleared cart.
    assert!(response.body.contains(r#"hx-swap-oob="true""#));
    assert!(response.body.contains(EMPTY_PLACEHOLDER));
    // Form was reset.
    assert!(!response.body.contains("Asha Rao"));

    let orders = app.submitter.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.customer_name, "Asha Rao");
    assert_eq!(order.mobile_phone, "9876543210");
    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].quantity, 2);
    assert_eq!(order.grand_total.to_string(), "200");

    assert!(app.cart(widget).await.body.contains(EMPTY_PLACEHOLDER));
}

#[tokio::test]
async fn test_card_payment_confirmation() {
    let app = TestApp::new();
    let widget = app.open_page().await;
    app.add(widget, "B").await;

    let fields = form_with(&[
        ("payment_method", "card"),
        ("card_number", "4111 1111 1111 1111"),
        ("expiry", "12/29"),
        ("cvv", "x731"),
        ("card_holder_name", "ASHA RAO"),
    ]);
    let response = app.checkout(widget, &fields).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Payment of ₹37.50 by card ending 1111 received."));

    let json = serde_json::to_string(&app.submitter.orders()[0]).unwrap();
    assert!(!json.contains("4111 1111"));
    assert!(!json.contains("x731"));
}

#[tokio::test]
async fn test_upi_payment_confirmation() {
    let app = TestApp::new();
    let widget = app.open_page().await;
    app.add(widget, "C").await;

    let fields = form_with(&[("payment_method", "upi"), ("upi_id", "asha@okbank")]);
    let response = app.checkout(widget, &fields).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Payment request of ₹180.00 sent to asha@okbank."));
}

// =============================================================================
// Rejected Forms
// =============================================================================

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let app = TestApp::new();
    let widget = app.open_page().await;

    let response = app.checkout(widget, COD_FORM).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Your cart is empty. Add something before checking out."));
    assert!(app.submitter.orders().is_empty());
}

#[tokio::test]
async fn test_rejection_keeps_form_and_cart() {
    let app = TestApp::new();
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    let fields = form_with(&[("mobile_phone", "98765")]);
    let response = app.checkout(widget, &fields).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Please enter a valid 10-digit mobile number."));
    assert!(response.body.contains(r#"value="Asha Rao""#));
    assert!(response.body.contains(r#"value="98765""#));
    assert!(response.body.contains(r#"data-product-id="A""#));
    assert!(app.submitter.orders().is_empty());
}

#[tokio::test]
async fn test_first_failing_check_wins() {
    let app = TestApp::new();
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    // Blank name and bad phone: the name is reported.
    let fields = form_with(&[("customer_name", "   "), ("mobile_phone", "12")]);
    let response = app.checkout(widget, &fields).await;
    assert!(response.body.contains("Please enter your name."));
    assert!(!response.body.contains("10-digit"));

    let fields = form_with(&[("payment_method", "")]);
    let response = app.checkout(widget, &fields).await;
    assert!(response.body.contains("Please select a payment method."));
}

#[tokio::test]
async fn test_incomplete_card_details_do_not_echo_cvv() {
    let app = TestApp::new();
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    let fields = form_with(&[
        ("payment_method", "card"),
        ("card_number", "4111111111111111"),
        ("cvv", "x731"),
    ]);
    let response = app.checkout(widget, &fields).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Please fill in all card details."));
    assert!(response.body.contains(r#"value="4111111111111111""#));
    assert!(!response.body.contains("x731"));
}

#[tokio::test]
async fn test_invalid_upi_id() {
    let app = TestApp::new();
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    let fields = form_with(&[("payment_method", "upi"), ("upi_id", "asha.okbank")]);
    let response = app.checkout(widget, &fields).await;
    assert!(response.body.contains("Please enter a valid UPI ID"));
}

#[tokio::test]
async fn test_unknown_payment_method_is_bad_request() {
    let app = TestApp::new();
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    let fields = form_with(&[("payment_method", "barter")]);
    let response = app.checkout(widget, &fields).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Submission Outcomes
// =============================================================================

#[tokio::test]
async fn test_failed_submission_keeps_cart_and_form() {
    let app = TestApp::with_submitter(
        RecordingSubmitter::new(SubmitOutcome::Failed("connection refused".to_string())),
        &[],
    );
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    let response = app.checkout(widget, COD_FORM).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("There was an error placing your order. Please try again."));
    assert!(response.body.contains("status-error"));
    assert!(response.body.contains(r#"value="Asha Rao""#));
    assert!(app.cart(widget).await.body.contains(r#"data-product-id="A""#));

    // The customer can retry.
    let retry = app.checkout(widget, COD_FORM).await;
    assert_eq!(retry.status, StatusCode::OK);
    assert_eq!(app.submitter.orders().len(), 2);
}

#[tokio::test]
async fn test_acknowledged_delivery_clears_cart() {
    let app = TestApp::with_submitter(RecordingSubmitter::new(SubmitOutcome::Delivered), &[]);
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    let response = app.checkout(widget, COD_FORM).await;
    assert!(response.body.contains("Order placed!"));
    assert!(app.cart(widget).await.body.contains(EMPTY_PLACEHOLDER));
}

#[tokio::test]
async fn test_unknown_outcome_can_keep_cart() {
    let app = TestApp::with_submitter(
        RecordingSubmitter::new(SubmitOutcome::Unknown),
        &[("CHECKOUT_CLEAR_ON_UNKNOWN", "false")],
    );
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    let response = app.checkout(widget, COD_FORM).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("status-warning"));
    assert!(response.body.contains("could not confirm"));
    assert!(app.cart(widget).await.body.contains(r#"data-product-id="A""#));
}

#[tokio::test]
async fn test_only_one_order_in_flight() {
    let gate = Arc::new(Semaphore::new(0));
    let app = Arc::new(TestApp::with_submitter(
        RecordingSubmitter::gated(SubmitOutcome::Delivered, Arc::clone(&gate)),
        &[],
    ));
    let widget = app.open_page().await;
    app.add(widget, "A").await;

    let first = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.checkout(widget, COD_FORM).await })
    };
    app.submitter.wait_started().await;

    // A second submission while the first is pending is refused.
    let second = app.checkout(widget, COD_FORM).await;
    assert_eq!(second.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(second.body.contains("Your order is already being placed."));

    // The cart is frozen too.
    let event = app.add(widget, "B").await;
    assert_eq!(event.status, StatusCode::CONFLICT);

    gate.add_permits(1);
    let first = first.await.unwrap();
    assert_eq!(first.status, StatusCode::OK);
    assert!(first.body.contains("Order placed!"));
    assert_eq!(app.submitter.orders().len(), 1);

    // Unfrozen once the order completes.
    assert_eq!(app.add(widget, "B").await.status, StatusCode::OK);
}
