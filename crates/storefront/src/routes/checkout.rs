//! Checkout route handler.
//!
//! Validation happens under the widget lock. The order is then sent from a
//! spawned task so that a client disconnecting mid-request cannot leave the
//! widget stuck in its in-flight state.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bazaar_core::{
    CartView, CartWidget, CheckoutForm, CheckoutResult, PaymentFields, PaymentMethod,
    SubmitOutcome,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{Instrument, instrument};
use uuid::Uuid;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::cart::load_widget;
use crate::state::AppState;

/// One payment method radio button.
#[derive(Debug, Clone)]
pub struct PaymentOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// Values shown in the checkout form.
///
/// The CVV is never echoed back into the page.
#[derive(Debug, Clone, Default)]
pub struct CheckoutFormView {
    pub customer_name: String,
    pub address: String,
    pub mobile_phone: String,
    pub payment_options: Vec<PaymentOptionView>,
    pub card_number: String,
    pub expiry: String,
    pub card_holder_name: String,
    pub upi_id: String,
}

impl CheckoutFormView {
    /// Build the view of a retained form, or a blank one.
    #[must_use]
    pub fn new(form: Option<&CheckoutForm>) -> Self {
        let selected = form.and_then(|f| f.payment_method);
        let payment_options = PaymentMethod::ALL
            .iter()
            .map(|&method| PaymentOptionView {
                value: method.as_str(),
                label: method.label(),
                checked: selected == Some(method),
            })
            .collect();

        let Some(form) = form else {
            return Self {
                payment_options,
                ..Self::default()
            };
        };

        Self {
            customer_name: form.customer_name.clone(),
            address: form.address.clone(),
            mobile_phone: form.mobile_phone.clone(),
            payment_options,
            card_number: form.payment_fields.card_number.clone(),
            expiry: form.payment_fields.expiry.clone(),
            card_holder_name: form.payment_fields.card_holder_name.clone(),
            upi_id: form.payment_fields.upi_id.clone(),
        }
    }
}

/// Status line above the checkout button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    /// CSS modifier: `success`, `warning` or `error`.
    pub kind: &'static str,
    pub message: String,
}

impl StatusView {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error",
            message: message.into(),
        }
    }
}

impl From<&CheckoutResult> for StatusView {
    fn from(result: &CheckoutResult) -> Self {
        let kind = match result {
            CheckoutResult::Confirmed { .. } => "success",
            CheckoutResult::Unconfirmed { .. } => "warning",
            CheckoutResult::Failed { .. } => "error",
        };
        Self {
            kind,
            message: result.message().to_string(),
        }
    }
}

/// Checkout fragment: the form with its status, plus an out-of-band cart.
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout.html")]
pub struct CheckoutTemplate {
    pub widget_id: Uuid,
    pub checkout: CheckoutFormView,
    pub status: Option<StatusView>,
    pub cart: CartView,
    pub cart_oob: bool,
}

impl CheckoutTemplate {
    fn new(widget_id: Uuid, widget: &CartWidget, status: Option<StatusView>) -> Self {
        Self {
            widget_id,
            checkout: CheckoutFormView::new(widget.form()),
            status,
            cart: widget.view(),
            cart_oob: true,
        }
    }
}

/// Checkout form data.
///
/// Deliberately not `Debug`: it carries card details.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CheckoutFormInput {
    pub customer_name: String,
    pub address: String,
    pub mobile_phone: String,
    pub payment_method: Option<String>,
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
    pub card_holder_name: String,
    pub upi_id: String,
}

impl TryFrom<CheckoutFormInput> for CheckoutForm {
    type Error = AppError;

    fn try_from(input: CheckoutFormInput) -> std::result::Result<Self, Self::Error> {
        let payment_method = match input.payment_method.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(
                value
                    .parse::<PaymentMethod>()
                    .map_err(AppError::BadRequest)?,
            ),
        };

        Ok(Self {
            customer_name: input.customer_name,
            address: input.address,
            mobile_phone: input.mobile_phone,
            payment_method,
            payment_fields: PaymentFields {
                card_number: input.card_number,
                expiry: input.expiry,
                cvv: input.cvv,
                card_holder_name: input.card_holder_name,
                upi_id: input.upi_id,
            },
        })
    }
}

/// Submit the checkout form (HTMX).
///
/// Rejected forms come back with 422 and the first validation message; the
/// page is configured to swap that status in. Orders that were sent always
/// answer 200 with the outcome message.
#[instrument(skip(state, input))]
pub async fn submit(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
    Form(input): Form<CheckoutFormInput>,
) -> Result<Response> {
    let form = CheckoutForm::try_from(input)?;
    let widget = load_widget(&state, widget_id).await?;

    let pending = {
        let mut guard = widget.lock().await;
        match guard.begin_checkout(form, Utc::now()) {
            Ok(pending) => pending,
            Err(err) => {
                tracing::info!(reason = %err, "Checkout rejected");
                let status = StatusView::error(err.to_string());
                let template = CheckoutTemplate::new(widget_id, &guard, Some(status));
                return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
            }
        }
    };

    let items = pending.payload().item_count().to_string();
    add_breadcrumb(
        "checkout",
        "Order submitted",
        Some(&[
            ("items", items.as_str()),
            ("payment_method", pending.payload().payment_method.as_str()),
        ]),
    );

    let submitter = state.submitter();
    let task_widget = Arc::clone(&widget);
    let template = tokio::spawn(async move {
        let outcome = submitter.submit(pending.payload()).await;
        match &outcome {
            SubmitOutcome::Delivered => tracing::info!("Order delivered"),
            SubmitOutcome::Unknown => tracing::info!("Order sent, delivery unconfirmed"),
            SubmitOutcome::Failed(reason) => tracing::warn!(%reason, "Order submission failed"),
        }

        let mut guard = task_widget.lock().await;
        let result = guard.complete_checkout(pending, &outcome);
        CheckoutTemplate::new(widget_id, &guard, Some(StatusView::from(&result)))
    }
    .in_current_span())
    .await
    .map_err(|e| AppError::Internal(format!("order submission task failed: {e}")))?;

    Ok(template.into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(method: Option<&str>) -> CheckoutFormInput {
        CheckoutFormInput {
            customer_name: "Asha Rao".to_string(),
            address: "12 MG Road".to_string(),
            mobile_phone: "9876543210".to_string(),
            payment_method: method.map(String::from),
            cvv: "123".to_string(),
            ..CheckoutFormInput::default()
        }
    }

    #[test]
    fn test_payment_method_parsing() {
        let form = CheckoutForm::try_from(input(Some("upi"))).unwrap();
        assert_eq!(form.payment_method, Some(PaymentMethod::Upi));

        let form = CheckoutForm::try_from(input(Some(""))).unwrap();
        assert_eq!(form.payment_method, None);

        let form = CheckoutForm::try_from(input(None)).unwrap();
        assert_eq!(form.payment_method, None);

        assert!(CheckoutForm::try_from(input(Some("bitcoin"))).is_err());
    }

    #[test]
    fn test_form_view_hides_cvv() {
        let form = CheckoutForm::try_from(input(Some("card"))).unwrap();
        let view = CheckoutFormView::new(Some(&form));

        assert_eq!(view.customer_name, "Asha Rao");
        let checked: Vec<_> = view
            .payment_options
            .iter()
            .filter(|o| o.checked)
            .map(|o| o.value)
            .collect();
        assert_eq!(checked, vec!["card"]);
        assert!(!format!("{view:?}").contains("123"));
    }

    #[test]
    fn test_blank_form_view() {
        let view = CheckoutFormView::new(None);
        assert!(view.customer_name.is_empty());
        assert_eq!(view.payment_options.len(), PaymentMethod::ALL.len());
        assert!(view.payment_options.iter().all(|o| !o.checked));
    }

    #[test]
    fn test_status_from_result() {
        let status = StatusView::from(&CheckoutResult::Failed {
            message: "nope".to_string(),
        });
        assert_eq!(status.kind, "error");
        assert_eq!(status.message, "nope");
    }
}
