//! Per-page cart widget.
//!
//! A [`CartWidget`] owns one page's [`Cart`] and checkout form. Every cart
//! interaction enters through [`CartWidget::dispatch`], which applies the
//! mutation and returns the render of the resulting state, so a view can
//! never observe an interleaved or stale cart.
//!
//! Checkout is split around the outbound call:
//!
//! ```text
//! begin_checkout ──► (caller sends PendingOrder::payload) ──► complete_checkout
//!      │                                                            │
//!      └─ validates, sets in-flight flag               clears flag, applies policy
//! ```
//!
//! While an order is in flight a second checkout is refused and the cart is
//! frozen, so at most one order per widget is ever outstanding.

use chrono::{DateTime, Utc};

use crate::cart::{Cart, CartError, CartSnapshot};
use crate::catalog::Catalog;
use crate::checkout::{CheckoutError, CheckoutForm, CheckoutState, CheckoutValidator};
use crate::order::{OrderPayload, SubmitOutcome};
use crate::render::{CartView, render};
use crate::types::{CurrencyCode, ProductId};

/// Message shown when the order could not be sent.
pub const ORDER_FAILED_MESSAGE: &str = "There was an error placing your order. Please try again.";

/// Message shown when the order was sent but the policy does not treat an
/// unacknowledged delivery as success.
pub const ORDER_UNCONFIRMED_MESSAGE: &str =
    "We sent your order but could not confirm it was received. Please contact us before ordering again.";

/// A user interaction with the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    Add {
        product_id: ProductId,
        quantity: i64,
        /// Carousel position of the image shown when the product was added.
        active_image: Option<usize>,
    },
    SetQuantity {
        product_id: ProductId,
        quantity: i64,
    },
    Remove {
        product_id: ProductId,
    },
    Clear,
}

/// Errors from [`CartWidget::dispatch`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// The product is not in the catalog.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// The cart is frozen while an order is being submitted.
    #[error("an order is being placed; the cart cannot change until it completes")]
    CheckoutInProgress,

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// What to do with the cart after the submitter reports an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutPolicy {
    /// Treat [`SubmitOutcome::Unknown`] like a delivered order.
    ///
    /// An opaque webhook never acknowledges, so with this off every order
    /// would stay in the cart.
    pub clear_on_unknown: bool,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            clear_on_unknown: true,
        }
    }
}

/// An accepted order waiting for the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    payload: OrderPayload,
    confirmation: String,
}

impl PendingOrder {
    #[must_use]
    pub const fn payload(&self) -> &OrderPayload {
        &self.payload
    }

    #[must_use]
    pub fn confirmation(&self) -> &str {
        &self.confirmation
    }
}

/// Result of a completed checkout, ready to show to the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutResult {
    /// Cart cleared and form reset.
    Confirmed { message: String },
    /// Sent, but not treated as placed. Cart and form kept.
    Unconfirmed { message: String },
    /// Not sent. Cart and form kept.
    Failed { message: String },
}

impl CheckoutResult {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Confirmed { message }
            | Self::Unconfirmed { message }
            | Self::Failed { message } => message,
        }
    }

    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Cart and checkout state of one page load.
#[derive(Debug, Clone)]
pub struct CartWidget {
    cart: Cart,
    validator: CheckoutValidator,
    form: Option<CheckoutForm>,
    submitting: bool,
    policy: CheckoutPolicy,
}

impl Default for CartWidget {
    fn default() -> Self {
        Self::new(CurrencyCode::default(), CheckoutPolicy::default())
    }
}

impl CartWidget {
    /// Create a widget with an empty cart.
    #[must_use]
    pub fn new(currency: CurrencyCode, policy: CheckoutPolicy) -> Self {
        Self {
            cart: Cart::new(currency),
            validator: CheckoutValidator::default(),
            form: None,
            submitting: false,
            policy,
        }
    }

    /// Apply a cart event and return the render of the new state.
    ///
    /// Setting the quantity of a product that is no longer in the cart is
    /// not an error; the current state is simply re-rendered.
    ///
    /// # Errors
    ///
    /// - [`WidgetError::CheckoutInProgress`] while an order is in flight
    /// - [`WidgetError::UnknownProduct`] when adding a product missing from `catalog`
    /// - [`WidgetError::Cart`] for invalid or overflowing quantities
    pub fn dispatch(
        &mut self,
        catalog: &Catalog,
        event: CartEvent,
    ) -> Result<CartView, WidgetError> {
        if self.submitting {
            return Err(WidgetError::CheckoutInProgress);
        }

        match event {
            CartEvent::Add {
                product_id,
                quantity,
                active_image,
            } => {
                let product = catalog
                    .get(&product_id)
                    .ok_or(WidgetError::UnknownProduct(product_id))?;
                self.cart.add_product(product, quantity, active_image)?;
            }
            CartEvent::SetQuantity {
                product_id,
                quantity,
            } => match self.cart.set_quantity(&product_id, quantity) {
                Ok(()) | Err(CartError::NotFound(_)) => {}
                Err(err) => return Err(err.into()),
            },
            CartEvent::Remove { product_id } => {
                self.cart.remove_item(&product_id);
            }
            CartEvent::Clear => self.cart.clear(),
        }

        Ok(self.view())
    }

    /// Validate `form` against the cart and, if accepted, mark an order as
    /// in flight.
    ///
    /// The form is kept either way so a rejected attempt can be corrected.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::AlreadySubmitting`] if an order is already in flight,
    /// otherwise the first failing validation check.
    pub fn begin_checkout(
        &mut self,
        form: CheckoutForm,
        now: DateTime<Utc>,
    ) -> Result<PendingOrder, CheckoutError> {
        if self.submitting {
            return Err(CheckoutError::AlreadySubmitting);
        }

        let snapshot = self.cart.snapshot();
        let result = self.validator.validate(&snapshot, &form);
        self.form = Some(form);
        let accepted = result?;

        self.submitting = true;
        Ok(PendingOrder {
            payload: OrderPayload::from_checkout(&accepted, &snapshot, now),
            confirmation: accepted.confirmation,
        })
    }

    /// Record the submitter's outcome for `pending`.
    ///
    /// A delivered order always clears the cart and resets the form. An
    /// unknown outcome does so only when [`CheckoutPolicy::clear_on_unknown`]
    /// is set. A failed order leaves everything in place.
    pub fn complete_checkout(
        &mut self,
        pending: PendingOrder,
        outcome: &SubmitOutcome,
    ) -> CheckoutResult {
        self.submitting = false;

        let placed = match outcome {
            SubmitOutcome::Delivered => true,
            SubmitOutcome::Unknown => self.policy.clear_on_unknown,
            SubmitOutcome::Failed(_) => false,
        };

        if placed {
            self.cart.clear();
            self.form = None;
            self.validator.reset();
            return CheckoutResult::Confirmed {
                message: pending.confirmation,
            };
        }

        match outcome {
            SubmitOutcome::Failed(_) => CheckoutResult::Failed {
                message: ORDER_FAILED_MESSAGE.to_string(),
            },
            SubmitOutcome::Delivered | SubmitOutcome::Unknown => CheckoutResult::Unconfirmed {
                message: ORDER_UNCONFIRMED_MESSAGE.to_string(),
            },
        }
    }

    /// Render the current cart.
    #[must_use]
    pub fn view(&self) -> CartView {
        render(&self.cart.snapshot())
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.cart.snapshot()
    }

    /// The last submitted form, if it has not been reset.
    #[must_use]
    pub const fn form(&self) -> Option<&CheckoutForm> {
        self.form.as_ref()
    }

    /// Whether an order is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub const fn checkout_state(&self) -> &CheckoutState {
        self.validator.state()
    }

    #[must_use]
    pub const fn policy(&self) -> CheckoutPolicy {
        self.policy
    }
}
