//! Checkout form validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. cart not empty
//! 2. name, address and mobile number present (after trimming)
//! 3. mobile number is exactly ten digits
//! 4. a payment method is selected
//! 5. the selected method's own fields are complete
//!
//! Validation reads the cart and form and never changes either.

use std::fmt;

use crate::cart::CartSnapshot;
use crate::types::{MobilePhone, PaymentMethod};

/// A required contact field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutField {
    CustomerName,
    Address,
    MobilePhone,
}

impl fmt::Display for CheckoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CustomerName => "name",
            Self::Address => "delivery address",
            Self::MobilePhone => "mobile number",
        })
    }
}

/// Why a checkout attempt was refused.
///
/// The display strings are shown to the customer as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Your cart is empty. Add something before checking out.")]
    EmptyCart,

    #[error("Please enter your {0}.")]
    MissingField(CheckoutField),

    #[error("Please enter a valid 10-digit mobile number.")]
    InvalidPhone,

    #[error("Please select a payment method.")]
    NoPaymentMethod,

    #[error("Please fill in all card details.")]
    IncompleteCardDetails,

    #[error("Please enter a valid UPI ID (for example name@bank).")]
    InvalidUpiId,

    /// An earlier order from this page is still being sent.
    #[error("Your order is already being placed. Please wait.")]
    AlreadySubmitting,
}

/// Extra fields required by card and UPI payments.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PaymentFields {
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
    pub card_holder_name: String,
    pub upi_id: String,
}

impl fmt::Debug for PaymentFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentFields")
            .field("card_number", &"[REDACTED]")
            .field("expiry", &"[REDACTED]")
            .field("cvv", &"[REDACTED]")
            .field("card_holder_name", &self.card_holder_name)
            .field("upi_id", &self.upi_id)
            .finish()
    }
}

/// What the customer typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub address: String,
    pub mobile_phone: String,
    pub payment_method: Option<PaymentMethod>,
    pub payment_fields: PaymentFields,
}

/// A form that passed validation, with trimmed contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedCheckout {
    pub customer_name: String,
    pub address: String,
    pub mobile_phone: MobilePhone,
    pub payment_method: PaymentMethod,
    /// Message shown to the customer once the order is placed.
    pub confirmation: String,
}

/// Validator state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    Idle,
    Validating,
    Accepted,
    Rejected(CheckoutError),
}

/// Checkout validator that records the outcome of its last run.
#[derive(Debug, Clone, Default)]
pub struct CheckoutValidator {
    state: CheckoutState,
}

impl CheckoutValidator {
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Run the checks and move to `Accepted` or `Rejected`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check; see [`validate`].
    pub fn validate(
        &mut self,
        cart: &CartSnapshot,
        form: &CheckoutForm,
    ) -> Result<AcceptedCheckout, CheckoutError> {
        self.state = CheckoutState::Validating;
        let result = validate(cart, form);
        self.state = match &result {
            Ok(_) => CheckoutState::Accepted,
            Err(err) => CheckoutState::Rejected(err.clone()),
        };
        result
    }

    /// Return to `Idle`, e.g. after the form has been reset.
    pub fn reset(&mut self) {
        self.state = CheckoutState::Idle;
    }
}

/// Validate a checkout attempt against the current cart.
///
/// # Errors
///
/// Returns the first failing check, in this order: [`CheckoutError::EmptyCart`],
/// [`CheckoutError::MissingField`], [`CheckoutError::InvalidPhone`],
/// [`CheckoutError::NoPaymentMethod`], then [`CheckoutError::IncompleteCardDetails`]
/// or [`CheckoutError::InvalidUpiId`] depending on the method.
pub fn validate(
    cart: &CartSnapshot,
    form: &CheckoutForm,
) -> Result<AcceptedCheckout, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let customer_name = required(&form.customer_name, CheckoutField::CustomerName)?;
    let address = required(&form.address, CheckoutField::Address)?;
    let mobile_phone = required(&form.mobile_phone, CheckoutField::MobilePhone)?;
    let mobile_phone = MobilePhone::parse(mobile_phone).map_err(|_| CheckoutError::InvalidPhone)?;

    let payment_method = form.payment_method.ok_or(CheckoutError::NoPaymentMethod)?;
    let fields = &form.payment_fields;
    let total = cart.currency().format(cart.grand_total());

    let confirmation = match payment_method {
        PaymentMethod::CashOnDelivery => {
            format!("Order placed! Please keep {total} ready for cash on delivery.")
        }
        PaymentMethod::Card => {
            let complete = [
                &fields.card_number,
                &fields.expiry,
                &fields.cvv,
                &fields.card_holder_name,
            ]
            .iter()
            .all(|value| !value.trim().is_empty());
            if !complete {
                return Err(CheckoutError::IncompleteCardDetails);
            }
            format!(
                "Payment of {total} by card ending {} received. Your order is on its way!",
                last_four_digits(&fields.card_number)
            )
        }
        PaymentMethod::Upi => {
            let upi_id = fields.upi_id.trim();
            if upi_id.is_empty() || !upi_id.contains('@') {
                return Err(CheckoutError::InvalidUpiId);
            }
            format!("Payment request of {total} sent to {upi_id}. Your order is on its way!")
        }
    };

    Ok(AcceptedCheckout {
        customer_name: customer_name.to_string(),
        address: address.to_string(),
        mobile_phone,
        payment_method,
        confirmation,
    })
}

fn required(value: &str, field: CheckoutField) -> Result<&str, CheckoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CheckoutError::MissingField(field));
    }
    Ok(trimmed)
}

fn last_four_digits(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(char::is_ascii_digit).collect();
    let start = digits.len().saturating_sub(4);
    digits.get(start..).unwrap_or_default().iter().collect()
}
