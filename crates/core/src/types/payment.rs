//! Payment method selection.

use serde::{Deserialize, Serialize};

/// How the customer intends to pay.
///
/// Serialized in the order payload as `cashOnDelivery`, `card` or `upi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    /// Pay the courier on delivery. Needs no extra fields.
    CashOnDelivery,
    /// Card payment. Needs number, expiry, CVV and holder name.
    Card,
    /// UPI transfer. Needs a `name@bank` style id.
    Upi,
}

impl PaymentMethod {
    /// All methods in the order they are offered on the page.
    pub const ALL: [Self; 3] = [Self::CashOnDelivery, Self::Card, Self::Upi];

    /// Wire and form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cashOnDelivery",
            Self::Card => "card",
            Self::Upi => "upi",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on Delivery",
            Self::Card => "Credit / Debit Card",
            Self::Upi => "UPI",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cashOnDelivery" | "cash_on_delivery" | "cod" => Ok(Self::CashOnDelivery),
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}
