//! Type-safe price representation using decimal arithmetic.
//!
//! All amounts in a cart share the catalog's single currency. Amounts are
//! kept in the currency's standard unit (rupees, dollars) as [`Decimal`] and
//! only rounded when formatted for display.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a price.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input has no digits after stripping symbols and separators.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid price {0:?}")]
    NotANumber(String),
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self {
            amount,
            currency_code,
        })
    }

    /// Parse a price from page text such as `"₹1,299.00"` or `" 45 "`.
    ///
    /// A leading currency symbol or code, surrounding whitespace and
    /// thousands separators are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if no number remains, the number is malformed, or it
    /// is negative.
    pub fn parse(text: &str, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        let amount = parse_amount(text)?;
        Self::new(amount, currency_code)
    }

    /// Format for display (e.g., "₹19.99").
    #[must_use]
    pub fn display(&self) -> String {
        self.currency_code.format(self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol used as the price prefix.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Format an amount with this currency's symbol and two decimal places.
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        format!("{}{:.2}", self.symbol(), amount.round_dp(2))
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Strip symbols and separators from price text and parse what remains.
fn parse_amount(text: &str) -> Result<Decimal, PriceError> {
    let trimmed = text.trim();
    let start = trimmed
        .find(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        .unwrap_or(trimmed.len());
    let cleaned: String = trimmed
        .get(start..)
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(PriceError::Empty);
    }

    Decimal::from_str(&cleaned).map_err(|_| PriceError::NotANumber(text.to_string()))
}
