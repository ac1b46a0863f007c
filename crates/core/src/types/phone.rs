//! Mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobilePhone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is blank.
    #[error("mobile number cannot be empty")]
    Empty,
    /// The input is not exactly ten digits.
    #[error("mobile number must be exactly {expected} digits")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
    },
    /// The input contains something other than ASCII digits.
    #[error("mobile number must contain only digits")]
    NonDigit,
}

/// A ten-digit mobile phone number.
///
/// Surrounding whitespace is trimmed; nothing else is normalized, so
/// `"98765 43210"` and `"+919876543210"` are rejected.
///
/// ## Examples
///
/// ```
/// use bazaar_core::MobilePhone;
///
/// assert!(MobilePhone::parse("9876543210").is_ok());
/// assert!(MobilePhone::parse(" 9876543210 ").is_ok());
///
/// assert!(MobilePhone::parse("12345").is_err());
/// assert!(MobilePhone::parse("98765-4321").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MobilePhone(String);

impl MobilePhone {
    /// Number of digits in a mobile number.
    pub const DIGITS: usize = 10;

    /// Parse a `MobilePhone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, contains a non-digit
    /// character, or is not exactly [`Self::DIGITS`] long.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        if s.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength {
                expected: Self::DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `MobilePhone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MobilePhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MobilePhone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
