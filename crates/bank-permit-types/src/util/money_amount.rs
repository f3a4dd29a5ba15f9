//! Human-readable token amount parsing.
//!
//! This module provides [`MoneyAmount`], a type for parsing human-readable
//! amount strings into an exact digit string plus scale, suitable for conversion to
//! on-chain token amounts of any `uint256` size.
//!
//! # Supported Formats
//!
//! - Plain numbers: `"100"`, `"0.01"`, `".5"`
//! - With thousand separators: `"1,000"`, `"1,000,000.50"`
//!
//! Anything else (exponents, currency symbols, stray letters, signs) is rejected instead of
//! being stripped, so a typo never turns into a different deposit amount.
//!
//! # Example
//!
//! ```rust
//! use bank_permit_types::util::money_amount::MoneyAmount;
//!
//! let amount = MoneyAmount::parse("1,010.50").unwrap();
//! assert_eq!(amount.scale(), 1);  // trailing zeros are dropped
//! assert_eq!(amount.digits(), "10105");
//! ```

use regex::Regex;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

static AMOUNT_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sign>-)?(?P<int>\d{1,3}(?:,\d{3})+|\d*)(?:\.(?P<frac>\d+))?$")
        .expect("valid amount regex")
});

/// A parsed, strictly positive token amount with decimal precision.
///
/// The value is `digits * 10^-scale`. Leading zeros and trailing fractional zeros are stripped,
/// so equal amounts compare equal. For example, `"10.50"` has digits `"105"` and scale 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyAmount {
    digits: String,
    scale: u32,
}

impl MoneyAmount {
    /// Returns the number of significant decimal places.
    ///
    /// This is compared against the token's `decimals` when converting to the smallest unit.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Returns the value as a base-10 integer string, without decimal point.
    ///
    /// For example, `"12.34"` returns `"1234"`. Never empty, never has leading zeros.
    pub fn digits(&self) -> &str {
        &self.digits
    }
}

/// Errors that can occur when parsing or scaling an amount.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoneyAmountParseError {
    /// The input string is not a plain decimal number.
    #[error("Invalid number format: {0:?}")]
    InvalidFormat(String),
    /// Negative values are not allowed.
    #[error("Negative value is not allowed")]
    Negative,
    /// Zero is not a meaningful deposit.
    #[error("Amount must be greater than zero")]
    Zero,
    /// The value does not fit the supported range.
    #[error("Amount is out of range")]
    OutOfRange,
    /// The input has more decimal places than the token supports.
    #[error("Too big of a precision: {money} vs {token} on token")]
    WrongPrecision {
        /// Decimal places in the input.
        money: u32,
        /// Decimal places supported by the token.
        token: u32,
    },
}

impl MoneyAmount {
    /// Parses a human-readable amount string into a [`MoneyAmount`].
    ///
    /// Surrounding whitespace and thousand separators are accepted. The value must be strictly
    /// positive.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The string is not a plain decimal number
    /// - The value is negative or zero
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let trimmed = input.trim();
        let captures = AMOUNT_FORMAT
            .captures(trimmed)
            .ok_or_else(|| MoneyAmountParseError::InvalidFormat(input.to_string()))?;
        let int = captures.name("int").map_or("", |m| m.as_str());
        let frac = captures.name("frac").map_or("", |m| m.as_str());
        if int.is_empty() && frac.is_empty() {
            return Err(MoneyAmountParseError::InvalidFormat(input.to_string()));
        }
        if captures.name("sign").is_some() {
            return Err(MoneyAmountParseError::Negative);
        }

        let frac = frac.trim_end_matches('0');
        let combined = format!("{}{}", int.replace(',', ""), frac);
        let digits = combined.trim_start_matches('0');
        if digits.is_empty() {
            return Err(MoneyAmountParseError::Zero);
        }
        let scale = u32::try_from(frac.len()).map_err(|_| MoneyAmountParseError::OutOfRange)?;
        Ok(MoneyAmount {
            digits: digits.to_string(),
            scale,
        })
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl TryFrom<&str> for MoneyAmount {
    type Error = MoneyAmountParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MoneyAmount::from_str(value)
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&self.digits);
        }
        let padded = format!("{:0>width$}", self.digits, width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{int}.{frac}")
    }
}
