//! Values read from, or reported by, the chain.

use alloy_primitives::utils::{ParseUnits, format_units};
use alloy_primitives::{TxHash, U256};
use bank_permit_types::util::money_amount::{MoneyAmount, MoneyAmountParseError};
use serde::Serialize;
use std::fmt::Display;

/// Token metadata read fresh on every run.
///
/// `decimals` drives unit conversion, `name` feeds the EIP-712 domain, `symbol` is display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    /// Converts a human-readable amount into the token's smallest unit.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input has more decimal places than the token supports
    /// - The scaled value does not fit into a `uint256`
    ///
    /// # Example
    ///
    /// ```ignore
    /// let usdc = TokenInfo { name: "USD Coin".into(), symbol: "USDC".into(), decimals: 6 };
    /// let amount = usdc.parse_amount(&"10.50".parse()?)?;
    /// assert_eq!(amount, U256::from(10_500_000u64));
    /// ```
    pub fn parse_amount(&self, amount: &MoneyAmount) -> Result<U256, MoneyAmountParseError> {
        let scale = amount.scale();
        let token_scale = self.decimals as u32;
        if scale > token_scale {
            return Err(MoneyAmountParseError::WrongPrecision {
                money: scale,
                token: token_scale,
            });
        }
        let scale_diff = token_scale - scale;
        let multiplier = U256::from(10)
            .checked_pow(U256::from(scale_diff))
            .ok_or(MoneyAmountParseError::OutOfRange)?;
        U256::from_str_radix(amount.digits(), 10)
            .ok()
            .and_then(|digits| digits.checked_mul(multiplier))
            .ok_or(MoneyAmountParseError::OutOfRange)
    }

    /// Formats a smallest-unit value with the token's own decimals, e.g. `"10.500000 USDC"`.
    pub fn format_amount<V>(&self, value: V) -> String
    where
        V: Into<ParseUnits> + Display + Copy,
    {
        match format_units(value, self.decimals) {
            Ok(formatted) => format!("{formatted} {}", self.symbol),
            Err(_) => format!("{value} (raw) {}", self.symbol),
        }
    }
}

/// Serde helpers for integer amounts, rendered as decimal strings instead of hex.
pub mod decimal_u256 {
    use alloy_primitives::U256;
    use serde::Serializer;

    /// Serialize a U256 as a decimal string.
    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}

/// Signed counterpart of [`decimal_u256`], for balance deltas.
pub mod decimal_i256 {
    use alloy_primitives::I256;
    use serde::Serializer;

    pub fn serialize<S>(value: &I256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}

/// Inclusion of a deposit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: u64,
}
