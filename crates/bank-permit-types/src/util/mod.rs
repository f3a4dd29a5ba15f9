//! Utility types for bank-permit.
//!
//! - [`money_amount`] - Human-readable token amount parsing

pub mod money_amount;

pub use money_amount::*;
