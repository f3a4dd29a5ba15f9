//! Single-transaction ERC-20 deposits into a custodial Bank contract.
//!
//! Instead of `approve` followed by a deposit, the token holder signs an
//! [ERC-2612](https://eips.ethereum.org/EIPS/eip-2612) permit off-chain and the Bank consumes it
//! inside `depositWithPermit(token, amount, deadline, v, r, s)`. The permit is bound to the
//! owner's current nonce, the Bank as spender, the exact amount, a deadline and the live chain
//! id, so it cannot be replayed elsewhere.
//!
//! # Modules
//!
//! - [`chain`] - Chain client, token and Bank facades, with live alloy-backed implementations.
//! - [`permit`] - EIP-712 domain and message construction, signing and `(v, r, s)` splitting.
//! - [`deposit`] - The staged deposit pipeline and its observer hooks.
//! - [`config`] - Command line and environment configuration.
//! - [`error`] - Error taxonomy of a deposit run.
//! - [`run`] - Wires live facades from configuration and runs one deposit.
//! - [`telemetry`] - Logging and optional OpenTelemetry export.
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load()?;
//! let result = bank_permit::run::run(&config).await?;
//! println!("deposited {} in block {}", result.deposited, result.block_number);
//! ```

pub mod chain;
pub mod config;
pub mod deposit;
pub mod error;
pub mod permit;
pub mod run;
pub mod telemetry;
