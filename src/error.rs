//! Error taxonomy for a deposit run.
//!
//! A run produces either a [`DepositResult`](crate::deposit::DepositResult) or exactly one
//! [`DepositError`]. Nothing is recovered internally: the stage that fails returns its error and
//! the remaining stages never run.

use alloy_primitives::{Address, TxHash};
use std::fmt::Display;

use crate::config::ConfigError;

/// Errors produced while turning a 65-byte signature into a permit signature.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The signing identity failed to produce a signature.
    #[error("Signing failed: {0}")]
    Signer(#[from] alloy_signer::Error),
    /// The raw signature is not 65 bytes long.
    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),
    /// The recovery byte is not one of 0, 1, 27 or 28.
    #[error("Invalid signature recovery id: {0}")]
    InvalidRecoveryId(u8),
    /// The permit owner is not the address of the signing identity.
    #[error("Permit owner {owner} does not match signer {signer}")]
    OwnerMismatch { owner: Address, signer: Address },
}

/// Any failure of a deposit run.
#[derive(Debug, thiserror::Error)]
pub enum DepositError {
    /// Missing or invalid input. Raised before any signature is requested.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// The Bank does not accept this token.
    #[error("Token {0} is not supported by the Bank contract")]
    UnsupportedToken(Address),
    /// The permit could not be signed.
    #[error("Permit signature error: {0}")]
    Signature(#[from] SignatureError),
    /// The deposit transaction was rejected before inclusion.
    #[error("Transaction submission failed: {0}")]
    TransactionSubmission(String),
    /// The deposit transaction was included but reverted.
    #[error("Transaction {tx_hash} reverted in block {block_number}")]
    TransactionRevert { tx_hash: TxHash, block_number: u64 },
    /// Transport or RPC failure from the chain client.
    #[error("Network error: {0}")]
    Network(String),
}

impl DepositError {
    pub fn network(e: impl Display) -> Self {
        DepositError::Network(e.to_string())
    }

    pub fn submission(e: impl Display) -> Self {
        DepositError::TransactionSubmission(e.to_string())
    }
}
