//! EVM chain access for the deposit workflow.
//!
//! The deposit pipeline talks to the chain only through three traits, so every stage can run
//! against fixtures as well as against a live node:
//!
//! - [`ChainClient`] - live chain id and transaction confirmation
//! - [`TokenFacade`] - reads on the ERC-20 permit token
//! - [`BankFacade`] - reads on the Bank and its single mutating entry point
//!
//! The signing identity is a [`SignerLike`]. [`Eip155ChainProvider`] is both the live
//! [`ChainClient`] and the signer; [`Erc20PermitToken`] and [`BankContract`] are the live
//! facades, built from `sol!` bindings in [`contracts`].
//!
//! # Example
//!
//! ```ignore
//! let provider = Eip155ChainProvider::try_new(&config.chain())?;
//! let token = Erc20PermitToken::new(config.token_address(), provider.inner().clone());
//! let info = token.token_info().await?;
//! ```

pub mod bank;
pub mod config;
pub mod contracts;
pub mod provider;
pub mod signer;
pub mod token;
pub mod types;

pub use bank::*;
pub use provider::*;
pub use signer::*;
pub use token::*;
pub use types::*;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use bank_permit_types::timestamp::UnixTimestamp;

use crate::error::DepositError;
use crate::permit::PermitSignature;

/// Network-level operations that are not tied to a contract.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id of the node actually connected to.
    async fn chain_id(&self) -> Result<u64, DepositError>;

    /// Suspends until `tx_hash` is included and final per the client's confirmation policy.
    async fn await_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation, DepositError>;
}

/// Typed surface over an ERC-20 token with ERC-2612 permit.
#[async_trait]
pub trait TokenFacade: Send + Sync {
    fn address(&self) -> Address;

    async fn name(&self) -> Result<String, DepositError>;

    async fn symbol(&self) -> Result<String, DepositError>;

    async fn decimals(&self) -> Result<u8, DepositError>;

    /// Current permit nonce of `owner`.
    async fn nonces(&self, owner: Address) -> Result<U256, DepositError>;

    async fn balance_of(&self, account: Address) -> Result<U256, DepositError>;

    /// Name, symbol and decimals, fetched concurrently.
    async fn token_info(&self) -> Result<TokenInfo, DepositError> {
        let (name, symbol, decimals) =
            tokio::try_join!(self.name(), self.symbol(), self.decimals())?;
        Ok(TokenInfo {
            name,
            symbol,
            decimals,
        })
    }
}

/// Arguments of `depositWithPermit(token, amount, deadline, v, r, s)`.
///
/// `amount` and `deadline` must be the `value` and `deadline` that were signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitDeposit {
    pub token: Address,
    pub amount: U256,
    pub deadline: UnixTimestamp,
    pub signature: PermitSignature,
}

/// Typed surface over the Bank contract.
#[async_trait]
pub trait BankFacade: Send + Sync {
    fn address(&self) -> Address;

    /// Whether `token` is an accepted deposit asset.
    async fn supported_tokens(&self, token: Address) -> Result<bool, DepositError>;

    /// Recorded balance of `user` for `token`.
    async fn get_balance(&self, user: Address, token: Address) -> Result<U256, DepositError>;

    /// Submits the combined permit-and-deposit call. Returns the transaction hash once the
    /// network has accepted it; inclusion is awaited separately through [`ChainClient`].
    async fn deposit_with_permit(&self, deposit: &PermitDeposit) -> Result<TxHash, DepositError>;
}
