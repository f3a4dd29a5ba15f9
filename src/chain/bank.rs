use alloy_primitives::{Address, TxHash, U256};
use alloy_transport::RpcError;
use async_trait::async_trait;

use crate::chain::contracts::IBank;
use crate::chain::{BankFacade, InnerProvider, PermitDeposit};
use crate::error::DepositError;

/// [`BankFacade`] over the deployed Bank contract.
#[derive(Debug, Clone)]
pub struct BankContract {
    contract: IBank::IBankInstance<InnerProvider>,
}

impl BankContract {
    pub fn new(address: Address, provider: InnerProvider) -> Self {
        Self {
            contract: IBank::new(address, provider),
        }
    }
}

/// Splits `send()` failures by where they happened.
///
/// A node that answered with an error (including a reverting gas estimation) rejected the
/// deposit. A request that never got an answer is a network failure, and the deposit may be
/// retried by the caller.
fn send_error(e: alloy_contract::Error) -> DepositError {
    match &e {
        alloy_contract::Error::TransportError(
            RpcError::Transport(_) | RpcError::NullResp | RpcError::DeserError { .. },
        ) => DepositError::network(e),
        _ => DepositError::submission(e),
    }
}

#[async_trait]
impl BankFacade for BankContract {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn supported_tokens(&self, token: Address) -> Result<bool, DepositError> {
        self.contract
            .supportedTokens(token)
            .call()
            .await
            .map_err(DepositError::network)
    }

    async fn get_balance(&self, user: Address, token: Address) -> Result<U256, DepositError> {
        self.contract
            .getBalance(user, token)
            .call()
            .await
            .map_err(DepositError::network)
    }

    /// Sends `depositWithPermit` and returns once the node has accepted the transaction.
    ///
    /// Gas estimation runs the call first, so a permit the token would reject (expired
    /// deadline, stale nonce, wrong signer) fails here, before anything is broadcast.
    async fn deposit_with_permit(&self, deposit: &PermitDeposit) -> Result<TxHash, DepositError> {
        let signature = &deposit.signature;
        let pending = self
            .contract
            .depositWithPermit(
                deposit.token,
                deposit.amount,
                U256::from(deposit.deadline.as_secs()),
                signature.v,
                signature.r,
                signature.s,
            )
            .send()
            .await
            .map_err(send_error)?;
        Ok(*pending.tx_hash())
    }
}
