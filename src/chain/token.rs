use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::chain::contracts::IERC20Permit;
use crate::chain::{InnerProvider, TokenFacade};
use crate::error::DepositError;

/// [`TokenFacade`] over a deployed ERC-20 permit token.
#[derive(Debug, Clone)]
pub struct Erc20PermitToken {
    contract: IERC20Permit::IERC20PermitInstance<InnerProvider>,
}

impl Erc20PermitToken {
    pub fn new(address: Address, provider: InnerProvider) -> Self {
        Self {
            contract: IERC20Permit::new(address, provider),
        }
    }
}

#[async_trait]
impl TokenFacade for Erc20PermitToken {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn name(&self) -> Result<String, DepositError> {
        self.contract
            .name()
            .call()
            .await
            .map_err(DepositError::network)
    }

    async fn symbol(&self) -> Result<String, DepositError> {
        self.contract
            .symbol()
            .call()
            .await
            .map_err(DepositError::network)
    }

    async fn decimals(&self) -> Result<u8, DepositError> {
        self.contract
            .decimals()
            .call()
            .await
            .map_err(DepositError::network)
    }

    async fn nonces(&self, owner: Address) -> Result<U256, DepositError> {
        self.contract
            .nonces(owner)
            .call()
            .await
            .map_err(DepositError::network)
    }

    async fn balance_of(&self, account: Address) -> Result<U256, DepositError> {
        self.contract
            .balanceOf(account)
            .call()
            .await
            .map_err(DepositError::network)
    }
}
