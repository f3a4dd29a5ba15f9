use tracing::instrument;

use crate::chain::{BankContract, Eip155ChainProvider, Erc20PermitToken};
use crate::config::Config;
use crate::deposit::{DepositContext, DepositResult, TracingObserver, deposit_with_permit};
use crate::error::DepositError;

/// Wires live chain facades from `config` and performs one deposit.
#[instrument(skip_all, err)]
pub async fn run(config: &Config) -> Result<DepositResult, DepositError> {
    let rpc_url = config
        .rpc_url()
        .iter()
        .map(|url| url.as_str())
        .collect::<Vec<_>>()
        .join(",");
    tracing::info!(
        %rpc_url,
        bank = %config.bank_address(),
        token = %config.token_address(),
        amount = %config.amount(),
        deadline = ?config.deadline(),
        "Deposit configuration"
    );

    let provider = Eip155ChainProvider::try_new(&config.chain())?;
    let token = Erc20PermitToken::new(config.token_address(), provider.inner().clone());
    let bank = BankContract::new(config.bank_address(), provider.inner().clone());

    let observer = TracingObserver;
    let ctx = DepositContext::new(&provider, &token, &bank, &provider).with_observer(&observer);
    deposit_with_permit(&ctx, &config.request()).await
}
