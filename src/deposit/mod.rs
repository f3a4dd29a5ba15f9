//! The deposit pipeline.
//!
//! One run moves through a fixed, linear sequence of stages:
//!
//! ```text
//! ValidateSupport -> SnapshotBalance -> ComputeDeadline -> ConvertAmount
//!  -> AcquireSignature -> Submit -> AwaitConfirmation -> ReportDelta
//! ```
//!
//! Every stage is a plain async function over an immutable [`DepositContext`]. The first stage
//! that fails ends the run with its error; nothing is retried and nothing is compensated.
//! `depositWithPermit` is the only mutating call, and it is atomic on-chain, so a failure
//! before [`submit`] leaves the chain untouched.
//!
//! Racing two runs for the same owner and token is unsafe: both may sign over the same nonce,
//! and the token rejects whichever permit is consumed second.

mod observer;

#[cfg(test)]
mod fixtures;

pub use observer::*;

use alloy_primitives::{Address, I256, TxHash, U256};
use bank_permit_types::timestamp::UnixTimestamp;
use bank_permit_types::util::money_amount::MoneyAmount;
use serde::Serialize;
use tracing::instrument;

use crate::chain::{
    BankFacade, ChainClient, Confirmation, PermitDeposit, SignerLike, TokenFacade, TokenInfo,
    decimal_i256, decimal_u256,
};
use crate::config::ConfigError;
use crate::error::DepositError;
use crate::permit::{PermitSigner, SignedPermit};

/// Lifetime of a permit when the caller does not set a deadline: 20 minutes.
pub const DEFAULT_PERMIT_TTL_SECS: u64 = 1200;

/// What the caller asks for. Everything else is read from the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    /// Human-readable amount, scaled by the token's decimals during the run.
    pub amount: MoneyAmount,
    /// Permit deadline; `now + DEFAULT_PERMIT_TTL_SECS` if absent.
    pub deadline: Option<UnixTimestamp>,
}

/// Collaborators of a single run.
///
/// The signer is the permit owner, the transaction sender and the account whose Bank balance
/// is reported.
#[derive(Clone, Copy)]
pub struct DepositContext<'a> {
    pub chain: &'a dyn ChainClient,
    pub token: &'a dyn TokenFacade,
    pub bank: &'a dyn BankFacade,
    pub signer: &'a dyn SignerLike,
    pub observer: &'a dyn DepositObserver,
}

impl<'a> DepositContext<'a> {
    pub fn new(
        chain: &'a dyn ChainClient,
        token: &'a dyn TokenFacade,
        bank: &'a dyn BankFacade,
        signer: &'a dyn SignerLike,
    ) -> Self {
        Self {
            chain,
            token,
            bank,
            signer,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(self, observer: &'a dyn DepositObserver) -> Self {
        Self { observer, ..self }
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    fn emit(&self, event: DepositEvent<'_>) {
        self.observer.on_event(&event);
    }
}

/// Token metadata and the requested amount in the token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedAmount {
    pub token: TokenInfo,
    pub value: U256,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResult {
    pub token: TokenInfo,
    #[serde(serialize_with = "decimal_u256::serialize")]
    pub previous_balance: U256,
    #[serde(serialize_with = "decimal_u256::serialize")]
    pub new_balance: U256,
    /// Observed `new_balance - previous_balance`.
    #[serde(serialize_with = "decimal_i256::serialize")]
    pub deposited: I256,
    /// Signed permit value.
    #[serde(serialize_with = "decimal_u256::serialize")]
    pub expected: U256,
    pub tx_hash: TxHash,
    pub block_number: u64,
}

impl DepositResult {
    /// Whether the Bank credited exactly the signed value.
    ///
    /// `false` is not a failure: fee-on-transfer tokens credit less than they move.
    pub fn matches_expected(&self) -> bool {
        self.deposited.is_positive() && self.deposited.into_raw() == self.expected
    }
}

#[instrument(skip_all, err)]
pub async fn validate_support(ctx: &DepositContext<'_>) -> Result<(), DepositError> {
    let token = ctx.token.address();
    if !ctx.bank.supported_tokens(token).await? {
        return Err(DepositError::UnsupportedToken(token));
    }
    ctx.emit(DepositEvent::SupportConfirmed {
        token,
        bank: ctx.bank.address(),
    });
    Ok(())
}

/// Bank balance of the owner, the baseline of the reported delta.
#[instrument(skip_all, err)]
pub async fn snapshot_balance(ctx: &DepositContext<'_>) -> Result<U256, DepositError> {
    let owner = ctx.owner();
    let balance = ctx.bank.get_balance(owner, ctx.token.address()).await?;
    ctx.emit(DepositEvent::BalanceSnapshot { owner, balance });
    Ok(balance)
}

pub fn compute_deadline(requested: Option<UnixTimestamp>, now: UnixTimestamp) -> UnixTimestamp {
    requested.unwrap_or(now + DEFAULT_PERMIT_TTL_SECS)
}

/// Reads token metadata and scales `amount` by the token's own `decimals`.
///
/// The owner's wallet balance is read alongside for the event only; failing to read it does
/// not fail the stage.
#[instrument(skip_all, err, fields(amount = %amount))]
pub async fn convert_amount(
    ctx: &DepositContext<'_>,
    amount: &MoneyAmount,
) -> Result<ConvertedAmount, DepositError> {
    let owner = ctx.owner();
    let (token, wallet_balance) =
        tokio::join!(ctx.token.token_info(), ctx.token.balance_of(owner));
    let token = token?;
    let wallet_balance = wallet_balance
        .inspect_err(|e| tracing::warn!(%owner, error = %e, "Could not read wallet token balance"))
        .ok();
    let value = token
        .parse_amount(amount)
        .map_err(ConfigError::InvalidAmount)?;
    ctx.emit(DepositEvent::AmountConverted {
        token: &token,
        value,
        wallet_balance,
    });
    Ok(ConvertedAmount { token, value })
}

/// Signs a permit for the Bank over `value` and `deadline`.
#[instrument(skip_all, err)]
pub async fn acquire_signature(
    ctx: &DepositContext<'_>,
    value: U256,
    deadline: UnixTimestamp,
) -> Result<SignedPermit, DepositError> {
    let permit = PermitSigner::new(ctx.token, ctx.chain, ctx.signer)
        .sign(ctx.owner(), ctx.bank.address(), value, deadline)
        .await?;
    ctx.emit(DepositEvent::PermitSigned { permit: &permit });
    Ok(permit)
}

/// Sends `depositWithPermit`. Value and deadline are taken from the signed message itself.
#[instrument(skip_all, err)]
pub async fn submit(ctx: &DepositContext<'_>, permit: &SignedPermit) -> Result<TxHash, DepositError> {
    let deposit = PermitDeposit {
        token: permit.domain.verifying_contract,
        amount: permit.message.value,
        deadline: permit.message.deadline,
        signature: permit.signature,
    };
    let tx_hash = ctx.bank.deposit_with_permit(&deposit).await?;
    ctx.emit(DepositEvent::Submitted { tx_hash });
    Ok(tx_hash)
}

#[instrument(skip_all, err, fields(tx_hash = %tx_hash))]
pub async fn await_confirmation(
    ctx: &DepositContext<'_>,
    tx_hash: TxHash,
) -> Result<Confirmation, DepositError> {
    let confirmation = ctx.chain.await_confirmation(tx_hash).await?;
    ctx.emit(DepositEvent::Confirmed {
        confirmation: &confirmation,
    });
    Ok(confirmation)
}

/// Re-reads the Bank balance and reports the difference to `previous_balance`.
#[instrument(skip_all, err)]
pub async fn report_delta(
    ctx: &DepositContext<'_>,
    converted: ConvertedAmount,
    previous_balance: U256,
    confirmation: Confirmation,
) -> Result<DepositResult, DepositError> {
    let new_balance = ctx
        .bank
        .get_balance(ctx.owner(), ctx.token.address())
        .await?;
    let deposited = I256::from_raw(new_balance).wrapping_sub(I256::from_raw(previous_balance));
    let result = DepositResult {
        token: converted.token,
        previous_balance,
        new_balance,
        deposited,
        expected: converted.value,
        tx_hash: confirmation.tx_hash,
        block_number: confirmation.block_number,
    };
    ctx.emit(DepositEvent::Completed { result: &result });
    Ok(result)
}

/// Runs one deposit end to end.
///
/// # Errors
///
/// Returns the error of the first stage that fails:
/// - [`DepositError::UnsupportedToken`] before anything is signed
/// - [`DepositError::Configuration`] if the amount does not fit the token's decimals
/// - [`DepositError::Signature`] if the permit cannot be signed
/// - [`DepositError::TransactionSubmission`] if the node rejects the deposit
/// - [`DepositError::TransactionRevert`] if the deposit is included but reverts
/// - [`DepositError::Network`] on any transport failure
#[instrument(skip_all, err, fields(
    token = %ctx.token.address(),
    bank = %ctx.bank.address(),
    owner = %ctx.owner(),
))]
pub async fn deposit_with_permit(
    ctx: &DepositContext<'_>,
    request: &DepositRequest,
) -> Result<DepositResult, DepositError> {
    validate_support(ctx).await?;
    let previous_balance = snapshot_balance(ctx).await?;
    let deadline = compute_deadline(request.deadline, UnixTimestamp::now());
    ctx.emit(DepositEvent::DeadlineFixed { deadline });
    let converted = convert_amount(ctx, &request.amount).await?;
    let permit = acquire_signature(ctx, converted.value, deadline).await?;
    let tx_hash = submit(ctx, &permit).await?;
    let confirmation = await_confirmation(ctx, tx_hash).await?;
    report_delta(ctx, converted, previous_balance, confirmation).await
}
