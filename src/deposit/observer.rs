use alloy_primitives::{Address, TxHash, U256};
use bank_permit_types::timestamp::UnixTimestamp;

use crate::chain::{Confirmation, TokenInfo};
use crate::deposit::DepositResult;
use crate::permit::SignedPermit;

/// Progress of a deposit run, emitted once per completed stage, in stage order.
#[derive(Debug, Clone, Copy)]
pub enum DepositEvent<'a> {
    SupportConfirmed {
        token: Address,
        bank: Address,
    },
    BalanceSnapshot {
        owner: Address,
        balance: U256,
    },
    DeadlineFixed {
        deadline: UnixTimestamp,
    },
    AmountConverted {
        token: &'a TokenInfo,
        value: U256,
        /// Owner's token balance outside the Bank, if it could be read.
        wallet_balance: Option<U256>,
    },
    PermitSigned {
        permit: &'a SignedPermit,
    },
    Submitted {
        tx_hash: TxHash,
    },
    Confirmed {
        confirmation: &'a Confirmation,
    },
    Completed {
        result: &'a DepositResult,
    },
}

/// Diagnostic sink for a deposit run. Observers see the run; they cannot change it.
pub trait DepositObserver: Send + Sync {
    fn on_event(&self, event: &DepositEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DepositObserver for NoopObserver {
    fn on_event(&self, _event: &DepositEvent<'_>) {}
}

/// Narrates a run as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DepositObserver for TracingObserver {
    fn on_event(&self, event: &DepositEvent<'_>) {
        match event {
            DepositEvent::SupportConfirmed { token, bank } => {
                tracing::info!(%token, %bank, "Token is supported by the Bank");
            }
            DepositEvent::BalanceSnapshot { owner, balance } => {
                tracing::info!(%owner, %balance, "Bank balance before deposit");
            }
            DepositEvent::DeadlineFixed { deadline } => {
                tracing::info!(%deadline, "Permit deadline");
            }
            DepositEvent::AmountConverted {
                token,
                value,
                wallet_balance,
            } => {
                tracing::info!(
                    name = %token.name,
                    symbol = %token.symbol,
                    decimals = token.decimals,
                    %value,
                    amount = %token.format_amount(*value),
                    "Token info"
                );
                if let Some(balance) = wallet_balance {
                    tracing::info!(balance = %token.format_amount(*balance), "Wallet token balance");
                }
            }
            DepositEvent::PermitSigned { permit } => {
                let signature = &permit.signature;
                tracing::info!(
                    nonce = %permit.message.nonce,
                    chain_id = permit.domain.chain_id,
                    v = signature.v,
                    r = %signature.r,
                    s = %signature.s,
                    "Permit signed"
                );
            }
            DepositEvent::Submitted { tx_hash } => {
                tracing::info!(%tx_hash, "Deposit transaction sent");
            }
            DepositEvent::Confirmed { confirmation } => {
                tracing::info!(
                    tx_hash = %confirmation.tx_hash,
                    block_number = confirmation.block_number,
                    "Deposit transaction confirmed"
                );
            }
            DepositEvent::Completed { result } => {
                let token = &result.token;
                tracing::info!(
                    previous_balance = %token.format_amount(result.previous_balance),
                    new_balance = %token.format_amount(result.new_balance),
                    deposited = %token.format_amount(result.deposited),
                    tx_hash = %result.tx_hash,
                    block_number = result.block_number,
                    "Deposit completed"
                );
                if !result.matches_expected() {
                    tracing::info!(
                        expected = %token.format_amount(result.expected),
                        deposited = %token.format_amount(result.deposited),
                        "Credited amount differs from the signed value"
                    );
                }
            }
        }
    }
}
