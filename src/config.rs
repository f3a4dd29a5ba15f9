//! Configuration for a deposit run.
//!
//! Every option can be given on the command line or through the environment variable of the
//! same name; a `.env` file in the working directory is loaded first. Values are validated while
//! parsing, so a bad address, key, amount or deadline stops the process before any network
//! activity.

use alloy_primitives::Address;
use bank_permit_types::timestamp::UnixTimestamp;
use bank_permit_types::util::money_amount::{MoneyAmount, MoneyAmountParseError};
use clap::Parser;
use url::Url;

use crate::chain::config::{Eip155ChainConfig, EvmPrivateKey, RpcConfig};
use crate::deposit::DepositRequest;

/// Deposit ERC-20 tokens into a Bank contract with a single EIP-2612 permit transaction.
#[derive(Parser, Debug, Clone)]
#[command(name = "bank-permit")]
#[command(version, about)]
pub struct Config {
    /// JSON-RPC endpoint. A comma-separated list is used as fallbacks, in order.
    #[arg(
        long,
        env = "RPC_URL",
        value_delimiter = ',',
        default_value = "http://localhost:8545"
    )]
    rpc_url: Vec<Url>,

    /// Maximum requests per second sent to each RPC endpoint.
    #[arg(long, env = "RPC_RATE_LIMIT")]
    rpc_rate_limit: Option<u32>,

    /// Hex private key of the depositing account.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: EvmPrivateKey,

    /// Address of the Bank contract.
    #[arg(long, env = "BANK_ADDRESS")]
    bank_address: Address,

    /// Address of the ERC-20 permit token to deposit.
    #[arg(long, env = "TOKEN_ADDRESS")]
    token_address: Address,

    /// Amount to deposit, in whole tokens (e.g. `10` or `0.5`).
    #[arg(long, env = "AMOUNT", default_value = "10")]
    amount: MoneyAmount,

    /// Permit deadline as unix seconds. Defaults to 20 minutes from now; `0` also means unset.
    #[arg(long, env = "DEADLINE")]
    deadline: Option<UnixTimestamp>,

    /// Blocks to wait for on top of the deposit transaction.
    #[arg(long, env = "CONFIRMATIONS", default_value_t = 1)]
    confirmations: u64,

    /// Seconds to wait for the deposit receipt. Waits indefinitely if unset. A timeout does not
    /// mean the deposit failed: the transaction may still be included later.
    #[arg(long, env = "TX_RECEIPT_TIMEOUT_SECS")]
    tx_receipt_timeout_secs: Option<u64>,

    /// Print the deposit result as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Cli(#[from] clap::Error),
    #[error("No RPC endpoint configured")]
    NoRpcEndpoint,
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyAmountParseError),
}

impl Config {
    /// Parses the process arguments and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::try_parse()?)
    }

    pub fn rpc_url(&self) -> &[Url] {
        &self.rpc_url
    }

    pub fn bank_address(&self) -> Address {
        self.bank_address
    }

    pub fn token_address(&self) -> Address {
        self.token_address
    }

    pub fn amount(&self) -> &MoneyAmount {
        &self.amount
    }

    /// Requested permit deadline. An explicit `0` counts as unset.
    pub fn deadline(&self) -> Option<UnixTimestamp> {
        self.deadline.filter(|deadline| deadline.as_secs() != 0)
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn chain(&self) -> Eip155ChainConfig {
        Eip155ChainConfig {
            rpc: self
                .rpc_url
                .iter()
                .map(|http| RpcConfig {
                    http: http.clone(),
                    rate_limit: self.rpc_rate_limit,
                })
                .collect(),
            signer: self.private_key,
            confirmations: self.confirmations,
            receipt_timeout_secs: self.tx_receipt_timeout_secs,
        }
    }

    pub fn request(&self) -> DepositRequest {
        DepositRequest {
            amount: self.amount.clone(),
            deadline: self.deadline(),
        }
    }
}
