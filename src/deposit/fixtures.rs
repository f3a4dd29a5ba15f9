//! In-memory chain, token and bank used by the pipeline tests.
//!
//! The bank verifies permits the way an ERC-2612 token does inside `depositWithPermit`:
//! deadline, current nonce and signer recovery. A rejected permit surfaces as a submission
//! error, as gas estimation would on a live node.

use alloy_primitives::{Address, B256, Signature, TxHash, U256, address, keccak256};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use bank_permit_types::timestamp::UnixTimestamp;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::chain::{
    BankFacade, ChainClient, Confirmation, PermitDeposit, SignerLike, TokenFacade,
};
use crate::deposit::{DepositEvent, DepositObserver};
use crate::error::DepositError;
use crate::permit::{PermitDomain, PermitMessage, SignedPermit};

pub const TOKEN: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
pub const BANK: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
pub const CHAIN_ID: u64 = 31337;

#[derive(Debug)]
pub struct Ledger {
    /// Chain id reported by the node; the token's permit domain is bound to it.
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub supported: bool,
    pub wallet: HashMap<Address, U256>,
    pub deposits: HashMap<Address, U256>,
    pub nonces: HashMap<Address, U256>,
    /// Transfer fee in basis points, withheld from every credited deposit.
    pub fee_bps: u64,
    pub block_number: u64,
    pub receipts: HashMap<TxHash, Confirmation>,
    /// Every `depositWithPermit` call, accepted or not.
    pub submissions: Vec<PermitDeposit>,
    /// Include deposits but mark them reverted.
    pub revert_on_confirm: bool,
    /// `nonces` fails with a transport error.
    pub fail_nonce_read: bool,
    /// Another permit for the owner lands between signing and submission.
    pub race_nonce: bool,
    /// `balanceOf` fails with a transport error.
    pub fail_balance_read: bool,
    /// Calls made to the token contract.
    pub token_reads: usize,
}

impl Ledger {
    fn domain(&self) -> PermitDomain {
        PermitDomain {
            name: self.name.clone(),
            chain_id: self.chain_id,
            verifying_contract: TOKEN,
        }
    }

    fn verify_permit(&self, owner: Address, deposit: &PermitDeposit) -> Result<(), DepositError> {
        if deposit.deadline.as_secs() < UnixTimestamp::now().as_secs() {
            return Err(DepositError::submission("ERC2612ExpiredSignature"));
        }
        let message = PermitMessage {
            owner,
            spender: BANK,
            value: deposit.amount,
            nonce: self.nonces.get(&owner).copied().unwrap_or_default(),
            deadline: deposit.deadline,
        };
        let digest = message.signing_hash(&self.domain());
        match deposit.signature.recover(&digest) {
            Some(signer) if signer == owner => Ok(()),
            _ => Err(DepositError::submission("ERC2612InvalidSigner")),
        }
    }
}

/// Handles onto one shared [`Ledger`].
#[derive(Clone)]
pub struct Fixture {
    ledger: Arc<Mutex<Ledger>>,
    pub chain: FixtureChain,
    pub token: FixtureToken,
    pub bank: FixtureBank,
}

impl Fixture {
    /// A supported 18-decimal token; `owner` holds 1000 tokens in the wallet and `bank_balance`
    /// smallest units in the Bank.
    pub fn new(owner: Address, bank_balance: U256) -> Self {
        Self::with_decimals(owner, 18, bank_balance)
    }

    pub fn with_decimals(owner: Address, decimals: u8, bank_balance: U256) -> Self {
        let wallet = U256::from(1000u64) * U256::from(10u64).pow(U256::from(decimals));
        let ledger = Ledger {
            chain_id: CHAIN_ID,
            name: "MyToken".into(),
            symbol: "MTK".into(),
            decimals,
            supported: true,
            wallet: HashMap::from([(owner, wallet)]),
            deposits: HashMap::from([(owner, bank_balance)]),
            nonces: HashMap::new(),
            fee_bps: 0,
            block_number: 100,
            receipts: HashMap::new(),
            submissions: Vec::new(),
            revert_on_confirm: false,
            fail_nonce_read: false,
            race_nonce: false,
            fail_balance_read: false,
            token_reads: 0,
        };
        let ledger = Arc::new(Mutex::new(ledger));
        Self {
            chain: FixtureChain {
                ledger: ledger.clone(),
            },
            token: FixtureToken {
                ledger: ledger.clone(),
            },
            bank: FixtureBank {
                ledger: ledger.clone(),
                sender: owner,
            },
            ledger,
        }
    }

    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        lock(&self.ledger)
    }
}

fn lock(ledger: &Mutex<Ledger>) -> MutexGuard<'_, Ledger> {
    ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Locks the ledger on behalf of a token call and counts the call.
fn token_call(ledger: &Mutex<Ledger>) -> MutexGuard<'_, Ledger> {
    let mut guard = lock(ledger);
    guard.token_reads += 1;
    guard
}

#[derive(Clone)]
pub struct FixtureChain {
    ledger: Arc<Mutex<Ledger>>,
}

#[async_trait]
impl ChainClient for FixtureChain {
    async fn chain_id(&self) -> Result<u64, DepositError> {
        Ok(lock(&self.ledger).chain_id)
    }

    async fn await_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation, DepositError> {
        let ledger = lock(&self.ledger);
        let confirmation = ledger
            .receipts
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| DepositError::network(format!("Unknown transaction {tx_hash}")))?;
        if ledger.revert_on_confirm {
            return Err(DepositError::TransactionRevert {
                tx_hash,
                block_number: confirmation.block_number,
            });
        }
        Ok(confirmation)
    }
}

#[derive(Clone)]
pub struct FixtureToken {
    ledger: Arc<Mutex<Ledger>>,
}

#[async_trait]
impl TokenFacade for FixtureToken {
    fn address(&self) -> Address {
        TOKEN
    }

    async fn name(&self) -> Result<String, DepositError> {
        Ok(token_call(&self.ledger).name.clone())
    }

    async fn symbol(&self) -> Result<String, DepositError> {
        Ok(token_call(&self.ledger).symbol.clone())
    }

    async fn decimals(&self) -> Result<u8, DepositError> {
        Ok(token_call(&self.ledger).decimals)
    }

    async fn nonces(&self, owner: Address) -> Result<U256, DepositError> {
        let ledger = token_call(&self.ledger);
        if ledger.fail_nonce_read {
            return Err(DepositError::network("connection refused"));
        }
        Ok(ledger.nonces.get(&owner).copied().unwrap_or_default())
    }

    async fn balance_of(&self, account: Address) -> Result<U256, DepositError> {
        let ledger = token_call(&self.ledger);
        if ledger.fail_balance_read {
            return Err(DepositError::network("connection reset"));
        }
        Ok(ledger.wallet.get(&account).copied().unwrap_or_default())
    }
}

/// Bank bound to the account that sends its transactions.
#[derive(Clone)]
pub struct FixtureBank {
    ledger: Arc<Mutex<Ledger>>,
    sender: Address,
}

#[async_trait]
impl BankFacade for FixtureBank {
    fn address(&self) -> Address {
        BANK
    }

    async fn supported_tokens(&self, token: Address) -> Result<bool, DepositError> {
        Ok(token == TOKEN && lock(&self.ledger).supported)
    }

    async fn get_balance(&self, user: Address, token: Address) -> Result<U256, DepositError> {
        if token != TOKEN {
            return Ok(U256::ZERO);
        }
        Ok(lock(&self.ledger)
            .deposits
            .get(&user)
            .copied()
            .unwrap_or_default())
    }

    async fn deposit_with_permit(&self, deposit: &PermitDeposit) -> Result<TxHash, DepositError> {
        let mut ledger = lock(&self.ledger);
        ledger.submissions.push(*deposit);
        let owner = self.sender;
        if ledger.race_nonce {
            *ledger.nonces.entry(owner).or_default() += U256::from(1u64);
        }
        if deposit.token != TOKEN || !ledger.supported {
            return Err(DepositError::submission("UnsupportedToken"));
        }
        ledger.verify_permit(owner, deposit)?;

        let wallet = ledger.wallet.get(&owner).copied().unwrap_or_default();
        let remaining = wallet
            .checked_sub(deposit.amount)
            .ok_or_else(|| DepositError::submission("ERC20InsufficientBalance"))?;
        *ledger.nonces.entry(owner).or_default() += U256::from(1u64);
        ledger.wallet.insert(owner, remaining);
        let fee = deposit.amount * U256::from(ledger.fee_bps) / U256::from(10_000u64);
        *ledger.deposits.entry(owner).or_default() += deposit.amount - fee;

        ledger.block_number += 1;
        let tx_hash = keccak256(ledger.submissions.len().to_be_bytes());
        let confirmation = Confirmation {
            tx_hash,
            block_number: ledger.block_number,
        };
        ledger.receipts.insert(tx_hash, confirmation);
        Ok(tx_hash)
    }
}

/// Real key that counts how often it was asked to sign.
pub struct CountingSigner {
    inner: PrivateKeySigner,
    calls: AtomicUsize,
}

impl CountingSigner {
    pub fn random() -> Self {
        Self {
            inner: PrivateKeySigner::random(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignerLike for CountingSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SignerLike::sign_hash(&self.inner, hash).await
    }
}

/// Records the name of every event it sees, plus the signed permit and wallet balance.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<&'static str>>,
    permit: Mutex<Option<SignedPermit>>,
    wallet_balance: Mutex<Option<U256>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn permit(&self) -> Option<SignedPermit> {
        self.permit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn wallet_balance(&self) -> Option<U256> {
        *self
            .wallet_balance
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DepositObserver for RecordingObserver {
    fn on_event(&self, event: &DepositEvent<'_>) {
        let name = match event {
            DepositEvent::SupportConfirmed { .. } => "support_confirmed",
            DepositEvent::BalanceSnapshot { .. } => "balance_snapshot",
            DepositEvent::DeadlineFixed { .. } => "deadline_fixed",
            DepositEvent::AmountConverted { wallet_balance, .. } => {
                *self
                    .wallet_balance
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = *wallet_balance;
                "amount_converted"
            }
            DepositEvent::PermitSigned { permit } => {
                *self
                    .permit
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some((*permit).clone());
                "permit_signed"
            }
            DepositEvent::Submitted { .. } => "submitted",
            DepositEvent::Confirmed { .. } => "confirmed",
            DepositEvent::Completed { .. } => "completed",
        };
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(name);
    }
}
