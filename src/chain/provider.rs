use alloy_network::{EthereumWallet, ReceiptResponse};
use alloy_primitives::{Address, B256, Signature, TxHash};
use alloy_provider::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
};
use alloy_provider::{Identity, PendingTransactionBuilder, Provider, ProviderBuilder, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::layers::{FallbackLayer, ThrottleLayer};
use alloy_transport_http::Http;
use async_trait::async_trait;
use std::num::NonZeroUsize;
use std::time::Duration;
use tower::ServiceBuilder;

use crate::chain::config::{Eip155ChainConfig, RpcConfig};
use crate::chain::{ChainClient, Confirmation, SignerLike};
use crate::config::ConfigError;
use crate::error::DepositError;

/// Combined filler type for gas, blob gas, nonce, and chain ID.
pub type InnerFiller =
    JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>;

/// The fully composed Ethereum provider type used in this project.
///
/// Combines multiple filler layers for gas, nonce, chain ID, blob gas, and wallet signing,
/// and wraps a [`RootProvider`] for actual JSON-RPC communication.
pub type InnerProvider = FillProvider<
    JoinFill<JoinFill<Identity, InnerFiller>, WalletFiller<EthereumWallet>>,
    RootProvider,
>;

/// Network connection plus the single signing identity of a run.
///
/// Reads go through [`InnerProvider`]; contract bindings clone it. Transactions are signed by
/// the wallet filler with the same key that signs permits, so the permit owner is always the
/// transaction sender.
#[derive(Debug)]
pub struct Eip155ChainProvider {
    inner: InnerProvider,
    signer: PrivateKeySigner,
    confirmations: u64,
    receipt_timeout: Option<Duration>,
}

impl Eip155ChainProvider {
    pub fn rpc_client(rpc: &[RpcConfig]) -> Result<RpcClient, ConfigError> {
        let transports = rpc
            .iter()
            .map(|provider_config| {
                let rpc_url = provider_config.http.clone();
                tracing::debug!(rpc_url=%rpc_url, rate_limit=?provider_config.rate_limit, "Using HTTP transport");
                let rate_limit = provider_config.rate_limit.unwrap_or(u32::MAX);
                ServiceBuilder::new()
                    .layer(ThrottleLayer::new(rate_limit))
                    .service(Http::new(rpc_url))
            })
            .collect::<Vec<_>>();
        let active = NonZeroUsize::new(transports.len()).ok_or(ConfigError::NoRpcEndpoint)?;
        let fallback = ServiceBuilder::new()
            .layer(FallbackLayer::default().with_active_transport_count(active))
            .service(transports);
        Ok(RpcClient::new(fallback, false))
    }

    /// Creates a new provider from configuration.
    ///
    /// No network request is made here; the first RPC happens when the deposit starts.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The private key is not a valid secp256k1 scalar
    /// - No RPC endpoint is configured
    pub fn try_new(config: &Eip155ChainConfig) -> Result<Self, ConfigError> {
        let signer = PrivateKeySigner::from_bytes(config.signer.as_b256())
            .map_err(|e| ConfigError::InvalidPrivateKey(e.to_string()))?;
        let wallet = EthereumWallet::from(signer.clone());
        let client = Self::rpc_client(&config.rpc)?;

        // Gas -> BlobGas -> Nonce -> ChainId, then the wallet signs
        let filler = JoinFill::new(
            GasFiller,
            JoinFill::new(
                BlobGasFiller::default(),
                JoinFill::new(NonceFiller::default(), ChainIdFiller::default()),
            ),
        );
        let inner: InnerProvider = ProviderBuilder::default()
            .filler(filler)
            .wallet(wallet)
            .connect_client(client);

        tracing::info!(signer=%signer.address(), "Using EVM provider");

        Ok(Self {
            inner,
            signer,
            confirmations: config.confirmations,
            receipt_timeout: config.receipt_timeout(),
        })
    }

    pub fn inner(&self) -> &InnerProvider {
        &self.inner
    }
}

#[async_trait]
impl ChainClient for Eip155ChainProvider {
    async fn chain_id(&self) -> Result<u64, DepositError> {
        self.inner.get_chain_id().await.map_err(DepositError::network)
    }

    /// Waits for `confirmations` blocks on top of the deposit, bounded by the receipt timeout
    /// if one is configured.
    ///
    /// A receipt with a failed status is a [`DepositError::TransactionRevert`]. A timeout or a
    /// transport failure is a [`DepositError::Network`]; the transaction may still be included
    /// afterwards.
    async fn await_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation, DepositError> {
        let receipt = PendingTransactionBuilder::new(self.inner.root().clone(), tx_hash)
            .with_required_confirmations(self.confirmations)
            .with_timeout(self.receipt_timeout)
            .get_receipt()
            .await
            .map_err(|e| {
                DepositError::Network(format!(
                    "No receipt for {tx_hash} ({e}); the transaction may still be included"
                ))
            })?;
        let block_number = receipt.block_number().ok_or_else(|| {
            DepositError::Network(format!("Receipt for {tx_hash} carries no block number"))
        })?;
        if !receipt.status() {
            return Err(DepositError::TransactionRevert {
                tx_hash,
                block_number,
            });
        }
        Ok(Confirmation {
            tx_hash,
            block_number,
        })
    }
}

#[async_trait]
impl SignerLike for Eip155ChainProvider {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(&self.signer, hash).await
    }
}
