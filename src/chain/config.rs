use alloy_primitives::B256;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// RPC provider configuration for a single endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcConfig {
    /// HTTP URL for the RPC endpoint.
    pub http: Url,
    /// Rate limit for requests per second (optional).
    pub rate_limit: Option<u32>,
}

/// Everything needed to build an [`Eip155ChainProvider`](crate::chain::Eip155ChainProvider).
#[derive(Debug, Clone)]
pub struct Eip155ChainConfig {
    /// Endpoints, tried in order by the fallback transport.
    pub rpc: Vec<RpcConfig>,
    /// Key of the single externally-owned account that signs and sends.
    pub signer: EvmPrivateKey,
    /// Blocks to wait for after inclusion before a deposit is considered final.
    pub confirmations: u64,
    /// How long to wait till the transaction receipt is available. `None` waits indefinitely.
    pub receipt_timeout_secs: Option<u64>,
}

impl Eip155ChainConfig {
    pub fn receipt_timeout(&self) -> Option<Duration> {
        self.receipt_timeout_secs.map(Duration::from_secs)
    }
}

/// A validated EVM private key (32 bytes).
///
/// This type represents a raw private key that has been validated as a proper
/// 32-byte hex value. It can be converted to a `PrivateKeySigner` when needed.
/// `Debug` output is redacted.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EvmPrivateKey(B256);

impl EvmPrivateKey {
    /// Get the raw 32 bytes of the private key.
    pub fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl Debug for EvmPrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("EvmPrivateKey(<redacted>)")
    }
}

/// Error returned for a private key that is not 32 bytes of hex.
#[derive(Debug, thiserror::Error)]
#[error("Invalid evm private key: {0}")]
pub struct EvmPrivateKeyParseError(String);

impl FromStr for EvmPrivateKey {
    type Err = EvmPrivateKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s.trim())
            .map(Self)
            .map_err(|e| EvmPrivateKeyParseError(e.to_string()))
    }
}
