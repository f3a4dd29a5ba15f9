//! ERC-2612 permit signing over EIP-712.
//!
//! The typed data built here must match the token contract's own EIP-712 implementation
//! byte for byte: domain `{name, version, chainId, verifyingContract}` and
//! `Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)`.
//! A mismatch is not observable client-side; the permit simply fails to verify on-chain.
//!
//! - [`sign_permit`] signs a fully specified domain and message. Tests inject fixed values here.
//! - [`PermitSigner`] reads the live token name, chain id and nonce, then calls [`sign_permit`].

use alloy_primitives::{Address, B256, Signature, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use bank_permit_types::timestamp::UnixTimestamp;

use crate::chain::{ChainClient, SignerLike, TokenFacade};
use crate::error::{DepositError, SignatureError};

/// Domain `version` of ERC-2612 tokens. Fixed by the token standard, not configurable.
pub const PERMIT_DOMAIN_VERSION: &str = "1";

sol! {
    /// Solidity-compatible struct definition for the ERC-2612 permit.
    ///
    /// Field names, types and order define the EIP-712 type hash and must not change.
    #[derive(Debug)]
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}

/// EIP-712 domain fields of a permit token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitDomain {
    /// Token `name()`.
    pub name: String,
    /// Chain id reported by the connected node.
    pub chain_id: u64,
    /// Token contract address.
    pub verifying_contract: Address,
}

impl PermitDomain {
    pub fn eip712_domain(&self) -> Eip712Domain {
        let name = self.name.clone();
        eip712_domain! {
            name: name,
            version: PERMIT_DOMAIN_VERSION,
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
        }
    }

    /// The domain separator, as `DOMAIN_SEPARATOR()` returns it on the token.
    pub fn separator(&self) -> B256 {
        self.eip712_domain().separator()
    }
}

/// The five permit fields that get signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitMessage {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: UnixTimestamp,
}

impl PermitMessage {
    pub fn as_permit(&self) -> Permit {
        Permit {
            owner: self.owner,
            spender: self.spender,
            value: self.value,
            nonce: self.nonce,
            deadline: U256::from(self.deadline.as_secs()),
        }
    }

    /// The EIP-712 digest `keccak256("\x19\x01" ‖ domainSeparator ‖ hashStruct(permit))`.
    pub fn signing_hash(&self, domain: &PermitDomain) -> B256 {
        self.as_permit()
            .eip712_signing_hash(&domain.eip712_domain())
    }
}

/// Split ECDSA signature in the form the `permit` ABI takes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitSignature {
    /// Recovery id, 27 or 28.
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl PermitSignature {
    /// Rebuilds the alloy signature, e.g. to recover the signer.
    pub fn to_signature(&self) -> Signature {
        Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            self.v == 28,
        )
    }

    /// Address that produced this signature over `digest`.
    pub fn recover(&self, digest: &B256) -> Option<Address> {
        self.to_signature()
            .recover_address_from_prehash(digest)
            .ok()
    }
}

impl TryFrom<&[u8]> for PermitSignature {
    type Error = SignatureError;

    /// Parses the 65-byte `r ‖ s ‖ v` encoding. `v` may be 0/1 or 27/28.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 65 {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }
        let v = match bytes[64] {
            0 | 27 => 27,
            1 | 28 => 28,
            other => return Err(SignatureError::InvalidRecoveryId(other)),
        };
        Ok(Self {
            v,
            r: B256::from_slice(&bytes[0..32]),
            s: B256::from_slice(&bytes[32..64]),
        })
    }
}

/// A permit together with everything it was signed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPermit {
    pub domain: PermitDomain,
    pub message: PermitMessage,
    pub digest: B256,
    pub signature: PermitSignature,
}

/// Signs `message` under `domain`.
///
/// This is one atomic signing operation; nothing is read from the chain.
pub async fn sign_permit(
    signer: &dyn SignerLike,
    domain: PermitDomain,
    message: PermitMessage,
) -> Result<SignedPermit, SignatureError> {
    let signer_address = signer.address();
    if signer_address != message.owner {
        return Err(SignatureError::OwnerMismatch {
            owner: message.owner,
            signer: signer_address,
        });
    }
    let digest = message.signing_hash(&domain);
    let signature = signer.sign_hash(&digest).await?;
    let signature = PermitSignature::try_from(signature.as_bytes().as_slice())?;
    Ok(SignedPermit {
        domain,
        message,
        digest,
        signature,
    })
}

/// Builds and signs permits against live token and chain state.
pub struct PermitSigner<'a> {
    token: &'a dyn TokenFacade,
    chain: &'a dyn ChainClient,
    signer: &'a dyn SignerLike,
}

impl<'a> PermitSigner<'a> {
    pub fn new(
        token: &'a dyn TokenFacade,
        chain: &'a dyn ChainClient,
        signer: &'a dyn SignerLike,
    ) -> Self {
        Self {
            token,
            chain,
            signer,
        }
    }

    /// Signs a permit letting `spender` pull `value` of the token from `owner` until `deadline`.
    ///
    /// The token name and the chain id are fetched concurrently. The nonce is the last read
    /// before the message is built, which narrows (but does not close) the window in which a
    /// concurrent permit for the same owner can consume it.
    pub async fn sign(
        &self,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: UnixTimestamp,
    ) -> Result<SignedPermit, DepositError> {
        let (name, chain_id) = tokio::try_join!(self.token.name(), self.chain.chain_id())?;
        let nonce = self.token.nonces(owner).await?;
        let domain = PermitDomain {
            name,
            chain_id,
            verifying_contract: self.token.address(),
        };
        let message = PermitMessage {
            owner,
            spender,
            value,
            nonce,
            deadline,
        };
        Ok(sign_permit(self.signer, domain, message).await?)
    }
}
