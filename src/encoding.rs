//! Wire encoding for externally signed transactions. The unsigned portion is
//! hashed with keccak-256 to obtain the signing digest; the full transaction
//! (auth data included) travels as a postcard-encoded byte string.

use crate::signer::Signer;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A transaction submitted from outside the network, addressed to an account
/// on a specific shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTransaction {
    pub to: Address,
    pub chain_id: u64,
    pub seqno: u64,
    pub data: Bytes,
    /// Recoverable signature over [`Self::signing_hash`]; empty until signed.
    pub auth_data: Bytes,
}

impl ExternalTransaction {
    pub fn new(to: Address, chain_id: u64, seqno: u64, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            chain_id,
            seqno,
            data: data.into(),
            auth_data: Bytes::new(),
        }
    }

    /// Digest covered by the signature: the encoding of the transaction with
    /// `auth_data` cleared.
    pub fn signing_hash(&self) -> Result<B256> {
        let unsigned = Self {
            auth_data: Bytes::new(),
            ..self.clone()
        };
        let bytes =
            postcard::to_allocvec(&unsigned).context("failed to encode unsigned transaction")?;
        Ok(keccak256(&bytes))
    }

    /// Signs the transaction in place.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<()> {
        let digest = self.signing_hash()?;
        let signature = signer.sign(&digest)?;
        self.auth_data = Bytes::from(signature.to_vec());
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        !self.auth_data.is_empty()
    }

    /// Serializes the transaction for `eth_sendRawTransaction`.
    pub fn encode(&self) -> Result<Bytes> {
        let bytes = postcard::to_allocvec(self).context("failed to encode transaction")?;
        Ok(Bytes::from(bytes))
    }

    /// Parses a transaction previously produced by [`Self::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).context("failed to decode transaction")
    }

    /// Hash identifying the signed transaction on the wire.
    pub fn hash(&self) -> Result<B256> {
        Ok(keccak256(self.encode()?))
    }
}
