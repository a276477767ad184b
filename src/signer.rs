//! Transaction signing. `LocalEcdsaKeySigner` holds a secp256k1 key in
//! memory; the `Signer` trait is the seam for hardware or remote signers.

use alloy_primitives::{keccak256, Address, B256};
use anyhow::{Context, Result};
use k256::ecdsa::SigningKey;

/// A 65-byte recoverable ECDSA signature (r || s || v).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature(pub [u8; 65]);

impl RecoverableSignature {
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// Signs 32-byte digests on behalf of an account.
pub trait Signer: Send + Sync {
    /// Produces a recoverable signature over `digest`.
    fn sign(&self, digest: &B256) -> Result<RecoverableSignature>;

    /// The SEC1-compressed public key of the signing account.
    fn compressed_public_key(&self) -> [u8; 33];

    /// The address derived from the uncompressed public key, without a shard
    /// prefix applied.
    fn raw_address(&self) -> Address;
}

/// In-memory secp256k1 signer.
pub struct LocalEcdsaKeySigner {
    key: SigningKey,
}

impl std::fmt::Debug for LocalEcdsaKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never leak into logs.
        f.debug_struct("LocalEcdsaKeySigner")
            .field("address", &self.raw_address())
            .finish()
    }
}

impl LocalEcdsaKeySigner {
    /// Builds a signer from a 32-byte private key.
    pub fn new(private_key: &[u8; 32]) -> Result<Self> {
        let key = SigningKey::from_slice(private_key).context("invalid secp256k1 private key")?;
        Ok(Self { key })
    }

    /// Builds a signer from a hex-encoded private key, `0x` prefix optional.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let stripped = private_key.trim().trim_start_matches("0x");
        let bytes = hex::decode(stripped).context("private key is not valid hex")?;
        let key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .context("private key must be exactly 32 bytes")?;
        Self::new(&key)
    }
}

impl Signer for LocalEcdsaKeySigner {
    fn sign(&self, digest: &B256) -> Result<RecoverableSignature> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .context("ecdsa signing failed")?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(signature.to_bytes().as_slice());
        out[64] = recovery_id.to_byte();
        Ok(RecoverableSignature(out))
    }

    fn compressed_public_key(&self) -> [u8; 33] {
        let point = self.key.verifying_key().to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        out
    }

    fn raw_address(&self) -> Address {
        let point = self.key.verifying_key().to_encoded_point(false);
        let digest = keccak256(&point.as_bytes()[1..]);
        Address::from_slice(&digest[12..])
    }
}

/// Generates a fresh random private key suitable for [`LocalEcdsaKeySigner`].
pub fn generate_random_private_key() -> [u8; 32] {
    let key = SigningKey::random(&mut rand::thread_rng());
    key.to_bytes().into()
}
