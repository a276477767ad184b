//! Smart account lifecycle: deterministic address derivation, the
//! initialize-or-deploy flow, and signed transaction submission.

use crate::clients::faucet::{FaucetClient, TopUpRequest, BASE_TOKEN};
use crate::clients::public::PublicClient;
use crate::encoding::ExternalTransaction;
use crate::signer::Signer;
use crate::types::{BlockRef, ShardId, TokenId, TxReceipt};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Base-token amount requested from the faucet to fund a fresh deployment.
pub const DEFAULT_DEPLOY_FUNDING_WEI: u128 = 100_000_000_000_000_000;

/// Derives the deterministic smart account address for a signer.
///
/// The address is the keccak digest of the compressed public key and the
/// salt, truncated to 20 bytes, with the shard id stamped into the top two
/// bytes. The same key, salt, and shard always map to the same address, so
/// deployment is idempotent.
pub fn derive_address(signer: &dyn Signer, shard: ShardId, salt: U256) -> Address {
    let mut preimage = Vec::with_capacity(33 + 32);
    preimage.extend_from_slice(&signer.compressed_public_key());
    preimage.extend_from_slice(&salt.to_be_bytes::<32>());
    let digest = keccak256(&preimage);
    shard.stamp(Address::from_slice(&digest[12..]))
}

/// An account deployed on one shard, able to read its own state and submit
/// signed transactions.
#[derive(Clone)]
pub struct SmartAccount {
    client: PublicClient,
    signer: Arc<dyn Signer>,
    address: Address,
    shard: ShardId,
    chain_id: u64,
}

impl std::fmt::Debug for SmartAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartAccount")
            .field("address", &self.address)
            .field("shard", &self.shard)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl SmartAccount {
    /// Returns the account for `signer`, deploying it first if the chain has
    /// no code at its address.
    ///
    /// A fresh deployment is funded through the faucet before the deploy
    /// transaction is submitted; an already-deployed account short-circuits
    /// without touching the faucet.
    pub async fn initialize_or_deploy(
        client: PublicClient,
        faucet: &FaucetClient,
        signer: Arc<dyn Signer>,
        salt: U256,
    ) -> Result<Self> {
        let shard = client.shard();
        let chain_id = client.chain_id().await.context("failed to read chain id")?;
        let address = derive_address(signer.as_ref(), shard, salt);

        let account = Self {
            client,
            signer,
            address,
            shard,
            chain_id,
        };

        let code = account
            .client
            .get_code(address, BlockRef::Latest)
            .await
            .context("failed to probe smart account code")?;
        if !code.is_empty() {
            tracing::debug!(%address, %shard, "smart account already deployed");
            return Ok(account);
        }

        let funding = TopUpRequest::new(
            address,
            BASE_TOKEN,
            U256::from(DEFAULT_DEPLOY_FUNDING_WEI),
        );
        faucet
            .top_up_and_wait(&funding, &account.client)
            .await
            .context("failed to fund smart account deployment")?;

        let mut tx = ExternalTransaction::new(
            address,
            chain_id,
            0,
            account.signer.compressed_public_key().to_vec(),
        );
        tx.sign(account.signer.as_ref())?;

        let hash = account
            .client
            .send_raw_transaction(tx.encode()?)
            .await
            .context("failed to submit deploy transaction")?;
        let receipt = account.client.wait_until_completion(hash).await?;
        if !receipt.success {
            bail!(
                "smart account deployment failed: {}",
                receipt.failure_reason.as_deref().unwrap_or("unknown reason")
            );
        }

        let code = account.client.get_code(address, BlockRef::Latest).await?;
        if code.is_empty() {
            bail!("deployment of {address} finalized but left no code behind");
        }

        tracing::info!(%address, %shard, "smart account deployed");
        Ok(account)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn client(&self) -> &PublicClient {
        &self.client
    }

    /// The account's base-token balance at the latest block.
    pub async fn fetch_balance(&self) -> Result<U256> {
        self.client.get_balance(self.address, BlockRef::Latest).await
    }

    /// All fungible-token balances held by the account, keyed by token id.
    pub async fn fetch_tokens(&self) -> Result<BTreeMap<TokenId, U256>> {
        self.client.get_tokens(self.address, BlockRef::Latest).await
    }

    /// Tops up one named token and waits for the balance to reflect it.
    pub async fn top_up_specific_token(
        &self,
        faucet: &FaucetClient,
        token: impl Into<String>,
        amount: U256,
    ) -> Result<B256> {
        let request = TopUpRequest::new(self.address, token, amount);
        faucet.top_up_and_wait(&request, &self.client).await
    }

    /// Tops up every token the network has a faucet for, `amount` each.
    ///
    /// Returns the per-token transaction hashes in registry order.
    pub async fn top_up_all_tokens(
        &self,
        faucet: &FaucetClient,
        amount: U256,
    ) -> Result<Vec<(String, B256)>> {
        let registry = faucet.get_faucets().await?;
        let mut hashes = Vec::with_capacity(registry.len());

        for token in registry.keys() {
            let request = TopUpRequest::new(self.address, token.clone(), amount);
            let hash = faucet.top_up_and_wait(&request, &self.client).await?;
            hashes.push((token.clone(), hash));
        }

        Ok(hashes)
    }

    /// Signs and submits a transaction from this account, waiting for its
    /// receipt.
    pub async fn send_transaction(
        &self,
        to: Address,
        data: impl Into<Bytes>,
    ) -> Result<TxReceipt> {
        let seqno = self
            .client
            .get_transaction_count(self.address, BlockRef::Latest)
            .await?;

        let mut tx = ExternalTransaction::new(to, self.chain_id, seqno, data.into());
        tx.sign(self.signer.as_ref())?;

        let hash = self.client.send_raw_transaction(tx.encode()?).await?;
        self.client.wait_until_completion(hash).await
    }
}
