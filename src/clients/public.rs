//! Read and submit operations against a single network endpoint.

use crate::rpc::{RpcClient, RpcError};
use crate::types::{BlockRef, CallArgs, ShardId, TokenId, TxReceipt};
use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::{bail, Result};
use jsonrpsee::rpc_params;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 200;
const DEFAULT_RECEIPT_WAIT_TIMEOUT_SECS: u64 = 30;

/// Client for the public JSON-RPC API of one shard.
///
/// All methods delegate to the shared [`RpcClient`], so they inherit its
/// cancellation token, version header, and metrics.
#[derive(Debug, Clone)]
pub struct PublicClient {
    rpc: RpcClient,
    shard: ShardId,
    receipt_poll_interval: Duration,
    receipt_wait_timeout: Duration,
}

impl PublicClient {
    pub fn new(rpc: RpcClient, shard: ShardId) -> Self {
        Self {
            rpc,
            shard,
            receipt_poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
            receipt_wait_timeout: Duration::from_secs(DEFAULT_RECEIPT_WAIT_TIMEOUT_SECS),
        }
    }

    /// Overrides the polling cadence used by [`Self::wait_until_completion`].
    pub fn with_receipt_waits(mut self, poll_interval: Duration, wait_timeout: Duration) -> Self {
        self.receipt_poll_interval = poll_interval;
        self.receipt_wait_timeout = wait_timeout;
        self
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        self.receipt_poll_interval
    }

    pub fn receipt_wait_timeout(&self) -> Duration {
        self.receipt_wait_timeout
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.rpc.request("eth_chainId", rpc_params![]).await
    }

    pub async fn gas_price(&self) -> Result<U256> {
        self.rpc.request("eth_gasPrice", rpc_params![self.shard]).await
    }

    pub async fn get_balance(&self, address: Address, at: BlockRef) -> Result<U256> {
        self.rpc
            .request("eth_getBalance", rpc_params![address, at])
            .await
    }

    /// Fungible-token balances held by `address`, keyed by token id.
    pub async fn get_tokens(
        &self,
        address: Address,
        at: BlockRef,
    ) -> Result<BTreeMap<TokenId, U256>> {
        self.rpc
            .request("eth_getTokens", rpc_params![address, at])
            .await
    }

    pub async fn get_code(&self, address: Address, at: BlockRef) -> Result<Bytes> {
        self.rpc
            .request("eth_getCode", rpc_params![address, at])
            .await
    }

    pub async fn get_transaction_count(&self, address: Address, at: BlockRef) -> Result<u64> {
        self.rpc
            .request("eth_getTransactionCount", rpc_params![address, at])
            .await
    }

    /// Executes a read-only call without submitting a transaction.
    pub async fn call(&self, args: CallArgs, at: BlockRef) -> Result<Bytes> {
        self.rpc.request("eth_call", rpc_params![args, at]).await
    }

    pub async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256> {
        self.rpc
            .request("eth_sendRawTransaction", rpc_params![raw])
            .await
    }

    pub async fn get_receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        self.rpc
            .request("eth_getTransactionReceipt", rpc_params![hash])
            .await
    }

    /// Polls until the receipt for `hash` is available.
    ///
    /// Returns the receipt whether or not the execution succeeded; callers
    /// decide what a failed receipt means. The loop cooperates with the
    /// client's cancellation token and gives up after the configured wait
    /// timeout.
    pub async fn wait_until_completion(&self, hash: B256) -> Result<TxReceipt> {
        let deadline = Instant::now() + self.receipt_wait_timeout;

        loop {
            if let Some(receipt) = self.get_receipt(hash).await? {
                if !receipt.success {
                    tracing::warn!(
                        %hash,
                        reason = receipt.failure_reason.as_deref().unwrap_or("unknown"),
                        "transaction finalized with failure"
                    );
                }
                return Ok(receipt);
            }

            if Instant::now() >= deadline {
                bail!(
                    "transaction {hash} was not finalized within {:?}",
                    self.receipt_wait_timeout
                );
            }

            tokio::select! {
                _ = self.rpc.cancel_token().cancelled() => {
                    return Err(RpcError::Cancelled {
                        method: "eth_getTransactionReceipt",
                    }
                    .into());
                }
                _ = sleep(self.receipt_poll_interval) => {}
            }
        }
    }
}
