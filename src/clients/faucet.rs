//! Faucet operations: resolving the network's well-known faucets and
//! topping up accounts with base-token or fungible-token balances.

use crate::clients::public::PublicClient;
use crate::rpc::{RpcClient, RpcError};
use crate::types::{BlockRef, TokenId};
use alloy_primitives::{Address, B256, U256};
use anyhow::{bail, Result};
use jsonrpsee::rpc_params;
use std::collections::BTreeMap;
use tokio::time::{sleep, Instant};

/// Name under which the base (gas) token faucet is registered.
pub const BASE_TOKEN: &str = "NIL";

#[derive(Debug)]
pub enum FaucetError {
    UnknownToken { token: String },
}

impl std::fmt::Display for FaucetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaucetError::UnknownToken { token } => {
                write!(f, "no faucet is registered for token {token:?}")
            }
        }
    }
}

impl std::error::Error for FaucetError {}

/// A single top-up order: which token, how much, and for whom.
#[derive(Debug, Clone)]
pub struct TopUpRequest {
    pub recipient: Address,
    pub token: String,
    pub amount: U256,
}

impl TopUpRequest {
    pub fn new(recipient: Address, token: impl Into<String>, amount: U256) -> Self {
        Self {
            recipient,
            token: token.into(),
            amount,
        }
    }
}

/// Client for the faucet JSON-RPC API.
///
/// The faucet service may live behind the same endpoint as the public API or
/// a dedicated one; either way it is just another [`RpcClient`].
#[derive(Debug, Clone)]
pub struct FaucetClient {
    rpc: RpcClient,
}

impl FaucetClient {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// The token-name to faucet-address registry served by the network.
    pub async fn get_faucets(&self) -> Result<BTreeMap<String, Address>> {
        self.rpc.request("faucet_getFaucets", rpc_params![]).await
    }

    /// Orders `faucet` to credit `recipient` with `amount` and returns the
    /// hash of the resulting transaction.
    pub async fn top_up(
        &self,
        faucet: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<B256> {
        self.rpc
            .request("faucet_topUpViaFaucet", rpc_params![faucet, recipient, amount])
            .await
    }

    /// Tops up and blocks until the credited balance is observable.
    ///
    /// The token name is resolved against [`Self::get_faucets`]; an
    /// unrecognized name fails with [`FaucetError::UnknownToken`] before
    /// anything is submitted. After the top-up transaction finalizes, the
    /// recipient's balance is polled until it strictly exceeds its
    /// pre-top-up value.
    pub async fn top_up_and_wait(
        &self,
        request: &TopUpRequest,
        client: &PublicClient,
    ) -> Result<B256> {
        let faucets = self.get_faucets().await?;
        let faucet = match faucets.get(&request.token) {
            Some(faucet) => *faucet,
            None => {
                return Err(FaucetError::UnknownToken {
                    token: request.token.clone(),
                }
                .into())
            }
        };

        let before = self.observed_balance(request, faucet, client).await?;

        let hash = self.top_up(faucet, request.recipient, request.amount).await?;
        tracing::debug!(
            token = %request.token,
            recipient = %request.recipient,
            amount = %request.amount,
            %hash,
            "faucet top-up submitted"
        );

        let receipt = client.wait_until_completion(hash).await?;
        if !receipt.success {
            bail!(
                "faucet top-up for token {:?} failed: {}",
                request.token,
                receipt.failure_reason.as_deref().unwrap_or("unknown reason")
            );
        }

        // Finalization and balance visibility are separate events on a
        // sharded network, so the receipt alone is not enough.
        let deadline = Instant::now() + client.receipt_wait_timeout();
        loop {
            let after = self.observed_balance(request, faucet, client).await?;
            if after > before {
                return Ok(hash);
            }

            if Instant::now() >= deadline {
                bail!(
                    "balance of token {:?} did not increase after top-up {hash}",
                    request.token
                );
            }

            tokio::select! {
                _ = self.rpc.cancel_token().cancelled() => {
                    return Err(RpcError::Cancelled {
                        method: "faucet_topUpViaFaucet",
                    }
                    .into());
                }
                _ = sleep(client.receipt_poll_interval()) => {}
            }
        }
    }

    async fn observed_balance(
        &self,
        request: &TopUpRequest,
        faucet: Address,
        client: &PublicClient,
    ) -> Result<U256> {
        if request.token == BASE_TOKEN {
            client.get_balance(request.recipient, BlockRef::Latest).await
        } else {
            let tokens = client.get_tokens(request.recipient, BlockRef::Latest).await?;
            Ok(tokens.get(&TokenId(faucet)).copied().unwrap_or_default())
        }
    }
}
