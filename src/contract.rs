//! Read-only contract access: binds a [`PublicClient`] to a deployed
//! contract and decodes typed call results.

use crate::clients::public::PublicClient;
use crate::types::{BlockRef, CallArgs};
use alloy_primitives::Address;
use alloy_sol_types::{sol, SolCall};
use anyhow::{Context, Result};

sol! {
    /// Read surface of the reference token contract.
    interface Token {
        function getTokenName() external view returns (string);
        function getTokenId() external view returns (uint256);
        function getOwnTokenBalance() external view returns (uint256);
        function getTokenBalanceOf(address owner) external view returns (uint256);
    }
}

/// Typed reader for one deployed contract.
#[derive(Debug, Clone)]
pub struct ContractReader {
    client: PublicClient,
    address: Address,
}

impl ContractReader {
    pub fn new(client: PublicClient, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Encodes `call`, executes it against the latest block, and decodes the
    /// return value.
    pub async fn read<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let args = CallArgs {
            to: self.address,
            data: call.abi_encode().into(),
            fee_limit: None,
        };

        let output = self
            .client
            .call(args, BlockRef::Latest)
            .await
            .with_context(|| format!("contract read {} failed", C::SIGNATURE))?;

        C::abi_decode_returns(output.as_ref(), true)
            .with_context(|| format!("failed to decode return of {}", C::SIGNATURE))
    }
}
