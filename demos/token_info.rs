//! Prints a deployed token's name, id, and balances, the way an operator
//! would inspect a freshly deployed token contract.
//!
//! Usage: `cargo run --example token_info -- <contract-address>` with
//! `NILRS_RPC_URL` (and optionally `NILRS_FAUCET_URL`, `NILRS_SHARD_ID`,
//! `NILRS_PRIVATE_KEY`, `NILRS_TOKEN_ADDRESS`) set in the environment.

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use nilrs::contract::Token;
use nilrs::{
    generate_random_private_key, ClientConfig, ContractReader, FaucetClient, LocalEcdsaKeySigner,
    PublicClient, RpcClient, Signer, SmartAccount,
};

#[tokio::main]
async fn main() -> Result<()> {
    nilrs::init_tracing();

    let token_address = token_address_from_args()?;
    let config = ClientConfig::from_env()?;

    let client = PublicClient::new(RpcClient::new(config.rpc_endpoint())?, config.shard_id());
    let faucet = FaucetClient::new(RpcClient::new(config.faucet_endpoint())?);

    let signer: Arc<dyn Signer> = match config.private_key() {
        Some(key) => Arc::new(LocalEcdsaKeySigner::from_hex(key)?),
        None => Arc::new(LocalEcdsaKeySigner::new(&generate_random_private_key())?),
    };

    let account =
        SmartAccount::initialize_or_deploy(client.clone(), &faucet, signer, U256::ZERO).await?;

    let contract = ContractReader::new(client, token_address);

    let name = contract.read(Token::getTokenNameCall {}).await?;
    println!("Token Name: {}", name._0);

    let id = contract.read(Token::getTokenIdCall {}).await?;
    println!("Token ID: {}", id._0);

    let own_balance = contract.read(Token::getOwnTokenBalanceCall {}).await?;
    let account_balance = contract
        .read(Token::getTokenBalanceOfCall {
            owner: account.address(),
        })
        .await?;
    println!("Token Balance: {} {}", own_balance._0, account_balance._0);

    Ok(())
}

fn token_address_from_args() -> Result<Address> {
    let raw = env::args()
        .nth(1)
        .or_else(|| env::var("NILRS_TOKEN_ADDRESS").ok())
        .context("pass the token contract address as the first argument or set NILRS_TOKEN_ADDRESS")?;
    Address::from_str(raw.trim()).with_context(|| format!("invalid contract address: {raw:?}"))
}
