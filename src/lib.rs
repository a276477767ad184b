pub mod account;
pub mod clients;
pub mod config;
pub mod contract;
pub mod encoding;
pub mod rpc;
pub mod signer;
pub mod telemetry;
pub mod types;

pub use account::{derive_address, SmartAccount, DEFAULT_DEPLOY_FUNDING_WEI};
pub use clients::faucet::{FaucetClient, FaucetError, TopUpRequest, BASE_TOKEN};
pub use clients::public::PublicClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use contract::{ContractReader, Token};
pub use encoding::ExternalTransaction;
pub use rpc::{default_client_version, RpcClient, RpcClientOptions, RpcError, RpcMetricsSnapshot};
pub use signer::{
    generate_random_private_key, LocalEcdsaKeySigner, RecoverableSignature, Signer,
};
pub use telemetry::init_tracing;
pub use types::{
    convert_eth_to_wei, BlockRef, CallArgs, ShardId, TokenId, TxReceipt,
};
