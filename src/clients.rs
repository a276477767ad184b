//! Typed clients layered over the raw RPC transport: the read/submit
//! `PublicClient` and the token-dispensing `FaucetClient`.

pub mod faucet;
pub mod public;

pub use faucet::{FaucetClient, TopUpRequest, BASE_TOKEN};
pub use public::PublicClient;
