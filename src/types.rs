//! Chain-level primitives shared across the typed clients: shard ids, block
//! references, token ids, receipts, and call arguments.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize, Serializer};

const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Identifier of the shard an address lives on. The id occupies the top two
/// bytes of every address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardId(pub u16);

impl ShardId {
    /// The coordination shard. User accounts live on shards >= 1.
    pub const MAIN: ShardId = ShardId(0);

    /// Extracts the shard id embedded in an address.
    pub fn of_address(address: &Address) -> ShardId {
        let bytes = address.as_slice();
        ShardId(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Returns `address` with this shard id stamped into its top two bytes.
    pub fn stamp(self, address: Address) -> Address {
        let mut bytes = address.into_array();
        bytes[..2].copy_from_slice(&self.0.to_be_bytes());
        Address::from(bytes)
    }
}

impl std::fmt::Display for ShardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to the block a read-only query is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Latest,
    Earliest,
    Pending,
    Number(u64),
    Hash(B256),
}

impl Serialize for BlockRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockRef::Latest => serializer.serialize_str("latest"),
            BlockRef::Earliest => serializer.serialize_str("earliest"),
            BlockRef::Pending => serializer.serialize_str("pending"),
            BlockRef::Number(number) => serializer.serialize_u64(*number),
            BlockRef::Hash(hash) => serializer.collect_str(hash),
        }
    }
}

/// Identifier of a fungible token. Token ids coincide with the address of
/// the faucet/minter contract that issues the token.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenId(pub Address);

impl From<Address> for TokenId {
    fn from(address: Address) -> Self {
        TokenId(address)
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution receipt for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub success: bool,
    pub gas_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Arguments for a read-only contract call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgs {
    pub to: Address,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_limit: Option<U256>,
}

/// Converts a decimal amount of the base token into its wei representation.
///
/// Precision follows from `f64`: amounts with more than ~15 significant
/// digits lose the tail, which is acceptable for the faucet-sized values
/// this helper exists for.
pub fn convert_eth_to_wei(eth: f64) -> U256 {
    let wei = eth * WEI_PER_ETH as f64;
    U256::from(wei.round() as u128)
}
