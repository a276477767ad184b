use crate::types::ShardId;
use anyhow::{bail, Context, Result};
use std::env;

const ENV_RPC_URL: &str = "NILRS_RPC_URL";
const ENV_FAUCET_URL: &str = "NILRS_FAUCET_URL";
const ENV_SHARD_ID: &str = "NILRS_SHARD_ID";
const ENV_PRIVATE_KEY: &str = "NILRS_PRIVATE_KEY";

const DEFAULT_SHARD_ID: u16 = 1;

/// Top-level SDK configuration.
///
/// Instances must come out of [`ClientConfig::builder`] or
/// [`ClientConfig::from_env`] so invariants are validated before any
/// consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    rpc_endpoint: String,
    faucet_endpoint: String,
    shard_id: ShardId,
    private_key: Option<String>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Loads configuration from `NILRS_*` environment variables.
    ///
    /// `NILRS_RPC_URL` is required; the faucet endpoint defaults to the RPC
    /// endpoint and the shard id to 1.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder().rpc_endpoint(
            env::var(ENV_RPC_URL).context("NILRS_RPC_URL must point at an RPC endpoint")?,
        );

        if let Ok(faucet) = env::var(ENV_FAUCET_URL) {
            builder = builder.faucet_endpoint(faucet);
        }
        if let Ok(shard) = env::var(ENV_SHARD_ID) {
            let id: u16 = shard
                .trim()
                .parse()
                .with_context(|| format!("NILRS_SHARD_ID is not a shard id: {shard:?}"))?;
            builder = builder.shard_id(ShardId(id));
        }
        if let Ok(key) = env::var(ENV_PRIVATE_KEY) {
            builder = builder.private_key(key);
        }

        builder.build()
    }

    pub fn rpc_endpoint(&self) -> &str {
        &self.rpc_endpoint
    }

    pub fn faucet_endpoint(&self) -> &str {
        &self.faucet_endpoint
    }

    pub fn shard_id(&self) -> ShardId {
        self.shard_id
    }

    /// Hex-encoded private key, when the environment supplies one.
    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }

    pub fn validate(&self) -> Result<()> {
        validate_url(&self.rpc_endpoint, "rpc_endpoint")?;
        validate_url(&self.faucet_endpoint, "faucet_endpoint")?;
        if let Some(key) = &self.private_key {
            if key.trim().is_empty() {
                bail!("private_key cannot be empty when set");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct ClientConfigBuilder {
    rpc_endpoint: Option<String>,
    faucet_endpoint: Option<String>,
    shard_id: Option<ShardId>,
    private_key: Option<String>,
}

impl ClientConfigBuilder {
    pub fn rpc_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.rpc_endpoint = Some(endpoint.into());
        self
    }

    pub fn faucet_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.faucet_endpoint = Some(endpoint.into());
        self
    }

    pub fn shard_id(mut self, shard_id: ShardId) -> Self {
        self.shard_id = Some(shard_id);
        self
    }

    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let rpc_endpoint = trimmed(self.rpc_endpoint.context("rpc_endpoint is required")?);
        let faucet_endpoint = self
            .faucet_endpoint
            .map(trimmed)
            .unwrap_or_else(|| rpc_endpoint.clone());

        let config = ClientConfig {
            rpc_endpoint,
            faucet_endpoint,
            shard_id: self.shard_id.unwrap_or(ShardId(DEFAULT_SHARD_ID)),
            private_key: self.private_key,
        };

        config.validate()?;
        Ok(config)
    }
}

fn trimmed(value: String) -> String {
    value.trim().to_owned()
}

fn validate_url(url: &str, field: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("{field} must start with http:// or https://");
    }
    Ok(())
}
