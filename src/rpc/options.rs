//! Configurable knobs for the RPC client along with validation helpers so
//! callers can reason about the version header, timeouts, and body limits.

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_HTTP_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 256;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Returns the `<name>/<version>` string stamped into the `Client-Version`
/// header when the caller does not supply one.
pub fn default_client_version() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned()
}

/// Options accepted by the RPC client factory.
///
/// The version string is an explicit field rather than a process-wide
/// constant so tests can substitute it without touching shared state.
/// `headers` defaults to empty and `cancel` to a token that never fires.
#[derive(Debug, Clone)]
pub struct RpcClientOptions {
    pub client_version: String,
    pub headers: BTreeMap<String, String>,
    pub cancel: CancellationToken,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
    pub max_request_body_bytes: usize,
    pub max_response_body_bytes: usize,
}

impl Default for RpcClientOptions {
    fn default() -> Self {
        Self {
            client_version: default_client_version(),
            headers: BTreeMap::new(),
            cancel: CancellationToken::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_request_body_bytes: DEFAULT_HTTP_BODY_LIMIT_BYTES,
            max_response_body_bytes: DEFAULT_HTTP_BODY_LIMIT_BYTES,
        }
    }
}

impl RpcClientOptions {
    /// Convenience constructor for the common "share one cancellation token"
    /// case.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.client_version.trim().is_empty() {
            bail!("client_version cannot be empty");
        }
        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than 0");
        }
        if self.max_concurrent_requests == 0 {
            bail!("max_concurrent_requests must be greater than 0");
        }
        if self.max_request_body_bytes == 0 {
            bail!("max_request_body_bytes must be greater than 0");
        }
        if self.max_response_body_bytes == 0 {
            bail!("max_response_body_bytes must be greater than 0");
        }
        Ok(())
    }
}
