//! RPC client implementation: wires validated headers, an HTTP transport,
//! and a shared cancellation token into a ready-to-use JSON-RPC client.
//! Construction performs no network I/O and mutates no global state.

use crate::rpc::headers::build_headers;
use crate::rpc::metrics::{RpcMetrics, RpcMetricsSnapshot};
use crate::rpc::options::RpcClientOptions;
use anyhow::{anyhow, Context, Result};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::traits::ToRpcParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum RpcError {
    Cancelled { method: &'static str },
    Timeout { method: &'static str },
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcError::Cancelled { method } => {
                write!(f, "rpc method {method} was cancelled")
            }
            RpcError::Timeout { method } => write!(f, "rpc method {method} timed out"),
        }
    }
}

impl std::error::Error for RpcError {}

/// A JSON-RPC client bound to a single HTTP endpoint.
///
/// Cloning is cheap and clones share the transport, metrics, and
/// cancellation token. The client holds no mutable per-request state, so it
/// may issue any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct RpcClient {
    endpoint: Arc<String>,
    client: HttpClient,
    options: RpcClientOptions,
    metrics: Arc<RpcMetrics>,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_options(endpoint, RpcClientOptions::default())
    }

    /// Builds a client from explicit options.
    ///
    /// Options and the header mapping are validated before the transport is
    /// created; on failure no partially constructed client escapes.
    pub fn with_options(endpoint: impl Into<String>, options: RpcClientOptions) -> Result<Self> {
        options.validate()?;

        let endpoint = endpoint.into();
        let headers = build_headers(&options.client_version, &options.headers)?;
        let max_request_body_size = options.max_request_body_bytes.min(u32::MAX as usize) as u32;
        let max_response_body_size = options.max_response_body_bytes.min(u32::MAX as usize) as u32;

        let client = HttpClientBuilder::default()
            .set_headers(headers)
            .request_timeout(options.request_timeout)
            .max_concurrent_requests(options.max_concurrent_requests)
            .max_request_size(max_request_body_size)
            .max_response_size(max_response_body_size)
            .build(&endpoint)
            .map_err(|err| anyhow!("failed to build RPC client: {err}"))?;

        Ok(Self {
            endpoint: Arc::new(endpoint),
            client,
            options,
            metrics: Arc::new(RpcMetrics::default()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn client_version(&self) -> &str {
        &self.options.client_version
    }

    /// The token shared by every request issued through this transport.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.options.cancel
    }

    pub fn metrics(&self) -> RpcMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Issues a JSON-RPC request and deserializes its result.
    ///
    /// A triggered cancellation token short-circuits before anything is
    /// dispatched; an in-flight request races the token and resolves to
    /// [`RpcError::Cancelled`] once it fires. Transport and server errors
    /// propagate to the caller.
    pub async fn request<R, P>(&self, method: &'static str, params: P) -> Result<R>
    where
        R: DeserializeOwned,
        P: ToRpcParams + Send,
    {
        if self.options.cancel.is_cancelled() {
            self.metrics.record_cancelled();
            return Err(RpcError::Cancelled { method }.into());
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            _ = self.options.cancel.cancelled() => {
                self.metrics.record_cancelled();
                tracing::debug!(method, "rpc call cancelled");
                return Err(RpcError::Cancelled { method }.into());
            }
            outcome = timeout(
                self.options.request_timeout,
                self.client.request::<R, P>(method, params),
            ) => outcome,
        };

        match outcome {
            Ok(Ok(value)) => {
                self.metrics.record_success(start.elapsed());
                tracing::trace!(method, "rpc call completed");
                Ok(value)
            }
            Ok(Err(err)) => {
                self.metrics.record_failure(start.elapsed());
                Err(anyhow::Error::new(err)).with_context(|| format!("rpc {method} call failed"))
            }
            Err(_) => {
                self.metrics.record_timeout(start.elapsed());
                Err(RpcError::Timeout { method }.into())
            }
        }
    }

    /// Issues a JSON-RPC notification (no response expected).
    pub async fn notify<P>(&self, method: &'static str, params: P) -> Result<()>
    where
        P: ToRpcParams + Send,
    {
        if self.options.cancel.is_cancelled() {
            self.metrics.record_cancelled();
            return Err(RpcError::Cancelled { method }.into());
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            _ = self.options.cancel.cancelled() => {
                self.metrics.record_cancelled();
                return Err(RpcError::Cancelled { method }.into());
            }
            outcome = timeout(
                self.options.request_timeout,
                self.client.notification(method, params),
            ) => outcome,
        };

        match outcome {
            Ok(Ok(())) => {
                self.metrics.record_success(start.elapsed());
                Ok(())
            }
            Ok(Err(err)) => {
                self.metrics.record_failure(start.elapsed());
                Err(anyhow::Error::new(err))
                    .with_context(|| format!("rpc {method} notification failed"))
            }
            Err(_) => {
                self.metrics.record_timeout(start.elapsed());
                Err(RpcError::Timeout { method }.into())
            }
        }
    }
}
