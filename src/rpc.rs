//! JSON-RPC client plumbing: the client factory, header validation,
//! per-client options, and request metrics.

pub mod client;
pub mod headers;
pub mod metrics;
pub mod options;

pub use client::{RpcClient, RpcError};
pub use metrics::RpcMetricsSnapshot;
pub use options::{default_client_version, RpcClientOptions};
