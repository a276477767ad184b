//! Header validation for the RPC client factory. The caller-supplied mapping
//! is checked for HTTP well-formedness before any transport object exists.

use anyhow::{Context, Result};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

pub(crate) const CLIENT_VERSION_HEADER: &str = "Client-Version";

/// Builds the header map handed to the HTTP transport.
///
/// The mandatory `Client-Version` header is inserted first; caller headers
/// are merged after it, so a caller key that collides with it wins while
/// every non-colliding entry is preserved. An invalid header name or value
/// fails the whole construction.
pub(crate) fn build_headers(
    client_version: &str,
    extra: &BTreeMap<String, String>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(extra.len() + 1);

    let version = HeaderValue::from_str(client_version)
        .context("client_version is not a valid HTTP header value")?;
    headers.insert(CLIENT_VERSION_HEADER, version);

    for (name, value) in extra {
        let name = HeaderName::try_from(name.as_str())
            .with_context(|| format!("invalid HTTP header name: {name:?}"))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for HTTP header {name}"))?;
        headers.insert(name, value);
    }

    Ok(headers)
}
