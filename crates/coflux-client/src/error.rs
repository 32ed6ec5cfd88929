//! Client error types.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use thiserror::Error;

/// A 4xx or 5xx response observed through [`ResponseSpec`](crate::ResponseSpec).
///
/// Raised through the error channel, so the async adapter surfaces it as
/// [`BridgeError::Upstream`](coflux_core::BridgeError::Upstream). Use
/// [`ResponseStatusError::from_bridge`] to get it back.
#[derive(Debug, Clone, Error)]
#[error("{status} from {method} {uri}")]
pub struct ResponseStatusError {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Aggregated response body.
    pub body: Bytes,
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
}

impl ResponseStatusError {
    /// Returns true for 4xx statuses.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Returns true for 5xx statuses.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// The body as UTF-8 text, if it is valid.
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Finds a status error inside a bridge error.
    pub fn from_bridge(error: &coflux_core::BridgeError) -> Option<&Self> {
        error.as_upstream()?.downcast_ref::<Self>()
    }
}

/// Network failure reported by [`HttpConnector`](crate::HttpConnector).
#[derive(Debug, Error)]
#[error("request to {uri} failed: {source}")]
pub struct ConnectError {
    /// Request URI.
    pub uri: Uri,
    /// Underlying client error.
    #[source]
    pub source: reqwest::Error,
}
