//! The request handed to a [`Connector`](crate::Connector).

use bytes::Bytes;
use coflux_codec::MultiValueMap;
use coflux_core::{BridgeError, BridgeResult};
use http::header::{HeaderValue, COOKIE};
use http::{HeaderMap, Method, Uri};
use indexmap::IndexMap;
use std::any::Any;
use std::sync::Arc;

/// Opaque per-request values, visible to connectors but never sent.
pub type Attributes = IndexMap<String, Arc<dyn Any + Send + Sync>>;

/// A fully specified outgoing request.
#[derive(Clone)]
pub struct ClientRequest {
    /// Request method.
    pub method: Method,
    /// Resolved target URI.
    pub uri: Uri,
    /// Request headers, not including cookies.
    pub headers: HeaderMap,
    /// Cookies, sent as a single `Cookie` header.
    pub cookies: MultiValueMap,
    /// Request attributes.
    pub attributes: Attributes,
    /// Request body.
    pub body: Option<Bytes>,
}

impl ClientRequest {
    /// Creates a request without headers or body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            cookies: MultiValueMap::new(),
            attributes: Attributes::new(),
            body: None,
        }
    }

    /// Looks up a typed attribute.
    pub fn attribute<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.attributes.get(name)?.downcast_ref::<T>()
    }

    /// The `Cookie` header value for the accumulated cookies.
    ///
    /// Fails with [`BridgeError::InvalidRequest`] naming the first cookie
    /// that cannot appear in a header.
    pub fn cookie_header(&self) -> BridgeResult<Option<HeaderValue>> {
        cookie_header(&self.cookies)
    }

    /// Headers as they go on the wire, with cookies merged in.
    pub fn wire_headers(&self) -> BridgeResult<HeaderMap> {
        let mut headers = self.headers.clone();
        if let Some(cookie) = self.cookie_header()? {
            headers.insert(COOKIE, cookie);
        }
        Ok(headers)
    }
}

pub(crate) fn cookie_header(cookies: &MultiValueMap) -> BridgeResult<Option<HeaderValue>> {
    if cookies.is_empty() {
        return Ok(None);
    }
    let mut pairs = Vec::new();
    for (name, values) in cookies {
        for value in values {
            let pair = format!("{name}={value}");
            if HeaderValue::from_str(&pair).is_err() {
                return Err(BridgeError::invalid_request(format!("invalid value for cookie '{name}'")));
            }
            pairs.push(pair);
        }
    }
    HeaderValue::from_str(&pairs.join("; "))
        .map(Some)
        .map_err(|e| BridgeError::invalid_request(format!("invalid cookie header: {e}")))
}

impl std::fmt::Debug for ClientRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("body", &self.body.as_ref().map(Bytes::len))
            .finish()
    }
}
