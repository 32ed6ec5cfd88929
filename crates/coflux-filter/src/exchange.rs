//! Per-request state shared by the filters of one chain invocation.

use crate::types::{Request, Response};
use bytes::Bytes;
use coflux_codec::{to_form_data, to_value, HttpInputMessage, MessageReaders, MultiValueMap};
use coflux_core::{BridgeResult, Mono};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri, Version};
use http_body_util::{BodyExt, Full};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// The request, response and attributes of one server request.
///
/// Cloning is cheap and every clone observes the same state, so filters
/// can hand the exchange down the chain and still see what downstream
/// filters wrote to the response.
///
/// # Example
///
/// ```
/// use coflux_filter::ServerWebExchange;
/// use http::{StatusCode, Uri};
///
/// let exchange = ServerWebExchange::builder().uri(Uri::from_static("/orders")).build();
/// exchange.set_status(StatusCode::CREATED);
/// exchange.set_attribute("tenant", "acme".to_string());
///
/// assert_eq!(exchange.uri().path(), "/orders");
/// assert_eq!(exchange.status(), StatusCode::CREATED);
/// assert_eq!(exchange.attribute::<String>("tenant").as_deref().map(String::as_str), Some("acme"));
/// ```
#[derive(Clone)]
pub struct ServerWebExchange {
    inner: Arc<ExchangeInner>,
}

struct ExchangeInner {
    id: Uuid,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    response: Mutex<ResponseState>,
    attributes: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    readers: Arc<MessageReaders>,
}

struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ServerWebExchange {
    /// Starts building an exchange, mostly for tests.
    pub fn builder() -> ExchangeBuilder {
        ExchangeBuilder::default()
    }

    /// Buffers the body of `request` and wraps it.
    pub async fn from_request(request: Request, readers: Arc<MessageReaders>) -> Self {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self::from_parts(parts.method, parts.uri, parts.version, parts.headers, body, readers)
    }

    fn from_parts(
        method: Method,
        uri: Uri,
        version: Version,
        headers: HeaderMap,
        body: Bytes,
        readers: Arc<MessageReaders>,
    ) -> Self {
        Self {
            inner: Arc::new(ExchangeInner {
                id: Uuid::now_v7(),
                method,
                uri,
                version,
                headers,
                body,
                response: Mutex::new(ResponseState {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: Bytes::new(),
                }),
                attributes: Mutex::new(HashMap::new()),
                readers,
            }),
        }
    }

    /// Unique, time-ordered id of this exchange.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// Request HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version
    }

    /// Request headers.
    pub fn request_headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Raw request body.
    pub fn request_body(&self) -> &Bytes {
        &self.inner.body
    }

    /// Reads the request body as form data, whatever its content type.
    pub async fn form_data(&self) -> BridgeResult<Option<MultiValueMap>> {
        to_form_data(self, &self.inner.readers).await
    }

    /// Decodes the request body into `T` using its content type.
    pub async fn body<T>(&self) -> BridgeResult<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        to_value(self, &self.inner.readers).await
    }

    /// Current response status.
    pub fn status(&self) -> StatusCode {
        self.inner.response.lock().status
    }

    /// Sets the response status.
    pub fn set_status(&self, status: StatusCode) {
        self.inner.response.lock().status = status;
    }

    /// A response header value.
    pub fn response_header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.inner.response.lock().headers.get(name).cloned()
    }

    /// Sets a response header, replacing earlier values.
    pub fn set_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.response.lock().headers.insert(name, value);
    }

    /// Edits the response headers.
    pub fn with_response_headers<R>(&self, edit: impl FnOnce(&mut HeaderMap) -> R) -> R {
        edit(&mut self.inner.response.lock().headers)
    }

    /// Sets the response body.
    pub fn set_response_body(&self, body: impl Into<Bytes>) {
        self.inner.response.lock().body = body.into();
    }

    /// A typed attribute, if present with type `T`.
    pub fn attribute<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let value = self.inner.attributes.lock().get(name).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Sets an attribute.
    pub fn set_attribute<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
        self.inner.attributes.lock().insert(name.into(), Arc::new(value));
    }

    /// Removes an attribute, returning true if it existed.
    pub fn remove_attribute(&self, name: &str) -> bool {
        self.inner.attributes.lock().remove(name).is_some()
    }

    /// Snapshot of the response.
    pub fn to_response(&self) -> Response {
        let state = self.inner.response.lock();
        let mut response = Response::new(Full::new(state.body.clone()));
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers.clone();
        response
    }
}

impl HttpInputMessage for ServerWebExchange {
    fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    fn body(&self) -> Mono<Bytes> {
        if self.inner.body.is_empty() {
            Mono::empty()
        } else {
            Mono::just(self.inner.body.clone())
        }
    }
}

impl std::fmt::Debug for ServerWebExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerWebExchange")
            .field("id", &self.inner.id)
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .finish_non_exhaustive()
    }
}

/// Builds a [`ServerWebExchange`] without going through a [`Request`].
#[derive(Debug, Default)]
pub struct ExchangeBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    readers: Option<Arc<MessageReaders>>,
}

impl ExchangeBuilder {
    /// Sets the method. Defaults to GET.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI. Defaults to `/`.
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Appends a request header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the body readers.
    pub fn readers(mut self, readers: Arc<MessageReaders>) -> Self {
        self.readers = Some(readers);
        self
    }

    /// Builds the exchange.
    pub fn build(self) -> ServerWebExchange {
        ServerWebExchange::from_parts(
            self.method,
            self.uri,
            Version::HTTP_11,
            self.headers,
            self.body,
            self.readers
                .unwrap_or_else(|| Arc::new(MessageReaders::defaults())),
        )
    }
}
