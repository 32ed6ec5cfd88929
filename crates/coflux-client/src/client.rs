//! The reactive web client.
//!
//! [`WebClient`] builds requests through [`RequestSpec`] and executes them
//! through its [`Connector`]. Execution results are lazy publishers: a
//! `Mono<ClientResponse>` from [`RequestSpec::exchange`], or a
//! [`ResponseSpec`] from [`RequestSpec::retrieve`] that turns 4xx/5xx
//! responses into [`ResponseStatusError`]s.

use crate::asynchronous::AsyncWebClient;
use crate::connector::Connector;
use crate::error::ResponseStatusError;
use crate::net::HttpConnector;
use crate::request::{Attributes, ClientRequest};
use crate::response::ClientResponse;
use crate::spec::{RequestBodySpec, RequestHeadersSpec, UriSpec};
use crate::uri;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use coflux_codec::MultiValueMap;
use coflux_config::ClientConfig;
use coflux_core::{BridgeError, BridgeResult, Flux, Mono, PublisherExt, UpstreamError};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use http::header::{
    HeaderName, HeaderValue, ACCEPT, ACCEPT_CHARSET, CONTENT_LENGTH, CONTENT_TYPE, IF_MODIFIED_SINCE,
    IF_NONE_MATCH, USER_AGENT,
};
use http::{HeaderMap, Method, Uri};
use mime::Mime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const DEFAULT_USER_AGENT: &str = concat!("coflux/", env!("CARGO_PKG_VERSION"));

/// A reactive HTTP client.
///
/// Cheap to clone; clones share the connector and configuration.
///
/// # Example
///
/// ```
/// use coflux_client::{ClientResponse, FnConnector, UriSpec, WebClient};
/// use coflux_core::{PublisherExt, UpstreamError};
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let client = WebClient::builder()
///     .base_url("http://api.test")
///     .connector(FnConnector::new(|_request| async {
///         Ok::<_, UpstreamError>(ClientResponse::builder(StatusCode::OK).body("pong").build())
///     }))
///     .build()
///     .unwrap();
///
/// let body = client
///     .get()
///     .uri("/ping", &[])
///     .retrieve()
///     .body_to_mono::<String>()
///     .await_first_or_none()
///     .await
///     .unwrap();
/// assert_eq!(body.as_deref(), Some("pong"));
/// # });
/// ```
#[derive(Clone)]
pub struct WebClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    connector: Arc<dyn Connector>,
    base_url: Option<Uri>,
    default_headers: HeaderMap,
    readers: Arc<coflux_codec::MessageReaders>,
}

impl WebClient {
    /// Starts configuring a client.
    pub fn builder() -> WebClientBuilder {
        WebClientBuilder::default()
    }

    /// A client with default settings over `connector`.
    pub fn new<C: Connector + 'static>(connector: C) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        Self {
            inner: Arc::new(ClientInner {
                connector: Arc::new(connector),
                base_url: None,
                default_headers,
                readers: Arc::new(coflux_codec::MessageReaders::defaults()),
            }),
        }
    }

    /// Base URL that relative URIs resolve against.
    pub fn base_url(&self) -> Option<&Uri> {
        self.inner.base_url.as_ref()
    }

    /// Headers added to every request that does not set them.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.inner.default_headers
    }

    /// Readers used to decode response bodies.
    pub fn readers(&self) -> &Arc<coflux_codec::MessageReaders> {
        &self.inner.readers
    }

    /// Starts a GET request.
    pub fn get(&self) -> RequestSpec {
        self.method(Method::GET)
    }

    /// Starts a HEAD request.
    pub fn head(&self) -> RequestSpec {
        self.method(Method::HEAD)
    }

    /// Starts a POST request.
    pub fn post(&self) -> RequestSpec {
        self.method(Method::POST)
    }

    /// Starts a PUT request.
    pub fn put(&self) -> RequestSpec {
        self.method(Method::PUT)
    }

    /// Starts a PATCH request.
    pub fn patch(&self) -> RequestSpec {
        self.method(Method::PATCH)
    }

    /// Starts a DELETE request.
    pub fn delete(&self) -> RequestSpec {
        self.method(Method::DELETE)
    }

    /// Starts an OPTIONS request.
    pub fn options(&self) -> RequestSpec {
        self.method(Method::OPTIONS)
    }

    /// Starts a request with any method.
    pub fn method(&self, method: Method) -> RequestSpec {
        RequestSpec::new(self.clone(), method)
    }

    /// The async/await view of this client.
    pub fn into_async(self) -> AsyncWebClient {
        AsyncWebClient::new(self)
    }

    fn dispatch(&self, request: ClientRequest) -> Mono<ClientResponse> {
        let readers = Arc::clone(&self.inner.readers);
        self.inner
            .connector
            .execute(request)
            .map(move |response| response.with_readers(Arc::clone(&readers)))
    }
}

impl std::fmt::Debug for WebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebClient")
            .field("base_url", &self.inner.base_url)
            .field("default_headers", &self.inner.default_headers)
            .finish_non_exhaustive()
    }
}

/// Configures a [`WebClient`].
#[derive(Default)]
pub struct WebClientBuilder {
    connector: Option<Arc<dyn Connector>>,
    base_url: Option<String>,
    default_headers: Vec<(String, String)>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    readers: Option<coflux_codec::MessageReaders>,
}

impl WebClientBuilder {
    /// Applies the `[client]` configuration section.
    pub fn config(mut self, config: &ClientConfig) -> Self {
        if let Some(base_url) = &config.base_url {
            self.base_url = Some(base_url.clone());
        }
        self.default_headers.extend(
            config
                .default_headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        self.user_agent = Some(config.user_agent.clone());
        self.timeout = config.timeout_ms.map(Duration::from_millis);
        self
    }

    /// Executes requests through `connector` instead of the network.
    pub fn connector<C: Connector + 'static>(mut self, connector: C) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a default header.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the network timeout. Only used by the default connector.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the default readers.
    pub fn readers(mut self, readers: coflux_codec::MessageReaders) -> Self {
        self.readers = Some(readers);
        self
    }

    /// Builds the client.
    ///
    /// Fails with [`BridgeError::InvalidRequest`] for an unparsable base
    /// URL or default header.
    pub fn build(self) -> BridgeResult<WebClient> {
        let base_url = self
            .base_url
            .map(|raw| {
                raw.parse::<Uri>()
                    .map_err(|e| BridgeError::invalid_request(format!("invalid base URL '{raw}': {e}")))
            })
            .transpose()?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let (name, value) = parse_header(name, value)?;
            default_headers.append(name, value);
        }
        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let (name, value) = parse_header(USER_AGENT.as_str(), user_agent)?;
        default_headers.insert(name, value);

        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(HttpConnector::new(self.timeout)?),
        };

        tracing::debug!(base_url = ?base_url, "web client built");
        Ok(WebClient {
            inner: Arc::new(ClientInner {
                connector,
                base_url,
                default_headers,
                readers: Arc::new(self.readers.unwrap_or_default()),
            }),
        })
    }
}

impl std::fmt::Debug for WebClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebClientBuilder")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn parse_header(name: &str, value: &str) -> BridgeResult<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| BridgeError::invalid_request(format!("invalid header name '{name}'")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| BridgeError::invalid_request(format!("invalid value for header '{name}'")))?;
    Ok((name, value))
}

/// A request being configured.
///
/// Implements [`UriSpec`], [`RequestHeadersSpec`] and [`RequestBodySpec`].
/// The first invalid input is kept and reported by
/// [`exchange`](Self::exchange) or [`retrieve`](Self::retrieve).
pub struct RequestSpec {
    client: WebClient,
    method: Method,
    uri: Option<Uri>,
    headers: HeaderMap,
    cookies: MultiValueMap,
    attributes: Attributes,
    body: Option<Bytes>,
    error: Option<BridgeError>,
}

impl RequestSpec {
    fn new(client: WebClient, method: Method) -> Self {
        Self {
            client,
            method,
            uri: None,
            headers: HeaderMap::new(),
            cookies: MultiValueMap::new(),
            attributes: Attributes::new(),
            body: None,
            error: None,
        }
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Headers configured so far.
    pub fn configured_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Executes the request and publishes the raw response.
    pub fn exchange(self) -> Mono<ClientResponse> {
        let (client, request) = self.into_request();
        match request {
            Ok(request) => client.dispatch(request),
            Err(error) => Mono::error(error.into_upstream()),
        }
    }

    /// Executes the request and publishes its body, failing on 4xx/5xx.
    pub fn retrieve(self) -> ResponseSpec {
        let method = self.method.clone();
        let (client, request) = self.into_request();
        match request {
            Ok(request) => {
                let uri = request.uri.clone();
                ResponseSpec::new(client.dispatch(request), method, uri)
            }
            Err(error) => ResponseSpec::new(Mono::error(error.into_upstream()), method, Uri::default()),
        }
    }

    fn into_request(self) -> (WebClient, BridgeResult<ClientRequest>) {
        let Self {
            client,
            method,
            uri,
            mut headers,
            cookies,
            attributes,
            body,
            error,
        } = self;

        if let Some(error) = error {
            return (client, Err(error));
        }
        let Some(uri) = uri.or_else(|| client.inner.base_url.clone()) else {
            return (client, Err(BridgeError::invalid_request("no URI was specified")));
        };

        for name in client.inner.default_headers.keys() {
            if !headers.contains_key(name) {
                for value in client.inner.default_headers.get_all(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        let request = ClientRequest {
            method,
            uri,
            headers,
            cookies,
            attributes,
            body,
        };
        (client, Ok(request))
    }

    fn reject(mut self, message: impl Into<String>) -> Self {
        if self.error.is_none() {
            self.error = Some(BridgeError::invalid_request(message));
        }
        self
    }

    fn check_cookies(mut self) -> Self {
        if self.error.is_none() {
            if let Err(error) = crate::request::cookie_header(&self.cookies) {
                self.error = Some(error);
            }
        }
        self
    }

    fn resolve(mut self, expanded: &str) -> Self {
        match uri::resolve(self.client.inner.base_url.as_ref(), expanded) {
            Ok(uri) => {
                self.uri = Some(uri);
                self
            }
            Err(message) => self.reject(message),
        }
    }

    fn insert(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
                self
            }
            Err(_) => self.reject(format!("invalid value for header '{name}'")),
        }
    }
}

impl UriSpec for RequestSpec {
    fn uri(self, template: &str, variables: &[&dyn Display]) -> Self {
        match uri::expand_positional(template, variables) {
            Ok(expanded) => self.resolve(&expanded),
            Err(message) => self.reject(message),
        }
    }

    fn uri_with_map<K, V>(self, template: &str, variables: &HashMap<K, V>) -> Self
    where
        K: Borrow<str> + Hash + Eq,
        V: Display,
    {
        match uri::expand_named(template, |name| variables.get(name).map(ToString::to_string)) {
            Ok(expanded) => self.resolve(&expanded),
            Err(message) => self.reject(message),
        }
    }

    fn uri_literal(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }
}

impl RequestHeadersSpec for RequestSpec {
    fn accept(self, media_types: &[Mime]) -> Self {
        let value = media_types
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(", ");
        self.insert(ACCEPT, &value)
    }

    fn accept_charset(self, charsets: &[&str]) -> Self {
        self.insert(ACCEPT_CHARSET, &charsets.join(", "))
    }

    fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self.check_cookies()
    }

    fn cookies<F>(mut self, edit: F) -> Self
    where
        F: FnOnce(&mut MultiValueMap),
    {
        edit(&mut self.cookies);
        self.check_cookies()
    }

    fn if_modified_since(self, since: DateTime<Utc>) -> Self {
        let value = httpdate::fmt_http_date(SystemTime::from(since));
        self.insert(IF_MODIFIED_SINCE, &value)
    }

    fn if_none_match(self, etags: &[&str]) -> Self {
        self.insert(IF_NONE_MATCH, &etags.join(", "))
    }

    fn header(mut self, name: &str, values: &[&str]) -> Self {
        let Ok(header) = HeaderName::from_bytes(name.as_bytes()) else {
            return self.reject(format!("invalid header name '{name}'"));
        };
        self.headers.remove(&header);
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    self.headers.append(header.clone(), value);
                }
                Err(_) => return self.reject(format!("invalid value for header '{header}'")),
            }
        }
        self
    }

    fn headers<F>(mut self, edit: F) -> Self
    where
        F: FnOnce(&mut HeaderMap),
    {
        edit(&mut self.headers);
        self
    }

    fn attribute<V>(mut self, name: &str, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        self.attributes.insert(name.to_string(), Arc::new(value));
        self
    }

    fn attributes<F>(mut self, edit: F) -> Self
    where
        F: FnOnce(&mut Attributes),
    {
        edit(&mut self.attributes);
        self
    }
}

impl RequestBodySpec for RequestSpec {
    fn content_type(self, media_type: &Mime) -> Self {
        self.insert(CONTENT_TYPE, media_type.as_ref())
    }

    fn content_length(mut self, length: u64) -> Self {
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        self
    }

    fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn json<T>(mut self, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_vec(value) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                if self.headers.contains_key(CONTENT_TYPE) {
                    self
                } else {
                    self.content_type(&mime::APPLICATION_JSON)
                }
            }
            Err(e) => self.reject(format!("failed to encode JSON body: {e}")),
        }
    }

    fn form(mut self, form: &MultiValueMap) -> Self {
        let pairs: Vec<(&str, &str)> = form
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (name.as_str(), value.as_str())))
            .collect();
        match serde_urlencoded::to_string(pairs) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                self.content_type(&mime::APPLICATION_WWW_FORM_URLENCODED)
            }
            Err(e) => self.reject(format!("failed to encode form body: {e}")),
        }
    }
}

impl std::fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// The response side of [`RequestSpec::retrieve`].
///
/// Each body publisher checks the status first: 4xx and 5xx responses
/// signal a [`ResponseStatusError`] carrying the aggregated error body.
pub struct ResponseSpec {
    response: Mono<ClientResponse>,
    method: Method,
    uri: Uri,
}

impl ResponseSpec {
    fn new(response: Mono<ClientResponse>, method: Method, uri: Uri) -> Self {
        Self { response, method, uri }
    }

    /// Publishes the decoded body, or completes empty for an empty body.
    pub fn body_to_mono<T>(self) -> Mono<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let Self { response, method, uri } = self;
        Mono::from_optional_future(async move {
            match checked(response, method, uri).await? {
                Some(response) => response
                    .read_body::<T>()
                    .await
                    .map_err(BridgeError::into_upstream),
                None => Ok(None),
            }
        })
    }

    /// Publishes one decoded value per line of a newline-delimited body.
    pub fn body_to_flux<T>(self) -> Flux<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let Self { response, method, uri } = self;
        let values = stream::once(checked(response, method, uri))
            .map_ok(|response| match response {
                Some(response) => response
                    .body_to_flux::<T>()
                    .open_subscription()
                    .map_err(BridgeError::into_upstream)
                    .left_stream(),
                None => stream::empty().right_stream(),
            })
            .try_flatten();
        Flux::from_stream(values)
    }
}

impl std::fmt::Debug for ResponseSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseSpec")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}

async fn checked(
    response: Mono<ClientResponse>,
    method: Method,
    uri: Uri,
) -> Result<Option<ClientResponse>, UpstreamError> {
    let response = response
        .await_first_or_none()
        .await
        .map_err(BridgeError::into_upstream)?;
    let Some(response) = response else {
        return Ok(None);
    };

    let status = response.status();
    tracing::debug!(%status, %method, %uri, "response received");
    if status.is_client_error() || status.is_server_error() {
        let body = response
            .aggregate()
            .await
            .map_err(BridgeError::into_upstream)?
            .unwrap_or_default();
        return Err(Arc::new(ResponseStatusError {
            status,
            headers: response.headers().clone(),
            body,
            method,
            uri,
        }));
    }
    Ok(Some(response))
}
