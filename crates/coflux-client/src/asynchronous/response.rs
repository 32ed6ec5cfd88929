use crate::client::ResponseSpec;
use crate::response::ClientResponse;
use coflux_codec::{to_form_data, MultiValueMap};
use coflux_core::{BridgeError, BridgeResult, PublisherExt, SubscriptionStream};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

/// Body retrieval for a request sent with
/// [`AsyncRequestSpec::retrieve`](super::AsyncRequestSpec::retrieve).
///
/// 4xx and 5xx responses fail with an upstream
/// [`ResponseStatusError`](crate::ResponseStatusError).
#[derive(Debug)]
pub struct AsyncResponseSpec {
    inner: ResponseSpec,
}

impl AsyncResponseSpec {
    pub(crate) fn new(inner: ResponseSpec) -> Self {
        Self { inner }
    }

    /// Sends the request and decodes the body into `T`.
    ///
    /// Resolves to `None` for an empty body. Fails with
    /// [`BridgeError::NoReader`] before reading the body if no reader
    /// handles the response content type and `T`.
    pub async fn body<T>(self) -> BridgeResult<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let body = self.inner.body_to_mono::<T>();
        body.await_first_or_none().await.map_err(BridgeError::flatten)
    }

    /// Sends the request when first polled and decodes one `T` per line.
    ///
    /// Errors arrive on the stream as [`BridgeError::Upstream`]; use
    /// [`BridgeError::flatten`] to recover a wrapped bridge error.
    pub fn body_stream<T>(self) -> SubscriptionStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.inner.body_to_flux::<T>().open_subscription()
    }

    /// The wrapped reactive spec.
    pub fn into_reactive(self) -> ResponseSpec {
        self.inner
    }
}

/// A response received through
/// [`AsyncRequestSpec::exchange`](super::AsyncRequestSpec::exchange).
///
/// No status check is applied. The body can be read once.
#[derive(Debug, Clone)]
pub struct AsyncClientResponse {
    inner: ClientResponse,
}

impl AsyncClientResponse {
    pub(crate) fn new(inner: ClientResponse) -> Self {
        Self { inner }
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Decodes the body into `T`. `None` for an empty body.
    pub async fn body<T>(&self) -> BridgeResult<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.inner.read_body::<T>().await.map_err(BridgeError::flatten)
    }

    /// Decodes a newline-delimited body, one `T` per line.
    pub fn body_stream<T>(&self) -> SubscriptionStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.inner.body_to_flux::<T>().open_subscription()
    }

    /// Reads the body as form data, whatever the declared content type.
    pub async fn form_data(&self) -> BridgeResult<Option<MultiValueMap>> {
        to_form_data(&self.inner, self.inner.readers()).await
    }

    /// The wrapped reactive response.
    pub fn into_inner(self) -> ClientResponse {
        self.inner
    }
}
