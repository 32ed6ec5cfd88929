//! Responses produced by a [`Connector`](crate::Connector).

use bytes::{Bytes, BytesMut};
use coflux_codec::{media, to_value, HttpInputMessage, MessageReaders, TargetType};
use coflux_core::{BridgeError, BridgeResult, Flux, Mono, PublisherExt};
use futures_util::future;
use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use mime::Mime;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A received response with a streaming body.
///
/// The body can be consumed once. Cloning the response shares the same
/// body, so a second consumer observes
/// [`BridgeError::AlreadySubscribed`].
#[derive(Clone)]
pub struct ClientResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Arc<Flux<Bytes>>,
    readers: Arc<MessageReaders>,
}

impl ClientResponse {
    /// Creates a response over a body publisher.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Flux<Bytes>, readers: Arc<MessageReaders>) -> Self {
        Self {
            status,
            headers,
            body: Arc::new(body),
            readers,
        }
    }

    /// Starts building an in-memory response.
    pub fn builder(status: StatusCode) -> ClientResponseBuilder {
        ClientResponseBuilder {
            status,
            headers: HeaderMap::new(),
            body: None,
            readers: None,
        }
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Declared content type, `application/octet-stream` when absent.
    pub fn content_type(&self) -> Mime {
        media::content_type(&self.headers)
    }

    /// Readers used to decode the body.
    pub fn readers(&self) -> &Arc<MessageReaders> {
        &self.readers
    }

    /// Replaces the readers used to decode the body.
    pub fn with_readers(mut self, readers: Arc<MessageReaders>) -> Self {
        self.readers = readers;
        self
    }

    /// The raw body publisher.
    pub fn body_publisher(&self) -> &Flux<Bytes> {
        &self.body
    }

    /// Collects the whole body. `None` for an empty body.
    pub async fn aggregate(&self) -> BridgeResult<Option<Bytes>> {
        aggregate(&self.body).await
    }

    /// Decodes the whole body into `T` with the reader chosen for the
    /// content type. The reader is chosen before the body is read.
    pub async fn read_body<T>(&self) -> BridgeResult<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        to_value(self, &self.readers).await
    }

    /// Lazily decodes the whole body into `T`.
    pub fn body_to_mono<T>(&self) -> Mono<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.clone();
        Mono::from_optional_future(async move {
            response
                .read_body::<T>()
                .await
                .map_err(BridgeError::into_upstream)
        })
    }

    /// Lazily decodes a newline-delimited body, one `T` per non-empty line.
    pub fn body_to_flux<T>(&self) -> Flux<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let media_type = self.content_type();
        let readers = Arc::clone(&self.readers);
        let body = Arc::clone(&self.body);

        let decoded = stream::once(async move {
            readers.find(&TargetType::of::<T>(), &media_type)?;
            Ok::<_, BridgeError>(
                lines(body.open_subscription()).map(move |line| readers.read::<T>(&media_type, line?)),
            )
        })
        .try_flatten()
        .try_filter_map(|value| future::ready(Ok(value)))
        .map_err(BridgeError::into_upstream);

        Flux::from_stream(decoded)
    }
}

impl HttpInputMessage for ClientResponse {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> Mono<Bytes> {
        let body = Arc::clone(&self.body);
        Mono::from_optional_future(async move { aggregate(&body).await.map_err(BridgeError::into_upstream) })
    }
}

impl std::fmt::Debug for ClientResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

async fn aggregate(body: &Flux<Bytes>) -> BridgeResult<Option<Bytes>> {
    let mut chunks = body.open_subscription();
    let mut buffer = BytesMut::new();
    while let Some(chunk) = chunks.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok((!buffer.is_empty()).then(|| buffer.freeze()))
}

/// Splits a chunked body on `\n`, dropping a trailing `\r`.
fn lines<S>(chunks: S) -> impl Stream<Item = BridgeResult<Bytes>> + Send
where
    S: Stream<Item = BridgeResult<Bytes>> + Send + Unpin,
{
    stream::unfold(
        (chunks, BytesMut::new(), false),
        |(mut chunks, mut buffer, mut done)| async move {
            loop {
                if let Some(end) = buffer.iter().position(|b| *b == b'\n') {
                    let mut line = buffer.split_to(end + 1);
                    line.truncate(end);
                    if line.last() == Some(&b'\r') {
                        line.truncate(end - 1);
                    }
                    return Some((Ok(line.freeze()), (chunks, buffer, done)));
                }
                if done {
                    if buffer.is_empty() {
                        return None;
                    }
                    let rest = buffer.split().freeze();
                    return Some((Ok(rest), (chunks, buffer, done)));
                }
                match chunks.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(err)) => {
                        buffer.clear();
                        return Some((Err(err), (chunks, buffer, true)));
                    }
                    None => done = true,
                }
            }
        },
    )
}

/// Builds in-memory [`ClientResponse`]s, typically inside an
/// [`FnConnector`](crate::FnConnector).
#[derive(Debug)]
pub struct ClientResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Flux<Bytes>>,
    readers: Option<Arc<MessageReaders>>,
}

impl ClientResponseBuilder {
    /// Appends a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the content type.
    pub fn content_type(mut self, media_type: &Mime) -> Self {
        if let Ok(value) = HeaderValue::from_str(media_type.as_ref()) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self
    }

    /// Uses `body` as a single-chunk body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = Some(Flux::from_iter(vec![body]));
        self
    }

    /// Uses a chunked body.
    pub fn body_publisher(mut self, body: Flux<Bytes>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the readers. Defaults to [`MessageReaders::defaults`].
    pub fn readers(mut self, readers: Arc<MessageReaders>) -> Self {
        self.readers = Some(readers);
        self
    }

    /// Builds the response. Without a body it completes empty.
    pub fn build(self) -> ClientResponse {
        ClientResponse::new(
            self.status,
            self.headers,
            self.body.unwrap_or_else(Flux::empty),
            self.readers
                .unwrap_or_else(|| Arc::new(MessageReaders::defaults())),
        )
    }
}
