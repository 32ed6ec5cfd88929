//! Reactive filter chain.
//!
//! Filters and handlers return a `Mono<()>` completion handle that
//! completes when their work is done and signals an error if it failed.
//! Calling [`WebFilter::filter`] only builds the handle; work starts when
//! the handle is subscribed.
//!
//! ```text
//! request -> filter[0] -> filter[1] -> ... -> handler
//!               |            |
//!               +-- chain.filter(exchange) invokes the next element
//! ```

use crate::exchange::ServerWebExchange;
use crate::types::{Request, Response};
use bytes::Bytes;
use coflux_codec::MessageReaders;
use coflux_core::{Mono, PublisherExt, UpstreamError};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use std::future::Future;
use std::sync::Arc;

/// A shared handle to the rest of a filter chain.
pub type SharedChain = Arc<dyn WebFilterChain>;

/// A request filter.
///
/// # Invariants
///
/// - The returned handle must not do any work before it is subscribed.
/// - A filter that continues the chain does so through `chain` exactly
///   once and completes only after the chain's handle completes.
pub trait WebFilter: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Filters `exchange`, optionally delegating to `chain`.
    fn filter(&self, exchange: ServerWebExchange, chain: SharedChain) -> Mono<()>;
}

/// The remainder of a filter chain.
pub trait WebFilterChain: Send + Sync {
    /// Invokes the next filter, or the handler at the end of the chain.
    fn filter(&self, exchange: ServerWebExchange) -> Mono<()>;
}

/// The end of a filter chain.
pub trait WebHandler: Send + Sync {
    /// Handles `exchange`, writing its response.
    fn handle(&self, exchange: ServerWebExchange) -> Mono<()>;
}

/// Index-based chain over a fixed list of filters.
#[derive(Clone)]
pub struct DefaultWebFilterChain {
    filters: Arc<[Arc<dyn WebFilter>]>,
    handler: Arc<dyn WebHandler>,
    index: usize,
}

impl DefaultWebFilterChain {
    /// A chain starting at the first of `filters`.
    pub fn new(filters: Arc<[Arc<dyn WebFilter>]>, handler: Arc<dyn WebHandler>) -> Self {
        Self {
            filters,
            handler,
            index: 0,
        }
    }

    fn next(&self) -> Self {
        Self {
            filters: Arc::clone(&self.filters),
            handler: Arc::clone(&self.handler),
            index: self.index + 1,
        }
    }
}

impl WebFilterChain for DefaultWebFilterChain {
    fn filter(&self, exchange: ServerWebExchange) -> Mono<()> {
        match self.filters.get(self.index) {
            Some(filter) => {
                tracing::trace!(filter = filter.name(), index = self.index, exchange = %exchange.id(), "chain invoked");
                filter.filter(exchange, Arc::new(self.next()))
            }
            None => self.handler.handle(exchange),
        }
    }
}

impl std::fmt::Debug for DefaultWebFilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultWebFilterChain")
            .field("filters", &self.filters.iter().map(|filter| filter.name()).collect::<Vec<_>>())
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// A [`WebHandler`] that runs every request through a filter chain.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use coflux_filter::{async_filter_fn, handler_fn, FilteringWebHandler};
/// use http_body_util::Full;
///
/// # tokio_test::block_on(async {
/// let handler = FilteringWebHandler::new(handler_fn(|exchange| async move {
///     exchange.set_response_body("hello");
///     Ok::<(), coflux_core::UpstreamError>(())
/// }))
/// .filter(async_filter_fn("greeting", |exchange, chain| async move {
///     chain.filter(exchange).await
/// }));
///
/// let request = http::Request::new(Full::new(Bytes::new()));
/// let response = handler.handle_request(request).await;
/// assert_eq!(response.status(), 200);
/// # });
/// ```
pub struct FilteringWebHandler {
    filters: Vec<Arc<dyn WebFilter>>,
    handler: Arc<dyn WebHandler>,
    readers: Arc<MessageReaders>,
}

impl FilteringWebHandler {
    /// A pipeline with no filters in front of `handler`.
    pub fn new<H: WebHandler + 'static>(handler: H) -> Self {
        Self {
            filters: Vec::new(),
            handler: Arc::new(handler),
            readers: Arc::new(MessageReaders::defaults()),
        }
    }

    /// Appends a filter. Filters run in the order they are added.
    pub fn filter<F: WebFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Sets the readers available to [`ServerWebExchange::body`].
    pub fn readers(mut self, readers: MessageReaders) -> Self {
        self.readers = Arc::new(readers);
        self
    }

    /// Names of the filters, in order.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    /// Runs `request` through the chain and returns the response.
    ///
    /// A chain that fails yields a `500 Internal Server Error`.
    pub async fn handle_request(&self, request: Request) -> Response {
        let exchange = ServerWebExchange::from_request(request, Arc::clone(&self.readers)).await;
        tracing::debug!(exchange = %exchange.id(), method = %exchange.method(), uri = %exchange.uri(), "exchange started");

        let completion = self.handle(exchange.clone());
        match completion.await_first_or_default(()).await {
            Ok(()) => exchange.to_response(),
            Err(err) => {
                tracing::error!(exchange = %exchange.id(), error = %err, "filter chain failed");
                internal_error()
            }
        }
    }
}

impl WebHandler for FilteringWebHandler {
    fn handle(&self, exchange: ServerWebExchange) -> Mono<()> {
        let filters: Arc<[Arc<dyn WebFilter>]> = self.filters.clone().into();
        DefaultWebFilterChain::new(filters, Arc::clone(&self.handler)).filter(exchange)
    }
}

impl std::fmt::Debug for FilteringWebHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteringWebHandler")
            .field("filters", &self.filter_names())
            .finish_non_exhaustive()
    }
}

fn internal_error() -> Response {
    let mut response = Response::new(http_body_util::Full::new(Bytes::from_static(b"Internal Server Error")));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

/// A [`WebHandler`] backed by an async function.
pub struct FnHandler<F> {
    func: F,
}

/// Builds a [`WebHandler`] from an async function.
pub fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(ServerWebExchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UpstreamError>> + Send + 'static,
{
    FnHandler { func }
}

impl<F, Fut> WebHandler for FnHandler<F>
where
    F: Fn(ServerWebExchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UpstreamError>> + Send + 'static,
{
    fn handle(&self, exchange: ServerWebExchange) -> Mono<()> {
        Mono::completion((self.func)(exchange))
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}
