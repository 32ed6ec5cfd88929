//! async/await filters on top of the reactive chain.
//!
//! [`AsyncWebFilter`] is the async form of [`WebFilter`]. Wrapping one in
//! [`AsyncFilterAdapter`] makes it usable wherever the reactive chain
//! expects a filter:
//!
//! - `filter` returns a lazy completion handle; subscribing to it spawns a
//!   tokio task that runs the async body.
//! - The body continues the chain with [`AsyncFilterChain::filter`], which
//!   awaits the downstream completion handle.
//! - The handle completes after the body returns, so it also covers any
//!   downstream work the body awaited.
//! - An `Err` or a panic in the body is signalled as an error on the
//!   handle. Cancelling the handle aborts the task.

use crate::chain::{SharedChain, WebFilter, WebFilterChain};
use crate::error::FilterError;
use crate::exchange::ServerWebExchange;
use async_trait::async_trait;
use coflux_core::{BridgeError, BridgeResult, Mono, PublisherExt, UpstreamError};
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// An async request filter.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use coflux_core::BridgeResult;
/// use coflux_filter::{AsyncFilterChain, AsyncWebFilter, ServerWebExchange};
/// use http::header::HeaderValue;
///
/// struct Powered;
///
/// #[async_trait]
/// impl AsyncWebFilter for Powered {
///     async fn filter(&self, exchange: ServerWebExchange, chain: AsyncFilterChain) -> BridgeResult<()> {
///         exchange.set_response_header(
///             http::header::HeaderName::from_static("x-powered-by"),
///             HeaderValue::from_static("coflux"),
///         );
///         chain.filter(exchange).await
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncWebFilter: Send + Sync + 'static {
    /// Name used in logs and panic reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Filters `exchange`, optionally awaiting the rest of the chain.
    async fn filter(&self, exchange: ServerWebExchange, chain: AsyncFilterChain) -> BridgeResult<()>;
}

/// The rest of a reactive chain, seen from an [`AsyncWebFilter`].
#[derive(Clone)]
pub struct AsyncFilterChain {
    chain: SharedChain,
}

impl AsyncFilterChain {
    /// Wraps a reactive chain.
    pub fn new(chain: SharedChain) -> Self {
        Self { chain }
    }

    /// Invokes the next filter and waits for its completion handle.
    ///
    /// Dropping the returned future cancels the downstream handle.
    pub async fn filter(&self, exchange: ServerWebExchange) -> BridgeResult<()> {
        let completion = self.chain.filter(exchange);
        completion
            .await_first_or_default(())
            .await
            .map_err(BridgeError::flatten)
    }

    /// The wrapped reactive chain.
    pub fn reactive(&self) -> &SharedChain {
        &self.chain
    }
}

impl std::fmt::Debug for AsyncFilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFilterChain").finish_non_exhaustive()
    }
}

/// Exposes an [`AsyncWebFilter`] as a reactive [`WebFilter`].
pub struct AsyncFilterAdapter<F> {
    filter: Arc<F>,
}

impl<F: AsyncWebFilter> AsyncFilterAdapter<F> {
    /// Wraps `filter`.
    pub fn new(filter: F) -> Self {
        Self {
            filter: Arc::new(filter),
        }
    }

    /// The wrapped async filter.
    pub fn inner(&self) -> &F {
        &self.filter
    }
}

impl<F: AsyncWebFilter> WebFilter for AsyncFilterAdapter<F> {
    fn name(&self) -> &str {
        self.filter.name()
    }

    fn filter(&self, exchange: ServerWebExchange, chain: SharedChain) -> Mono<()> {
        let filter = Arc::clone(&self.filter);
        Mono::completion(async move {
            tracing::debug!(filter = filter.name(), exchange = %exchange.id(), "filter launched");
            let body = AsyncWebFilter::filter(&*filter, exchange, AsyncFilterChain::new(chain));
            match AssertUnwindSafe(body).catch_unwind().await {
                Ok(result) => result.map_err(BridgeError::into_upstream),
                Err(payload) => {
                    let error: UpstreamError = Arc::new(FilterError::panicked(filter.name(), payload.as_ref()));
                    Err(error)
                }
            }
        })
    }
}

impl<F: AsyncWebFilter> From<F> for AsyncFilterAdapter<F> {
    fn from(filter: F) -> Self {
        Self::new(filter)
    }
}

impl<F> std::fmt::Debug for AsyncFilterAdapter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFilterAdapter").finish_non_exhaustive()
    }
}

/// An [`AsyncWebFilter`] backed by an async function.
pub struct FnAsyncFilter<F> {
    name: &'static str,
    func: F,
}

/// Builds a reactive filter from an async function.
///
/// ```
/// use coflux_filter::{async_filter_fn, WebFilter};
///
/// let timing = async_filter_fn("timing", |exchange, chain| async move {
///     let started = std::time::Instant::now();
///     let result = chain.filter(exchange).await;
///     tracing::debug!(elapsed = ?started.elapsed(), "request filtered");
///     result
/// });
/// assert_eq!(timing.name(), "timing");
/// ```
pub fn async_filter_fn<F, Fut>(name: &'static str, func: F) -> AsyncFilterAdapter<FnAsyncFilter<F>>
where
    F: Fn(ServerWebExchange, AsyncFilterChain) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BridgeResult<()>> + Send + 'static,
{
    AsyncFilterAdapter::new(FnAsyncFilter { name, func })
}

#[async_trait]
impl<F, Fut> AsyncWebFilter for FnAsyncFilter<F>
where
    F: Fn(ServerWebExchange, AsyncFilterChain) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BridgeResult<()>> + Send + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    async fn filter(&self, exchange: ServerWebExchange, chain: AsyncFilterChain) -> BridgeResult<()> {
        (self.func)(exchange, chain).await
    }
}
