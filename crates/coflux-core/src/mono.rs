//! Publisher of at most one value.
//!
//! [`Mono`] is the completion-handle type of the reactive layer: a
//! `Mono<()>` signals "done" or "failed", a `Mono<T>` additionally carries a
//! single result. Sources are futures resolving to `Ok(Some(value))`,
//! `Ok(None)` (empty completion) or `Err(error)`.

use crate::error::{BridgeError, UpstreamError};
use crate::flux::{launch, SourceStream};
use crate::publisher::{reject, Publisher, Subscriber};
use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

/// The source future of one subscription.
pub type MonoFuture<T> = BoxFuture<'static, Result<Option<T>, UpstreamError>>;

type MonoFactory<T> = Box<dyn Fn() -> Option<MonoFuture<T>> + Send + Sync>;

/// A publisher of zero or one value.
///
/// # Example
///
/// ```
/// use coflux_core::{Mono, PublisherExt};
///
/// # tokio_test::block_on(async {
/// let mono = Mono::just(42);
/// assert_eq!(mono.await_first_or_none().await.unwrap(), Some(42));
///
/// let empty = Mono::<i32>::empty();
/// assert_eq!(empty.await_first_or_default(7).await.unwrap(), 7);
/// # });
/// ```
pub struct Mono<T> {
    factory: MonoFactory<T>,
}

impl<T: Send + 'static> Mono<T> {
    /// Creates a cold mono: every subscription runs a fresh future.
    pub fn defer<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<T>, UpstreamError>> + Send + 'static,
    {
        Self {
            factory: Box::new(move || Some(factory().boxed())),
        }
    }

    /// Creates a one-shot mono over a future that yields a value.
    ///
    /// The future is not polled before the first subscriber requests demand.
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T, UpstreamError>> + Send + 'static,
    {
        Self::from_optional_future(future.map(|result| result.map(Some)))
    }

    /// Creates a one-shot mono over a future that may complete empty.
    pub fn from_optional_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<Option<T>, UpstreamError>> + Send + 'static,
    {
        let slot = Mutex::new(Some(future.boxed()));
        Self {
            factory: Box::new(move || slot.lock().take()),
        }
    }

    /// Creates a mono that emits a clone of `value` to every subscriber.
    pub fn just(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::defer(move || future::ready(Ok(Some(value.clone()))))
    }

    /// Creates a mono that completes without emitting.
    pub fn empty() -> Self {
        Self::defer(|| future::ready(Ok(None)))
    }

    /// Creates a mono that signals `error` to every subscriber.
    pub fn error(error: UpstreamError) -> Self {
        Self::defer(move || future::ready(Err(Arc::clone(&error))))
    }

    /// Creates a mono that never signals anything.
    pub fn never() -> Self {
        Self::defer(future::pending)
    }

    /// Transforms the emitted value.
    pub fn map<U, F>(self, f: F) -> Mono<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Clone + Send + Sync + 'static,
    {
        let factory = self.factory;
        Mono {
            factory: Box::new(move || {
                let f = f.clone();
                factory().map(|source| {
                    source
                        .map(move |result| result.map(|value| value.map(&f)))
                        .boxed()
                })
            }),
        }
    }
}

impl Mono<()> {
    /// Creates a completion handle that completes once `future` resolves.
    pub fn completion<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<(), UpstreamError>> + Send + 'static,
    {
        Self::from_optional_future(future.map(|result| result.map(|()| None)))
    }
}

fn into_stream<T: Send + 'static>(source: MonoFuture<T>) -> SourceStream<T> {
    stream::once(source)
        .filter_map(|result| future::ready(result.transpose()))
        .boxed()
}

impl<T: Send + 'static> Publisher<T> for Mono<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        match (self.factory)() {
            Some(source) => launch(into_stream(source), subscriber),
            None => reject(subscriber, BridgeError::AlreadySubscribed.into_upstream()),
        }
    }
}

impl<T> std::fmt::Debug for Mono<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mono").finish_non_exhaustive()
    }
}
