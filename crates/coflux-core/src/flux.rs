//! Demand-driven publisher of zero or more values.
//!
//! [`Flux`] adapts a `futures` stream into the reactive protocol. Each
//! subscription is driven by its own tokio task which polls the source only
//! while there is outstanding demand, so a slow subscriber never causes the
//! source to run ahead.
//!
//! Cancelling a subscription aborts the driving task, which drops the source
//! stream and everything it owns.

use crate::error::{BridgeError, UpstreamError};
use crate::publisher::{reject, Publisher, Subscriber, Subscription};
use futures_util::stream::{self, BoxStream, StreamExt};
use futures_util::Stream;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::AbortHandle;

/// The source stream of one subscription.
pub type SourceStream<T> = BoxStream<'static, Result<T, UpstreamError>>;

type SourceFactory<T> = Box<dyn Fn() -> Option<SourceStream<T>> + Send + Sync>;

/// A publisher of zero or more values.
///
/// # Example
///
/// ```
/// use coflux_core::{Flux, PublisherExt};
/// use futures_util::TryStreamExt;
///
/// # tokio_test::block_on(async {
/// let flux = Flux::from_iter(vec![1, 2, 3]);
/// let values: Vec<i32> = flux.open_subscription().try_collect().await.unwrap();
/// assert_eq!(values, vec![1, 2, 3]);
/// # });
/// ```
pub struct Flux<T> {
    factory: SourceFactory<T>,
}

impl<T: Send + 'static> Flux<T> {
    /// Creates a cold flux: every subscription builds a fresh source.
    pub fn defer<F, S>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T, UpstreamError>> + Send + 'static,
    {
        Self {
            factory: Box::new(move || Some(factory().boxed())),
        }
    }

    /// Creates a cold flux replaying the items of a cloneable collection.
    #[allow(clippy::should_implement_trait)]
    pub fn from_iter<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        I::IntoIter: Send + 'static,
    {
        Self::defer(move || stream::iter(items.clone().into_iter().map(Ok)))
    }

    /// Creates a one-shot flux over an existing stream.
    ///
    /// Only the first subscriber receives the items; later subscribers get
    /// [`BridgeError::AlreadySubscribed`].
    pub fn from_stream<S>(source: S) -> Self
    where
        S: Stream<Item = Result<T, UpstreamError>> + Send + 'static,
    {
        let slot = Mutex::new(Some(source.boxed()));
        Self {
            factory: Box::new(move || slot.lock().take()),
        }
    }

    /// Creates a flux that completes without emitting.
    pub fn empty() -> Self {
        Self::defer(stream::empty)
    }

    /// Creates a flux that signals `error` to every subscriber.
    pub fn error(error: UpstreamError) -> Self {
        Self::defer(move || stream::once(futures_util::future::ready(Err(Arc::clone(&error)))))
    }

    /// Creates a flux that never signals anything.
    pub fn never() -> Self {
        Self::defer(stream::pending)
    }

    /// Transforms every emitted value.
    pub fn map<U, F>(self, f: F) -> Flux<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Clone + Send + Sync + 'static,
    {
        let factory = self.factory;
        Flux {
            factory: Box::new(move || {
                let f = f.clone();
                factory().map(|source| source.map(move |item| item.map(&f)).boxed())
            }),
        }
    }
}

impl<T: Send + 'static> Publisher<T> for Flux<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        match (self.factory)() {
            Some(source) => launch(source, subscriber),
            None => reject(subscriber, BridgeError::AlreadySubscribed.into_upstream()),
        }
    }
}

impl<T> std::fmt::Debug for Flux<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flux").finish_non_exhaustive()
    }
}

/// Starts the task that drives `source` into `subscriber`.
pub(crate) fn launch<T: Send + 'static>(source: SourceStream<T>, mut subscriber: Box<dyn Subscriber<T>>) {
    let Ok(runtime) = Handle::try_current() else {
        reject(subscriber, BridgeError::NoRuntime.into_upstream());
        return;
    };

    let demand = Arc::new(DemandSubscription::new());
    subscriber.on_subscribe(Arc::clone(&demand) as Arc<dyn Subscription>);

    let task_demand = Arc::clone(&demand);
    let task = runtime.spawn(async move {
        let mut source = source;
        loop {
            if !task_demand.acquire().await {
                tracing::trace!("subscription cancelled, stopping emission");
                break;
            }
            match source.next().await {
                Some(Ok(value)) => subscriber.on_next(value),
                Some(Err(error)) => {
                    subscriber.on_error(error);
                    break;
                }
                None => {
                    subscriber.on_complete();
                    break;
                }
            }
        }
    });
    demand.attach(task.abort_handle());
}

/// Demand accounting shared between a subscriber and its driving task.
#[derive(Debug)]
struct DemandSubscription {
    requested: AtomicU64,
    cancelled: AtomicBool,
    notify: Notify,
    task: Mutex<Option<AbortHandle>>,
}

impl DemandSubscription {
    fn new() -> Self {
        Self {
            requested: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
            task: Mutex::new(None),
        }
    }

    fn attach(&self, handle: AbortHandle) {
        let mut task = self.task.lock();
        if self.cancelled.load(Ordering::Acquire) {
            handle.abort();
        } else {
            *task = Some(handle);
        }
    }

    /// Waits for one unit of demand. Returns false once cancelled.
    async fn acquire(&self) -> bool {
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return false;
            }
            let current = self.requested.load(Ordering::Acquire);
            if current == u64::MAX {
                return true;
            }
            if current > 0 {
                if self
                    .requested
                    .compare_exchange(current, current - 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return true;
                }
                continue;
            }
            self.notify.notified().await;
        }
    }
}

impl Subscription for DemandSubscription {
    fn request(&self, n: u64) {
        if n == 0 {
            return;
        }
        let _ = self
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n))
            });
        self.notify.notify_one();
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        self.notify.notify_one();
    }
}
