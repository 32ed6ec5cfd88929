//! Streaming callbacks over a borrowed resource.
//!
//! Reactive drivers expose "do something with this handle and stream the
//! results back" hooks as callbacks returning a publisher.
//! [`StreamingCallback`] wraps such a [`ReactiveCallback`] and hands the
//! results to async code as a [`SubscriptionStream`].

use crate::bridge::{PublisherExt, SubscriptionStream};
use crate::flux::Flux;
use std::sync::Arc;

/// A callback that streams results derived from a resource.
pub trait ReactiveCallback<R: ?Sized, T>: Send + Sync {
    /// Runs the callback against `resource`.
    fn call(&self, resource: &R) -> Flux<T>;
}

impl<R, T, F> ReactiveCallback<R, T> for F
where
    R: ?Sized,
    F: Fn(&R) -> Flux<T> + Send + Sync,
{
    fn call(&self, resource: &R) -> Flux<T> {
        self(resource)
    }
}

/// Async form of a [`ReactiveCallback`].
///
/// # Example
///
/// ```
/// use coflux_core::{Flux, StreamingCallback};
///
/// struct Collection {
///     docs: Vec<String>,
/// }
///
/// # tokio_test::block_on(async {
/// let names = StreamingCallback::from_reactive(|c: &Collection| Flux::from_iter(c.docs.clone()));
///
/// let collection = Collection { docs: vec!["a".into(), "b".into()] };
/// let mut results = names.call(&collection);
/// assert_eq!(results.recv().await.unwrap().unwrap(), "a");
/// # });
/// ```
pub struct StreamingCallback<R: ?Sized, T> {
    reactive: Arc<dyn ReactiveCallback<R, T>>,
}

impl<R: ?Sized, T: Send + 'static> StreamingCallback<R, T> {
    /// Wraps a reactive callback.
    pub fn from_reactive<C>(callback: C) -> Self
    where
        C: ReactiveCallback<R, T> + 'static,
    {
        Self {
            reactive: Arc::new(callback),
        }
    }

    /// The wrapped reactive callback.
    pub fn reactive(&self) -> &Arc<dyn ReactiveCallback<R, T>> {
        &self.reactive
    }

    /// Runs the callback and subscribes to its results.
    pub fn call(&self, resource: &R) -> SubscriptionStream<T> {
        self.reactive.call(resource).open_subscription()
    }
}

impl<R: ?Sized, T> Clone for StreamingCallback<R, T> {
    fn clone(&self) -> Self {
        Self {
            reactive: Arc::clone(&self.reactive),
        }
    }
}

impl<R: ?Sized, T> std::fmt::Debug for StreamingCallback<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingCallback").finish_non_exhaustive()
    }
}
