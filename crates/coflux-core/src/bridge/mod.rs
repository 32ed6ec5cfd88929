//! Bridges from the reactive protocol to `async`/`await`.
//!
//! - [`first_or_none`] / [`first_or_default`] suspend until the first signal
//!   of a publisher.
//! - [`SubscriptionStream`] consumes a publisher element by element.
//!
//! [`PublisherExt`] exposes both as methods on every publisher.

mod single;
mod slot;
mod stream;

pub use single::{first_or_default, first_or_none};
pub use stream::SubscriptionStream;

use crate::error::BridgeResult;
use crate::publisher::Publisher;
use futures_util::future::{BoxFuture, FutureExt};

/// Awaiting extensions for every [`Publisher`].
pub trait PublisherExt<T: Send + 'static>: Publisher<T> {
    /// Awaits the first value, or `default` if the publisher completes empty.
    ///
    /// See [`first_or_default`].
    fn await_first_or_default(&self, default: T) -> BoxFuture<'_, BridgeResult<T>> {
        first_or_default(self, default).boxed()
    }

    /// Awaits the first value, or `None` if the publisher completes empty.
    ///
    /// See [`first_or_none`].
    fn await_first_or_none(&self) -> BoxFuture<'_, BridgeResult<Option<T>>> {
        first_or_none(self).boxed()
    }

    /// Subscribes and returns a stream over the emitted values.
    fn open_subscription(&self) -> SubscriptionStream<T> {
        SubscriptionStream::open(self)
    }
}

impl<T, P> PublisherExt<T> for P
where
    T: Send + 'static,
    P: Publisher<T> + ?Sized,
{
}
