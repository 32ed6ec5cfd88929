//! The reactive-streams contract.
//!
//! A [`Publisher`] pushes values to a [`Subscriber`] once the subscriber has
//! signalled demand through its [`Subscription`]. The protocol is:
//!
//! ```text
//! on_subscribe ─► on_next* ─► (on_error | on_complete)?
//! ```
//!
//! - `on_subscribe` is signalled exactly once, before anything else.
//! - A publisher never emits more `on_next` signals than were requested.
//! - At most one terminal signal is emitted; nothing follows it.
//! - After `cancel`, the publisher stops emitting (eventually) and releases
//!   its resources.

use crate::error::UpstreamError;
use std::sync::Arc;

/// Demand and cancellation channel from a subscriber back to its publisher.
///
/// Implementations must tolerate `request` and `cancel` being called from any
/// thread, repeatedly, and after the subscription has terminated.
pub trait Subscription: Send + Sync {
    /// Requests `n` additional elements. Demand is cumulative and saturates
    /// at `u64::MAX`, which means "unbounded".
    fn request(&self, n: u64);

    /// Cancels the subscription. Idempotent.
    fn cancel(&self);
}

/// Receiver of reactive signals.
pub trait Subscriber<T>: Send {
    /// Called once with the subscription handle.
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>);

    /// Called for each emitted element, never beyond the requested demand.
    fn on_next(&mut self, value: T);

    /// Terminal error signal.
    fn on_error(&mut self, error: UpstreamError);

    /// Terminal completion signal.
    fn on_complete(&mut self);
}

/// A source of zero or more values delivered through the reactive protocol.
///
/// Publishers are either cold (every subscription replays the source) or
/// one-shot (a second subscription receives
/// [`BridgeError::AlreadySubscribed`](crate::BridgeError::AlreadySubscribed)
/// through `on_error`).
pub trait Publisher<T>: Send + Sync {
    /// Attaches a subscriber. Emission starts once demand is requested.
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>);
}

impl<T, P> Publisher<T> for Arc<P>
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        (**self).subscribe(subscriber);
    }
}

impl<T, P> Publisher<T> for &P
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        (**self).subscribe(subscriber);
    }
}

/// A subscription that ignores demand and cancellation.
///
/// Used when a publisher has to signal a terminal event immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSubscription;

impl Subscription for NoopSubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}

/// Signals an error to a subscriber that was never given a live subscription.
pub fn reject<T>(mut subscriber: Box<dyn Subscriber<T>>, error: UpstreamError) {
    subscriber.on_subscribe(Arc::new(NoopSubscription));
    subscriber.on_error(error);
}
