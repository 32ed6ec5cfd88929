//! Pull-based consumption of a multi-value publisher.
//!
//! [`SubscriptionStream`] turns a publisher into a [`Stream`]. Demand is
//! driven by the consumer: one element is requested per `poll_next` that
//! finds nothing buffered, so at most one element is ever in flight.

use super::slot::SubscriptionSlot;
use crate::error::{BridgeError, BridgeResult, UpstreamError};
use crate::publisher::{Publisher, Subscriber, Subscription};
use futures_util::stream::{FusedStream, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

enum Signal<T> {
    Next(T),
    Error(UpstreamError),
    Complete,
}

/// A cancellable stream over the values of one subscription.
///
/// Yields `Ok(value)` for each element in publisher order, then ends on
/// completion. An upstream error is yielded once as
/// `Err(BridgeError::Upstream(_))` and ends the stream.
///
/// Dropping the stream, or calling [`cancel`](Self::cancel), cancels the
/// upstream subscription.
///
/// # Example
///
/// ```
/// use coflux_core::{Flux, PublisherExt};
///
/// # tokio_test::block_on(async {
/// let mut values = Flux::from_iter(vec!["a", "b"]).open_subscription();
/// assert_eq!(values.recv().await.unwrap().unwrap(), "a");
/// values.cancel();
/// assert!(values.recv().await.is_none());
/// # });
/// ```
pub struct SubscriptionStream<T> {
    rx: mpsc::UnboundedReceiver<Signal<T>>,
    slot: Arc<SubscriptionSlot>,
    demanded: bool,
    terminated: bool,
}

impl<T: Send + 'static> SubscriptionStream<T> {
    /// Subscribes to `publisher`. No element is requested until the stream
    /// is first polled.
    pub fn open<P>(publisher: &P) -> Self
    where
        P: Publisher<T> + ?Sized,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let slot = Arc::new(SubscriptionSlot::new());
        publisher.subscribe(Box::new(ChannelSubscriber {
            tx,
            slot: Arc::clone(&slot),
        }));
        Self {
            rx,
            slot,
            demanded: false,
            terminated: false,
        }
    }
}

impl<T> SubscriptionStream<T> {
    /// Receives the next element, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<BridgeResult<T>> {
        self.next().await
    }

    /// Cancels the upstream subscription and ends the stream.
    ///
    /// Elements already buffered are discarded.
    pub fn cancel(&mut self) {
        self.slot.cancel();
        self.terminated = true;
        self.rx.close();
    }
}

impl<T> Stream for SubscriptionStream<T> {
    type Item = BridgeResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        if !this.demanded {
            // A terminal signal needs no demand and may already be buffered.
            if let Poll::Ready(signal) = this.rx.poll_recv(cx) {
                return Poll::Ready(this.settle(signal));
            }
            this.demanded = true;
            this.slot.request(1);
        }
        match this.rx.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(signal) => Poll::Ready(this.settle(signal)),
        }
    }
}

impl<T> SubscriptionStream<T> {
    fn settle(&mut self, signal: Option<Signal<T>>) -> Option<BridgeResult<T>> {
        match signal {
            Some(Signal::Next(value)) => {
                self.demanded = false;
                Some(Ok(value))
            }
            Some(Signal::Error(error)) => {
                self.terminated = true;
                Some(Err(BridgeError::Upstream(error)))
            }
            Some(Signal::Complete) => {
                self.terminated = true;
                None
            }
            None => {
                self.terminated = true;
                tracing::debug!("publisher dropped its subscriber without a terminal signal");
                Some(Err(BridgeError::Cancelled))
            }
        }
    }
}

impl<T> FusedStream for SubscriptionStream<T> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<T> Drop for SubscriptionStream<T> {
    fn drop(&mut self) {
        self.slot.cancel();
    }
}

impl<T> std::fmt::Debug for SubscriptionStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionStream")
            .field("demanded", &self.demanded)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

struct ChannelSubscriber<T> {
    tx: mpsc::UnboundedSender<Signal<T>>,
    slot: Arc<SubscriptionSlot>,
}

impl<T: Send> Subscriber<T> for ChannelSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.slot.set(subscription);
    }

    fn on_next(&mut self, value: T) {
        let _ = self.tx.send(Signal::Next(value));
    }

    fn on_error(&mut self, error: UpstreamError) {
        self.slot.release();
        let _ = self.tx.send(Signal::Error(error));
    }

    fn on_complete(&mut self) {
        self.slot.release();
        let _ = self.tx.send(Signal::Complete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flux;
    use futures_util::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("broken pipe")]
    struct Broken;

    #[tokio::test]
    async fn test_yields_values_then_ends() {
        let mut values = SubscriptionStream::open(&Flux::from_iter(vec![1, 2]));
        assert_eq!(values.recv().await.unwrap().unwrap(), 1);
        assert_eq!(values.recv().await.unwrap().unwrap(), 2);
        assert!(values.recv().await.is_none());
        assert!(values.is_terminated());
    }

    #[tokio::test]
    async fn test_error_after_values() {
        let flux = Flux::from_stream(stream::iter(vec![
            Ok(1),
            Err(Arc::new(Broken) as UpstreamError),
        ]));
        let mut values = SubscriptionStream::open(&flux);
        assert_eq!(values.recv().await.unwrap().unwrap(), 1);
        let err = values.recv().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "broken pipe");
        assert!(values.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_source_does_not_run_ahead() {
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&produced);
        let flux = Flux::defer(move || {
            let counter = Arc::clone(&counter);
            stream::iter(0..100).map(move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            })
        });

        let mut values = SubscriptionStream::open(&flux);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(produced.load(Ordering::SeqCst), 0);

        values.recv().await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(produced.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_ends_stream() {
        let mut values = SubscriptionStream::open(&Flux::<u8>::never());
        values.cancel();
        assert!(values.recv().await.is_none());
    }
}
