//! Awaiting the first signal of a publisher.
//!
//! These functions subscribe, request exactly one element and suspend the
//! calling task until the publisher signals. The first value wins and the
//! subscription is cancelled right after it, so publishers that could emit
//! more never run ahead. Dropping the returned future cancels the
//! subscription.

use super::slot::SubscriptionSlot;
use crate::error::{BridgeError, BridgeResult, UpstreamError};
use crate::publisher::{Publisher, Subscriber, Subscription};
use std::sync::Arc;
use tokio::sync::oneshot;

type Outcome<T> = Result<Option<T>, UpstreamError>;

/// Resolves to the first value of `publisher`, or `None` if it completes
/// without emitting.
///
/// # Errors
///
/// - [`BridgeError::Upstream`] if the publisher signals an error.
/// - [`BridgeError::Cancelled`] if the publisher drops the subscriber
///   without a terminal signal.
pub async fn first_or_none<T, P>(publisher: &P) -> BridgeResult<Option<T>>
where
    T: Send + 'static,
    P: Publisher<T> + ?Sized,
{
    let (tx, rx) = oneshot::channel();
    let slot = Arc::new(SubscriptionSlot::new());
    let _guard = CancelOnDrop(Arc::clone(&slot));

    publisher.subscribe(Box::new(FirstSubscriber {
        tx: Some(tx),
        slot,
    }));

    match rx.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(BridgeError::Upstream(error)),
        Err(_) => Err(BridgeError::Cancelled),
    }
}

/// Resolves to the first value of `publisher`, or `default` if it completes
/// without emitting.
///
/// # Errors
///
/// Same as [`first_or_none`].
pub async fn first_or_default<T, P>(publisher: &P, default: T) -> BridgeResult<T>
where
    T: Send + 'static,
    P: Publisher<T> + ?Sized,
{
    first_or_none(publisher)
        .await
        .map(|value| value.unwrap_or(default))
}

/// Cancels the subscription if the awaiting future goes away first.
struct CancelOnDrop(Arc<SubscriptionSlot>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

struct FirstSubscriber<T> {
    tx: Option<oneshot::Sender<Outcome<T>>>,
    slot: Arc<SubscriptionSlot>,
}

impl<T: Send> FirstSubscriber<T> {
    fn resolve(&mut self, outcome: Outcome<T>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(outcome);
        }
    }
}

impl<T: Send> Subscriber<T> for FirstSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.slot.set(subscription);
        self.slot.request(1);
    }

    fn on_next(&mut self, value: T) {
        if self.tx.is_some() {
            self.resolve(Ok(Some(value)));
            self.slot.cancel();
        }
    }

    fn on_error(&mut self, error: UpstreamError) {
        self.slot.release();
        self.resolve(Err(error));
    }

    fn on_complete(&mut self) {
        self.slot.release();
        self.resolve(Ok(None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::NoopSubscription;
    use crate::{Flux, Mono};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream exploded")]
    struct Exploded;

    /// A publisher that records demand and cancellation and lets the test
    /// drive signals by hand.
    #[derive(Default)]
    struct ManualPublisher {
        requested: Arc<AtomicU64>,
        cancelled: Arc<AtomicBool>,
        subscriber: Mutex<Option<Box<dyn Subscriber<u32>>>>,
    }

    struct ManualSubscription {
        requested: Arc<AtomicU64>,
        cancelled: Arc<AtomicBool>,
    }

    impl Subscription for ManualSubscription {
        fn request(&self, n: u64) {
            self.requested.fetch_add(n, Ordering::SeqCst);
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    impl Publisher<u32> for ManualPublisher {
        fn subscribe(&self, mut subscriber: Box<dyn Subscriber<u32>>) {
            subscriber.on_subscribe(Arc::new(ManualSubscription {
                requested: Arc::clone(&self.requested),
                cancelled: Arc::clone(&self.cancelled),
            }));
            *self.subscriber.lock() = Some(subscriber);
        }
    }

    impl ManualPublisher {
        fn emit(&self, value: u32) {
            if let Some(subscriber) = self.subscriber.lock().as_mut() {
                subscriber.on_next(value);
            }
        }
    }

    #[tokio::test]
    async fn test_empty_resolves_to_default() {
        let value = first_or_default(&Mono::<u32>::empty(), 9).await.unwrap();
        assert_eq!(value, 9);
        assert_eq!(first_or_none(&Mono::<u32>::empty()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_value_resolves() {
        assert_eq!(first_or_none(&Mono::just(3u32)).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_error_is_upstream() {
        let err = first_or_none(&Mono::<u32>::error(Arc::new(Exploded)))
            .await
            .unwrap_err();
        assert!(err.as_upstream().is_some());
        assert_eq!(err.to_string(), "upstream exploded");
    }

    #[tokio::test]
    async fn test_requests_one_and_cancels_after_first_value() {
        let publisher = Arc::new(ManualPublisher::default());
        let driver = Arc::clone(&publisher);

        let waiter = tokio::spawn(async move { first_or_none(&*publisher).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(driver.requested.load(Ordering::SeqCst), 1);

        driver.emit(11);
        assert_eq!(waiter.await.unwrap().unwrap(), Some(11));
        assert!(driver.cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dropping_future_cancels_subscription() {
        let publisher = ManualPublisher::default();
        let result =
            tokio::time::timeout(Duration::from_millis(20), first_or_none(&publisher)).await;
        assert!(result.is_err());
        assert!(publisher.cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_multi_value_source_yields_first() {
        let flux = Flux::from_iter(vec![1u32, 2, 3]);
        assert_eq!(first_or_none(&flux).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_cancelled_error() {
        struct Forgetful;

        impl Publisher<u32> for Forgetful {
            fn subscribe(&self, mut subscriber: Box<dyn Subscriber<u32>>) {
                subscriber.on_subscribe(Arc::new(NoopSubscription));
            }
        }

        let err = first_or_none(&Forgetful).await.unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled));
    }
}
