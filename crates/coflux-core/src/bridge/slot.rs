//! Subscription hand-off between a bridge subscriber and its consumer.

use crate::publisher::Subscription;
use parking_lot::Mutex;
use std::sync::Arc;

/// Holds the upstream subscription of one bridge.
///
/// The consumer side may request or cancel before the publisher has called
/// `on_subscribe`; such calls are remembered and replayed when the
/// subscription arrives. Upstream calls are always made outside the lock
/// since publishers may re-enter the subscriber synchronously.
#[derive(Default)]
pub(crate) struct SubscriptionSlot {
    state: Mutex<SlotState>,
}

#[derive(Default)]
struct SlotState {
    subscription: Option<Arc<dyn Subscription>>,
    pending: u64,
    closed: bool,
}

impl SubscriptionSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores the subscription and forwards any demand requested so far.
    pub(crate) fn set(&self, subscription: Arc<dyn Subscription>) {
        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            subscription.cancel();
            return;
        }
        let pending = std::mem::take(&mut state.pending);
        state.subscription = Some(Arc::clone(&subscription));
        drop(state);

        if pending > 0 {
            subscription.request(pending);
        }
    }

    pub(crate) fn request(&self, n: u64) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        match state.subscription.as_ref().map(Arc::clone) {
            Some(subscription) => {
                drop(state);
                subscription.request(n);
            }
            None => state.pending = state.pending.saturating_add(n),
        }
    }

    /// Cancels upstream unless the slot was already closed.
    pub(crate) fn cancel(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let subscription = state.subscription.take();
        drop(state);

        if let Some(subscription) = subscription {
            tracing::trace!("cancelling upstream subscription");
            subscription.cancel();
        }
    }

    /// Closes the slot after a terminal signal, without cancelling upstream.
    pub(crate) fn release(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.subscription = None;
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    #[derive(Default)]
    struct Probe {
        requested: AtomicU64,
        cancelled: AtomicBool,
    }

    impl Subscription for Probe {
        fn request(&self, n: u64) {
            self.requested.fetch_add(n, Ordering::SeqCst);
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_pending_demand_is_replayed() {
        let slot = SubscriptionSlot::new();
        slot.request(1);
        slot.request(2);

        let probe = Arc::new(Probe::default());
        slot.set(probe.clone());
        assert_eq!(probe.requested.load(Ordering::SeqCst), 3);

        slot.request(1);
        assert_eq!(probe.requested.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_cancel_before_subscribe_cancels_late_subscription() {
        let slot = SubscriptionSlot::new();
        slot.cancel();

        let probe = Arc::new(Probe::default());
        slot.set(probe.clone());
        assert!(probe.cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_release_does_not_cancel() {
        let slot = SubscriptionSlot::new();
        let probe = Arc::new(Probe::default());
        slot.set(probe.clone());

        slot.release();
        slot.cancel();
        assert!(!probe.cancelled.load(Ordering::SeqCst));
        assert!(slot.is_closed());
    }
}
