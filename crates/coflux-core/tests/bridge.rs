//! End-to-end behaviour of the async bridges over the reference publishers.

use coflux_core::{BridgeError, Flux, Mono, Publisher, PublisherExt, Subscriber, Subscription, UpstreamError};
use futures_util::{stream, TryStreamExt};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("source failed at {0}")]
struct SourceFailed(usize);

/// Flags its owner as released when the source stream is dropped.
struct Released(Arc<AtomicBool>);

impl Drop for Released {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn tracked_source(released: Arc<AtomicBool>, produced: Arc<AtomicUsize>) -> Flux<usize> {
    Flux::defer(move || {
        let guard = Released(Arc::clone(&released));
        let produced = Arc::clone(&produced);
        stream::unfold((guard, 0usize), move |(guard, next)| {
            produced.fetch_add(1, Ordering::SeqCst);
            async move { Some((Ok::<_, UpstreamError>(next), (guard, next + 1))) }
        })
    })
}

async fn wait_for(flag: &AtomicBool) {
    for _ in 0..50 {
        if flag.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_first_value_cancels_infinite_source() {
    let released = Arc::new(AtomicBool::new(false));
    let produced = Arc::new(AtomicUsize::new(0));
    let flux = tracked_source(Arc::clone(&released), Arc::clone(&produced));

    assert_eq!(flux.await_first_or_none().await.unwrap(), Some(0));
    wait_for(&released).await;

    assert!(released.load(Ordering::SeqCst));
    assert_eq!(produced.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropping_stream_releases_source() {
    let released = Arc::new(AtomicBool::new(false));
    let produced = Arc::new(AtomicUsize::new(0));
    let flux = tracked_source(Arc::clone(&released), Arc::clone(&produced));

    let mut values = flux.open_subscription();
    assert_eq!(values.recv().await.unwrap().unwrap(), 0);
    assert_eq!(values.recv().await.unwrap().unwrap(), 1);
    drop(values);
    wait_for(&released).await;

    assert!(released.load(Ordering::SeqCst));
    assert_eq!(produced.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_explicit_cancel_releases_source() {
    let released = Arc::new(AtomicBool::new(false));
    let flux = tracked_source(Arc::clone(&released), Arc::new(AtomicUsize::new(0)));

    let mut values = flux.open_subscription();
    values.recv().await.unwrap().unwrap();
    values.cancel();
    wait_for(&released).await;

    assert!(released.load(Ordering::SeqCst));
    assert!(values.recv().await.is_none());
}

#[tokio::test]
async fn test_abandoned_await_releases_source() {
    let released = Arc::new(AtomicBool::new(false));
    let flux: Flux<usize> = {
        let released = Arc::clone(&released);
        Flux::defer(move || {
            let guard = Released(Arc::clone(&released));
            stream::unfold(guard, |guard| async move {
                std::future::pending::<()>().await;
                Some((Ok::<usize, UpstreamError>(0), guard))
            })
        })
    };

    let outcome = tokio::time::timeout(Duration::from_millis(20), flux.await_first_or_none()).await;
    assert!(outcome.is_err());
    wait_for(&released).await;
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_failing_mono_surfaces_upstream_error() {
    let mono = Mono::<String>::error(Arc::new(SourceFailed(0)));
    match mono.await_first_or_default(String::new()).await {
        Err(BridgeError::Upstream(error)) => assert_eq!(error.to_string(), "source failed at 0"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_subscriptions_are_independent() {
    let flux = Arc::new(Flux::from_iter(vec![1, 2, 3]));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let flux = Arc::clone(&flux);
            tokio::spawn(async move {
                flux.open_subscription().try_collect::<Vec<i32>>().await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), vec![1, 2, 3]);
    }
}

/// Emits its values strictly against demand and records every `request(n)`.
struct Scripted {
    values: Vec<u32>,
    complete_eagerly: bool,
    requests: Arc<Mutex<Vec<u64>>>,
}

struct ScriptedSubscription {
    state: Mutex<ScriptedState>,
    requests: Arc<Mutex<Vec<u64>>>,
    complete_eagerly: bool,
}

struct ScriptedState {
    subscriber: Option<Box<dyn Subscriber<u32>>>,
    remaining: VecDeque<u32>,
    demand: u64,
    done: bool,
}

impl ScriptedSubscription {
    fn drain(&self) {
        let mut state = self.state.lock();
        let ScriptedState {
            subscriber,
            remaining,
            demand,
            done,
        } = &mut *state;
        let Some(subscriber) = subscriber.as_mut() else {
            return;
        };
        while *demand > 0 && !*done {
            match remaining.pop_front() {
                Some(value) => {
                    *demand -= 1;
                    subscriber.on_next(value);
                }
                None => {
                    *done = true;
                    subscriber.on_complete();
                }
            }
        }
        if self.complete_eagerly && !*done && remaining.is_empty() {
            *done = true;
            subscriber.on_complete();
        }
    }
}

impl Subscription for ScriptedSubscription {
    fn request(&self, n: u64) {
        self.requests.lock().push(n);
        self.state.lock().demand += n;
        self.drain();
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        state.done = true;
        state.subscriber = None;
    }
}

impl Publisher<u32> for Scripted {
    fn subscribe(&self, mut subscriber: Box<dyn Subscriber<u32>>) {
        let subscription = Arc::new(ScriptedSubscription {
            state: Mutex::new(ScriptedState {
                subscriber: None,
                remaining: self.values.iter().copied().collect(),
                demand: 0,
                done: false,
            }),
            requests: Arc::clone(&self.requests),
            complete_eagerly: self.complete_eagerly,
        });
        subscriber.on_subscribe(subscription.clone());
        subscription.state.lock().subscriber = Some(subscriber);
        subscription.drain();
    }
}

fn scripted(values: Vec<u32>, complete_eagerly: bool) -> (Scripted, Arc<Mutex<Vec<u64>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let publisher = Scripted {
        values,
        complete_eagerly,
        requests: Arc::clone(&requests),
    };
    (publisher, requests)
}

#[tokio::test]
async fn test_each_pull_requests_exactly_one() {
    let (publisher, requests) = scripted(vec![10, 20, 30], false);

    let mut values = publisher.open_subscription();
    assert!(requests.lock().is_empty());

    for (pulls, expected) in [10, 20, 30].into_iter().enumerate() {
        assert_eq!(values.recv().await.unwrap().unwrap(), expected);
        assert_eq!(*requests.lock(), vec![1; pulls + 1]);
    }
}

#[tokio::test]
async fn test_no_request_after_stream_ends() {
    let (publisher, requests) = scripted(vec![1, 2], false);
    let mut values = publisher.open_subscription();
    assert_eq!(values.recv().await.unwrap().unwrap(), 1);
    assert_eq!(values.recv().await.unwrap().unwrap(), 2);

    // The pull that discovers completion is the last one to signal demand.
    assert!(values.recv().await.is_none());
    assert_eq!(*requests.lock(), vec![1, 1, 1]);
    assert!(values.recv().await.is_none());
    assert!(values.recv().await.is_none());
    assert_eq!(requests.lock().len(), 3);
}

#[tokio::test]
async fn test_buffered_completion_needs_no_demand() {
    let (publisher, requests) = scripted(vec![1, 2], true);
    let mut values = publisher.open_subscription();
    assert_eq!(values.recv().await.unwrap().unwrap(), 1);
    assert_eq!(values.recv().await.unwrap().unwrap(), 2);

    assert!(values.recv().await.is_none());
    assert!(values.recv().await.is_none());
    assert_eq!(*requests.lock(), vec![1, 1]);
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_stream_preserves_publisher_order(values in proptest::collection::vec(any::<i64>(), 0..64)) {
        let expected = values.clone();
        let collected = block_on(async move {
            Flux::from_iter(values).open_subscription().try_collect::<Vec<_>>().await
        });
        prop_assert_eq!(collected.unwrap(), expected);
    }

    #[test]
    fn prop_first_value_matches_head(values in proptest::collection::vec(any::<u16>(), 0..16), default in any::<u16>()) {
        let expected = values.first().copied().unwrap_or(default);
        let first = block_on(async move {
            Flux::from_iter(values).await_first_or_default(default).await
        });
        prop_assert_eq!(first.unwrap(), expected);
    }

    #[test]
    fn prop_error_ends_stream_after_prefix(prefix in proptest::collection::vec(any::<u8>(), 0..16)) {
        let len = prefix.len();
        let items: Vec<Result<u8, UpstreamError>> = prefix
            .iter()
            .copied()
            .map(Ok)
            .chain(std::iter::once(Err(Arc::new(SourceFailed(len)) as UpstreamError)))
            .collect();

        let (values, failure, rest) = block_on(async move {
            let mut subscription = Flux::from_stream(stream::iter(items)).open_subscription();
            let mut values = Vec::new();
            let mut failure = None;
            while let Some(item) = subscription.recv().await {
                match item {
                    Ok(v) => values.push(v),
                    Err(e) => failure = Some(e.to_string()),
                }
            }
            let rest = subscription.recv().await.is_none();
            (values, failure, rest)
        });

        prop_assert_eq!(values, prefix);
        prop_assert_eq!(failure, Some(format!("source failed at {len}")));
        prop_assert!(rest);
    }
}
