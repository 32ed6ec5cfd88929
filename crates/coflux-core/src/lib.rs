//! # Coflux Core
//!
//! Reactive-streams primitives and the bridges that let `async` code consume
//! them.
//!
//! ## Overview
//!
//! Reactive APIs hand out [`Publisher`]s: lazy, demand-driven sources that
//! push values to a [`Subscriber`]. This crate provides:
//!
//! - The contract itself ([`Publisher`], [`Subscriber`], [`Subscription`])
//! - Reference publishers: [`Mono`] (zero or one value) and [`Flux`]
//!   (zero or more values), both backed by `futures`
//! - The single-value bridge: [`PublisherExt::await_first_or_default`] and
//!   [`PublisherExt::await_first_or_none`]
//! - The multi-value bridge: [`PublisherExt::open_subscription`], returning a
//!   cancellable [`SubscriptionStream`]
//! - [`StreamingCallback`] for callbacks that stream results
//!
//! ## Example
//!
//! ```
//! use coflux_core::{Flux, Mono, PublisherExt};
//!
//! # tokio_test::block_on(async {
//! let greeting = Mono::just("hello".to_string());
//! assert_eq!(greeting.await_first_or_none().await.unwrap().as_deref(), Some("hello"));
//!
//! let mut numbers = Flux::from_iter(vec![1, 2, 3]).open_subscription();
//! while let Some(n) = numbers.recv().await {
//!     assert!(n.unwrap() <= 3);
//! }
//! # });
//! ```
//!
//! ## Cancellation
//!
//! Dropping a pending bridge future or a [`SubscriptionStream`] cancels the
//! upstream subscription. Reference publishers react by aborting the task
//! that drives them.

#![doc(html_root_url = "https://docs.rs/coflux-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bridge;
pub mod callback;
pub mod error;
pub mod flux;
pub mod mono;
pub mod publisher;

pub use bridge::{first_or_default, first_or_none, PublisherExt, SubscriptionStream};
pub use callback::{ReactiveCallback, StreamingCallback};
pub use error::{BridgeError, BridgeResult, UpstreamError};
pub use flux::{Flux, SourceStream};
pub use mono::{Mono, MonoFuture};
pub use publisher::{reject, NoopSubscription, Publisher, Subscriber, Subscription};
