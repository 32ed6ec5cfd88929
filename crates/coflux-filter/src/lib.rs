//! # Coflux Filter
//!
//! A reactive server filter chain and an adapter for writing its filters
//! with async/await.
//!
//! ## Modules
//!
//! - [`chain`]: the reactive contract ([`WebFilter`], [`WebFilterChain`],
//!   [`WebHandler`]) and [`FilteringWebHandler`], which drives a request
//!   through the chain.
//! - [`bridge`]: [`AsyncWebFilter`], [`AsyncFilterAdapter`] and
//!   [`AsyncFilterChain`].
//! - [`exchange`]: [`ServerWebExchange`], the per-request state.
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use coflux_filter::{async_filter_fn, handler_fn, FilteringWebHandler};
//! use http::header::{HeaderName, HeaderValue};
//! use http_body_util::Full;
//!
//! # tokio_test::block_on(async {
//! let pipeline = FilteringWebHandler::new(handler_fn(|exchange| async move {
//!     exchange.set_response_body("ok");
//!     Ok::<(), coflux_core::UpstreamError>(())
//! }))
//! .filter(async_filter_fn("request-id", |exchange, chain| async move {
//!     let id = HeaderValue::from_str(&exchange.id().to_string()).ok();
//!     if let Some(id) = id {
//!         exchange.set_response_header(HeaderName::from_static("x-request-id"), id);
//!     }
//!     chain.filter(exchange).await
//! }));
//!
//! let response = pipeline.handle_request(http::Request::new(Full::new(Bytes::new()))).await;
//! assert!(response.headers().contains_key("x-request-id"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/coflux-filter/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bridge;
pub mod chain;
pub mod error;
pub mod exchange;
pub mod types;

pub use bridge::{async_filter_fn, AsyncFilterAdapter, AsyncFilterChain, AsyncWebFilter, FnAsyncFilter};
pub use chain::{
    handler_fn, DefaultWebFilterChain, FilteringWebHandler, FnHandler, SharedChain, WebFilter, WebFilterChain,
    WebHandler,
};
pub use error::FilterError;
pub use exchange::{ExchangeBuilder, ServerWebExchange};
pub use types::{Request, Response};
