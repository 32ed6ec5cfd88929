//! # Coflux Client
//!
//! A reactive HTTP client and its async/await adapter.
//!
//! - [`WebClient`] builds requests and returns lazy publishers: no I/O
//!   happens before a publisher is subscribed.
//! - [`AsyncWebClient`] wraps it. Request configuration is identical
//!   (same [`UriSpec`], [`RequestHeadersSpec`] and [`RequestBodySpec`]
//!   traits); terminal operations suspend until the response arrives.
//! - [`Connector`] is the engine seam: [`HttpConnector`] sends requests
//!   with `reqwest`, [`FnConnector`] answers them in memory.
//!
//! ## Example
//!
//! ```
//! use coflux_client::{ClientResponse, FnConnector, UriSpec, WebClient};
//! use coflux_core::{BridgeError, UpstreamError};
//! use http::StatusCode;
//!
//! # tokio_test::block_on(async {
//! let client = WebClient::new(FnConnector::new(|_request| async {
//!     Ok::<_, UpstreamError>(ClientResponse::builder(StatusCode::OK).body("{}").build())
//! }))
//! .into_async();
//!
//! // No reader turns application/octet-stream into a map.
//! let err = client
//!     .get()
//!     .uri("http://api.test/", &[])
//!     .retrieve()
//!     .body::<std::collections::HashMap<String, String>>()
//!     .await
//!     .unwrap_err();
//! assert!(matches!(err, BridgeError::NoReader { .. }));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/coflux-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod asynchronous;
mod client;
mod connector;
mod error;
mod net;
mod request;
mod response;
mod spec;
mod uri;

pub use asynchronous::{AsyncClientResponse, AsyncRequestSpec, AsyncResponseSpec, AsyncWebClient};
pub use client::{RequestSpec, ResponseSpec, WebClient, WebClientBuilder};
pub use connector::{Connector, FnConnector};
pub use error::{ConnectError, ResponseStatusError};
pub use net::HttpConnector;
pub use request::{Attributes, ClientRequest};
pub use response::{ClientResponse, ClientResponseBuilder};
pub use spec::{RequestBodySpec, RequestHeadersSpec, UriSpec};
