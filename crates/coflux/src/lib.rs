//! # Coflux
//!
//! **async/await on top of reactive publishers**
//!
//! Reactive APIs return lazy `Mono`/`Flux` publishers. coflux lets `async`
//! code consume them without giving up their semantics:
//!
//! - [`core`]: publishers and the bridges (`await_first_or_default`,
//!   `await_first_or_none`, `open_subscription`)
//! - [`codec`]: message readers and body extraction
//! - [`client`]: a reactive web client and its async facade
//! - [`filter`]: a reactive server filter chain and async filters for it
//! - [`config`] and [`telemetry`]: configuration loading and logging setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use coflux::prelude::*;
//!
//! #[derive(serde::Deserialize)]
//! struct Account {
//!     id: u64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("COFLUX").load()?;
//!     init_logging(&LogConfig::from(&config.logging))?;
//!
//!     let client = WebClient::builder().config(&config.client).build()?.into_async();
//!     let account: Option<Account> = client
//!         .get()
//!         .uri("/accounts/{id}", &[&42])
//!         .retrieve()
//!         .body()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/coflux/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Publishers and bridges
pub use coflux_core as core;

// Message readers
pub use coflux_codec as codec;

// Configuration
pub use coflux_config as config;

// Logging setup
pub use coflux_telemetry as telemetry;

// Web client
pub use coflux_client as client;

// Server filter chain
pub use coflux_filter as filter;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use coflux::prelude::*;
///
/// # tokio_test::block_on(async {
/// let value = Mono::just(7).await_first_or_default(0).await.unwrap();
/// assert_eq!(value, 7);
/// # });
/// ```
pub mod prelude {
    pub use coflux_core::{
        BridgeError, BridgeResult, Flux, Mono, Publisher, PublisherExt, StreamingCallback, Subscriber,
        SubscriptionStream, UpstreamError,
    };

    pub use coflux_codec::{HttpInputMessage, MessageReader, MessageReaders, MultiValueMap};

    pub use coflux_config::{CofluxConfig, ConfigLoader};

    pub use coflux_telemetry::{init_logging, LogConfig};

    pub use coflux_client::{
        AsyncClientResponse, AsyncWebClient, ClientResponse, Connector, FnConnector, RequestBodySpec,
        RequestHeadersSpec, ResponseStatusError, UriSpec, WebClient,
    };

    pub use coflux_filter::{
        async_filter_fn, handler_fn, AsyncFilterAdapter, AsyncFilterChain, AsyncWebFilter, FilteringWebHandler,
        ServerWebExchange, WebFilter, WebFilterChain, WebHandler,
    };
}
