//! async/await view of [`WebClient`].
//!
//! The builders mirror the reactive ones and delegate to them, so request
//! configuration behaves identically. Only the terminal operations differ:
//! they suspend the calling task through the single-value bridge instead of
//! returning publishers.
//!
//! # Example
//!
//! ```
//! use coflux_client::{ClientResponse, FnConnector, RequestHeadersSpec, UriSpec, WebClient};
//! use coflux_core::UpstreamError;
//! use http::StatusCode;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! # tokio_test::block_on(async {
//! let client = WebClient::builder()
//!     .base_url("http://api.test")
//!     .connector(FnConnector::new(|_request| async {
//!         Ok::<_, UpstreamError>(
//!             ClientResponse::builder(StatusCode::OK)
//!                 .content_type(&mime::APPLICATION_JSON)
//!                 .body(r#"{"name":"ada"}"#)
//!                 .build(),
//!         )
//!     }))
//!     .build()
//!     .unwrap()
//!     .into_async();
//!
//! let user: Option<User> = client
//!     .get()
//!     .uri("/users/{id}", &[&1])
//!     .accept(&[mime::APPLICATION_JSON])
//!     .retrieve()
//!     .body()
//!     .await
//!     .unwrap();
//! assert_eq!(user.unwrap().name, "ada");
//! # });
//! ```

mod request;
mod response;

pub use request::AsyncRequestSpec;
pub use response::{AsyncClientResponse, AsyncResponseSpec};

use crate::client::WebClient;
use http::Method;

/// An async/await wrapper over a [`WebClient`].
#[derive(Debug, Clone)]
pub struct AsyncWebClient {
    client: WebClient,
}

impl AsyncWebClient {
    /// Wraps `client`.
    pub fn new(client: WebClient) -> Self {
        Self { client }
    }

    /// The wrapped reactive client.
    pub fn reactive(&self) -> &WebClient {
        &self.client
    }

    /// Starts a GET request.
    pub fn get(&self) -> AsyncRequestSpec {
        self.method(Method::GET)
    }

    /// Starts a HEAD request.
    pub fn head(&self) -> AsyncRequestSpec {
        self.method(Method::HEAD)
    }

    /// Starts a POST request.
    pub fn post(&self) -> AsyncRequestSpec {
        self.method(Method::POST)
    }

    /// Starts a PUT request.
    pub fn put(&self) -> AsyncRequestSpec {
        self.method(Method::PUT)
    }

    /// Starts a PATCH request.
    pub fn patch(&self) -> AsyncRequestSpec {
        self.method(Method::PATCH)
    }

    /// Starts a DELETE request.
    pub fn delete(&self) -> AsyncRequestSpec {
        self.method(Method::DELETE)
    }

    /// Starts an OPTIONS request.
    pub fn options(&self) -> AsyncRequestSpec {
        self.method(Method::OPTIONS)
    }

    /// Starts a request with any method.
    pub fn method(&self, method: Method) -> AsyncRequestSpec {
        AsyncRequestSpec::new(self.client.method(method))
    }
}

impl From<WebClient> for AsyncWebClient {
    fn from(client: WebClient) -> Self {
        Self::new(client)
    }
}
