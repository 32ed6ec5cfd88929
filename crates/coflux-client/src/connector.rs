//! The engine seam of the reactive client.
//!
//! A [`Connector`] turns a [`ClientRequest`] into a lazy
//! `Mono<ClientResponse>`. Nothing is sent until the mono is subscribed and
//! demand is requested, so building a request never performs I/O.

use crate::request::ClientRequest;
use crate::response::ClientResponse;
use coflux_core::{Mono, UpstreamError};
use std::future::Future;
use std::sync::Arc;

/// Executes requests.
pub trait Connector: Send + Sync {
    /// Returns a publisher of the response to `request`.
    fn execute(&self, request: ClientRequest) -> Mono<ClientResponse>;
}

impl<C: Connector + ?Sized> Connector for Arc<C> {
    fn execute(&self, request: ClientRequest) -> Mono<ClientResponse> {
        (**self).execute(request)
    }
}

/// A connector backed by an async function.
///
/// Useful for in-memory servers and tests.
///
/// # Example
///
/// ```
/// use coflux_client::{ClientResponse, FnConnector};
/// use coflux_core::UpstreamError;
/// use http::StatusCode;
///
/// let connector = FnConnector::new(|request| async move {
///     Ok::<_, UpstreamError>(
///         ClientResponse::builder(StatusCode::OK)
///             .body(request.uri.path().to_string())
///             .build(),
///     )
/// });
/// # let _ = connector;
/// ```
pub struct FnConnector<F> {
    handler: Arc<F>,
}

impl<F, Fut> FnConnector<F>
where
    F: Fn(ClientRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ClientResponse, UpstreamError>> + Send + 'static,
{
    /// Wraps `handler`.
    pub fn new(handler: F) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl<F, Fut> Connector for FnConnector<F>
where
    F: Fn(ClientRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ClientResponse, UpstreamError>> + Send + 'static,
{
    fn execute(&self, request: ClientRequest) -> Mono<ClientResponse> {
        let handler = Arc::clone(&self.handler);
        Mono::from_future(async move {
            tracing::debug!(method = %request.method, uri = %request.uri, "dispatching request");
            handler(request).await
        })
    }
}

impl<F> Clone for FnConnector<F> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<F> std::fmt::Debug for FnConnector<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnConnector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coflux_core::PublisherExt;
    use http::{Method, StatusCode, Uri};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_execute_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let connector = FnConnector::new(move |_request| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, coflux_core::UpstreamError>(ClientResponse::builder(StatusCode::OK).build()) }
        });

        let response = connector.execute(ClientRequest::new(Method::GET, Uri::from_static("/")));
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let response = response.await_first_or_none().await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
