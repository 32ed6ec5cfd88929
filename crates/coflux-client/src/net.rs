//! Network connector backed by `reqwest`.

use crate::connector::Connector;
use crate::error::ConnectError;
use crate::request::ClientRequest;
use crate::response::ClientResponse;
use coflux_codec::MessageReaders;
use coflux_core::{BridgeError, BridgeResult, Flux, Mono, UpstreamError};
use futures_util::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;

/// Sends requests over the network.
///
/// The response body is streamed: chunks are pulled from the connection
/// only as the body publisher is drained.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    /// Creates a connector with an optional overall request timeout.
    pub fn new(timeout: Option<Duration>) -> BridgeResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(BridgeError::upstream)?;
        Ok(Self { client })
    }

    /// Uses an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Connector for HttpConnector {
    fn execute(&self, request: ClientRequest) -> Mono<ClientResponse> {
        let client = self.client.clone();
        Mono::from_future(async move {
            let uri = request.uri.clone();
            let headers = request.wire_headers().map_err(BridgeError::into_upstream)?;
            let mut builder = client
                .request(request.method.clone(), uri.to_string())
                .headers(headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            tracing::debug!(method = %request.method, %uri, "dispatching request");
            let response = builder
                .send()
                .await
                .map_err(|source| connect_error(&uri, source))?;

            let status = response.status();
            let headers = response.headers().clone();
            tracing::debug!(%status, %uri, "response received");

            let body = response
                .bytes_stream()
                .map_err(move |source| connect_error(&uri, source));
            Ok(ClientResponse::new(
                status,
                headers,
                Flux::from_stream(body),
                Arc::new(MessageReaders::defaults()),
            ))
        })
    }
}

fn connect_error(uri: &http::Uri, source: reqwest::Error) -> UpstreamError {
    Arc::new(ConnectError {
        uri: uri.clone(),
        source,
    })
}
