use super::response::{AsyncClientResponse, AsyncResponseSpec};
use crate::client::RequestSpec;
use crate::request::Attributes;
use crate::spec::{RequestBodySpec, RequestHeadersSpec, UriSpec};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use coflux_codec::MultiValueMap;
use coflux_core::{BridgeError, BridgeResult, PublisherExt};
use http::{HeaderMap, Uri};
use mime::Mime;
use serde::Serialize;
use std::any::Any;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// A request being configured, with async terminal operations.
#[derive(Debug)]
pub struct AsyncRequestSpec {
    inner: RequestSpec,
}

impl AsyncRequestSpec {
    pub(crate) fn new(inner: RequestSpec) -> Self {
        Self { inner }
    }

    fn map(self, f: impl FnOnce(RequestSpec) -> RequestSpec) -> Self {
        Self { inner: f(self.inner) }
    }

    /// Executes the request and waits for the response.
    ///
    /// Resolves to `None` if the connector completes without a response.
    /// Invalid configuration is reported here as
    /// [`BridgeError::InvalidRequest`].
    pub async fn exchange(self) -> BridgeResult<Option<AsyncClientResponse>> {
        let response = self.inner.exchange();
        response
            .await_first_or_none()
            .await
            .map(|response| response.map(AsyncClientResponse::new))
            .map_err(BridgeError::flatten)
    }

    /// Prepares body retrieval. Nothing is sent until a body method of
    /// the returned spec is awaited.
    pub fn retrieve(self) -> AsyncResponseSpec {
        AsyncResponseSpec::new(self.inner.retrieve())
    }

    /// The wrapped reactive builder.
    pub fn into_reactive(self) -> RequestSpec {
        self.inner
    }
}

impl UriSpec for AsyncRequestSpec {
    fn uri(self, template: &str, variables: &[&dyn Display]) -> Self {
        self.map(|spec| spec.uri(template, variables))
    }

    fn uri_with_map<K, V>(self, template: &str, variables: &HashMap<K, V>) -> Self
    where
        K: Borrow<str> + Hash + Eq,
        V: Display,
    {
        self.map(|spec| spec.uri_with_map(template, variables))
    }

    fn uri_literal(self, uri: Uri) -> Self {
        self.map(|spec| spec.uri_literal(uri))
    }
}

impl RequestHeadersSpec for AsyncRequestSpec {
    fn accept(self, media_types: &[Mime]) -> Self {
        self.map(|spec| spec.accept(media_types))
    }

    fn accept_charset(self, charsets: &[&str]) -> Self {
        self.map(|spec| spec.accept_charset(charsets))
    }

    fn cookie(self, name: &str, value: &str) -> Self {
        self.map(|spec| spec.cookie(name, value))
    }

    fn cookies<F>(self, edit: F) -> Self
    where
        F: FnOnce(&mut MultiValueMap),
    {
        self.map(|spec| spec.cookies(edit))
    }

    fn if_modified_since(self, since: DateTime<Utc>) -> Self {
        self.map(|spec| spec.if_modified_since(since))
    }

    fn if_none_match(self, etags: &[&str]) -> Self {
        self.map(|spec| spec.if_none_match(etags))
    }

    fn header(self, name: &str, values: &[&str]) -> Self {
        self.map(|spec| spec.header(name, values))
    }

    fn headers<F>(self, edit: F) -> Self
    where
        F: FnOnce(&mut HeaderMap),
    {
        self.map(|spec| spec.headers(edit))
    }

    fn attribute<V>(self, name: &str, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        self.map(|spec| spec.attribute(name, value))
    }

    fn attributes<F>(self, edit: F) -> Self
    where
        F: FnOnce(&mut Attributes),
    {
        self.map(|spec| spec.attributes(edit))
    }
}

impl RequestBodySpec for AsyncRequestSpec {
    fn content_type(self, media_type: &Mime) -> Self {
        self.map(|spec| spec.content_type(media_type))
    }

    fn content_length(self, length: u64) -> Self {
        self.map(|spec| spec.content_length(length))
    }

    fn body(self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.map(|spec| spec.body(body))
    }

    fn json<T>(self, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        self.map(|spec| spec.json(value))
    }

    fn form(self, form: &MultiValueMap) -> Self {
        self.map(|spec| spec.form(form))
    }
}
