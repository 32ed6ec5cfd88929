//! Capability traits of the fluent request builders.
//!
//! A single concrete builder type implements all three traits, so URI,
//! header and body configuration can be chained in any order. Every
//! method consumes the builder and returns it. Invalid input (a header
//! name that is not a token, a URI that does not parse) is recorded and
//! reported when the request is executed.

use crate::request::Attributes;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use coflux_codec::MultiValueMap;
use http::{HeaderMap, Uri};
use mime::Mime;
use serde::Serialize;
use std::any::Any;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Target URI configuration.
pub trait UriSpec: Sized {
    /// Expands `template`, filling `{..}` placeholders in order.
    ///
    /// Values are percent-encoded. Relative templates resolve against the
    /// client's base URL.
    fn uri(self, template: &str, variables: &[&dyn Display]) -> Self;

    /// Expands `template`, filling `{name}` placeholders from `variables`.
    fn uri_with_map<K, V>(self, template: &str, variables: &HashMap<K, V>) -> Self
    where
        K: Borrow<str> + Hash + Eq,
        V: Display;

    /// Uses `uri` as is.
    fn uri_literal(self, uri: Uri) -> Self;
}

/// Header, cookie and attribute configuration.
pub trait RequestHeadersSpec: Sized {
    /// Sets `Accept`.
    fn accept(self, media_types: &[Mime]) -> Self;

    /// Sets `Accept-Charset`.
    fn accept_charset(self, charsets: &[&str]) -> Self;

    /// Adds a cookie value.
    fn cookie(self, name: &str, value: &str) -> Self;

    /// Edits the cookie jar.
    fn cookies<F>(self, edit: F) -> Self
    where
        F: FnOnce(&mut MultiValueMap);

    /// Sets `If-Modified-Since`.
    fn if_modified_since(self, since: DateTime<Utc>) -> Self;

    /// Sets `If-None-Match`.
    fn if_none_match(self, etags: &[&str]) -> Self;

    /// Replaces header `name` with `values`.
    fn header(self, name: &str, values: &[&str]) -> Self;

    /// Edits the headers directly.
    fn headers<F>(self, edit: F) -> Self
    where
        F: FnOnce(&mut HeaderMap);

    /// Sets a request attribute.
    fn attribute<V>(self, name: &str, value: V) -> Self
    where
        V: Any + Send + Sync;

    /// Edits the request attributes.
    fn attributes<F>(self, edit: F) -> Self
    where
        F: FnOnce(&mut Attributes);
}

/// Body configuration.
pub trait RequestBodySpec: Sized {
    /// Sets `Content-Type`.
    fn content_type(self, media_type: &Mime) -> Self;

    /// Sets `Content-Length`.
    fn content_length(self, length: u64) -> Self;

    /// Uses raw bytes as the body.
    fn body(self, body: impl Into<Bytes>) -> Self;

    /// Serializes `value` as JSON and sets the content type unless one is
    /// already set.
    fn json<T>(self, value: &T) -> Self
    where
        T: Serialize + ?Sized;

    /// Encodes `form` as `application/x-www-form-urlencoded`.
    fn form(self, form: &MultiValueMap) -> Self;
}
