//! HTTP types handled by the filter pipeline.

use bytes::Bytes;
use http_body_util::Full;

/// A server request with a fully buffered body.
pub type Request = http::Request<Full<Bytes>>;

/// A server response with a fully buffered body.
pub type Response = http::Response<Full<Bytes>>;
