//! Async body extractors.
//!
//! Extractors pick a reader from a [`MessageReaders`] registry, wait for the
//! message body and decode it. The reader lookup happens before the body is
//! touched, so a missing reader fails fast without consuming the body.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use coflux_codec::extract::{to_form_data, HttpInputMessage};
//! use coflux_codec::MessageReaders;
//! use coflux_core::Mono;
//! use http::HeaderMap;
//!
//! struct Submitted(Bytes);
//!
//! impl HttpInputMessage for Submitted {
//!     fn headers(&self) -> &HeaderMap {
//!         static EMPTY: std::sync::OnceLock<HeaderMap> = std::sync::OnceLock::new();
//!         EMPTY.get_or_init(HeaderMap::new)
//!     }
//!
//!     fn body(&self) -> Mono<Bytes> {
//!         Mono::just(self.0.clone())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let message = Submitted(Bytes::from_static(b"name=ada&lang=en"));
//! let form = to_form_data(&message, &MessageReaders::defaults()).await.unwrap().unwrap();
//! assert_eq!(form["name"], vec!["ada"]);
//! # });
//! ```

use crate::media::{self, MultiValueMap};
use crate::registry::MessageReaders;
use crate::target::TargetType;
use bytes::Bytes;
use coflux_core::{BridgeResult, Mono, PublisherExt};
use http::HeaderMap;
use mime::Mime;
use serde::de::DeserializeOwned;

/// A message whose body can be read asynchronously.
pub trait HttpInputMessage: Send + Sync {
    /// Message headers.
    fn headers(&self) -> &HeaderMap;

    /// The aggregated body. Empty bodies complete without a value or with
    /// empty bytes.
    fn body(&self) -> Mono<Bytes>;
}

/// Reads the body as form data.
///
/// The body is always treated as `application/x-www-form-urlencoded`,
/// regardless of the declared content type.
pub async fn to_form_data<M>(message: &M, readers: &MessageReaders) -> BridgeResult<Option<MultiValueMap>>
where
    M: HttpInputMessage + ?Sized,
{
    extract(message, readers, mime::APPLICATION_WWW_FORM_URLENCODED).await
}

/// Reads the body into `T` using the message's content type.
pub async fn to_value<T, M>(message: &M, readers: &MessageReaders) -> BridgeResult<Option<T>>
where
    T: DeserializeOwned + Send + 'static,
    M: HttpInputMessage + ?Sized,
{
    let media_type = media::content_type(message.headers());
    extract(message, readers, media_type).await
}

async fn extract<T, M>(message: &M, readers: &MessageReaders, media_type: Mime) -> BridgeResult<Option<T>>
where
    T: DeserializeOwned + Send + 'static,
    M: HttpInputMessage + ?Sized,
{
    readers.find(&TargetType::of::<T>(), &media_type)?;

    let body = message.body().await_first_or_none().await?;
    match body {
        Some(bytes) => readers.read(&media_type, bytes),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coflux_core::BridgeError;
    use http::header::CONTENT_TYPE;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Message {
        headers: HeaderMap,
        body: Bytes,
        read: Arc<AtomicBool>,
    }

    impl Message {
        fn new(content_type: Option<&str>, body: &'static [u8]) -> Self {
            let mut headers = HeaderMap::new();
            if let Some(content_type) = content_type {
                headers.insert(CONTENT_TYPE, content_type.parse().unwrap());
            }
            Self {
                headers,
                body: Bytes::from_static(body),
                read: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl HttpInputMessage for Message {
        fn headers(&self) -> &HeaderMap {
            &self.headers
        }

        fn body(&self) -> Mono<Bytes> {
            self.read.store(true, Ordering::SeqCst);
            Mono::just(self.body.clone())
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: u32,
    }

    #[tokio::test]
    async fn test_form_data_ignores_content_type() {
        let message = Message::new(Some("text/plain"), b"a=1&a=2");
        let form = to_form_data(&message, &MessageReaders::defaults())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(form["a"], vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_value_uses_content_type() {
        let message = Message::new(Some("application/json"), br#"{"id":7}"#);
        let order: Option<Order> = to_value(&message, &MessageReaders::defaults()).await.unwrap();
        assert_eq!(order, Some(Order { id: 7 }));
    }

    #[tokio::test]
    async fn test_missing_reader_does_not_read_body() {
        let message = Message::new(None, b"{}");
        let err = to_value::<Order, _>(&message, &MessageReaders::defaults())
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::NoReader { .. }));
        assert!(err.to_string().contains("application/octet-stream"));
        assert!(!message.read.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_body_is_none() {
        let message = Message::new(Some("application/json"), b"");
        let order: Option<Order> = to_value(&message, &MessageReaders::defaults()).await.unwrap();
        assert!(order.is_none());
    }
}
