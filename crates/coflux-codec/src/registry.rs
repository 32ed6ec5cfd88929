//! Ordered reader registry.

use crate::reader::{ByteArrayReader, FormReader, JsonReader, MessageReader, StringReader};
use crate::target::TargetType;
use bytes::Bytes;
use coflux_core::{BridgeError, BridgeResult};
use mime::Mime;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// An ordered list of message readers. The first reader that accepts a
/// (target type, media type) pair is used.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use coflux_codec::MessageReaders;
///
/// let readers = MessageReaders::defaults();
/// let text: Option<String> = readers
///     .read(&mime::TEXT_PLAIN, Bytes::from_static(b"hello"))
///     .unwrap();
/// assert_eq!(text.as_deref(), Some("hello"));
///
/// let err = readers
///     .read::<std::collections::HashMap<String, i32>>(&mime::TEXT_CSV, Bytes::from_static(b"a,b"))
///     .unwrap_err();
/// assert!(err.to_string().contains("text/csv"));
/// ```
#[derive(Debug, Clone)]
pub struct MessageReaders {
    readers: Vec<Arc<dyn MessageReader>>,
}

impl MessageReaders {
    /// The default registry: bytes, string, form and JSON readers, in that
    /// order.
    pub fn defaults() -> Self {
        Self::empty()
            .with(ByteArrayReader)
            .with(StringReader)
            .with(FormReader)
            .with(JsonReader)
    }

    /// A registry without readers.
    pub fn empty() -> Self {
        Self { readers: Vec::new() }
    }

    /// Appends a reader. Earlier readers take precedence.
    pub fn with<R: MessageReader + 'static>(mut self, reader: R) -> Self {
        self.readers.push(Arc::new(reader));
        self
    }

    /// Number of registered readers.
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// True if no reader is registered.
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Iterates over the readers in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MessageReader>> {
        self.readers.iter()
    }

    /// Finds the first reader for `target` and `media_type`.
    pub fn find(&self, target: &TargetType, media_type: &Mime) -> BridgeResult<&Arc<dyn MessageReader>> {
        self.readers
            .iter()
            .find(|reader| reader.can_read(target, media_type))
            .ok_or_else(|| BridgeError::no_reader(media_type.as_ref(), target.name()))
    }

    /// Decodes a complete body into `T`.
    ///
    /// The reader is looked up first, so a missing reader is reported even
    /// for an empty body. An empty body then resolves to `None`.
    pub fn read<T>(&self, media_type: &Mime, body: Bytes) -> BridgeResult<Option<T>>
    where
        T: DeserializeOwned + 'static,
    {
        let target = TargetType::of::<T>();
        let reader = self.find(&target, media_type)?;
        if body.is_empty() {
            return Ok(None);
        }
        tracing::trace!(reader = reader.name(), target = target.name(), %media_type, "decoding body");
        reader.read(&target, media_type, body)?.into_typed(media_type).map(Some)
    }
}

impl Default for MessageReaders {
    fn default() -> Self {
        Self::defaults()
    }
}
