//! # Coflux Codec
//!
//! Message readers and async body extractors.
//!
//! Bodies are decoded by the first [`MessageReader`] in a
//! [`MessageReaders`] registry that accepts the (target type, media type)
//! pair. When none does, decoding fails with
//! [`BridgeError::NoReader`](coflux_core::BridgeError::NoReader) naming both.
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use coflux_codec::MessageReaders;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! let readers = MessageReaders::defaults();
//! let user: User = readers
//!     .read(&mime::APPLICATION_JSON, Bytes::from_static(br#"{"name":"ada"}"#))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(user.name, "ada");
//! ```

#![doc(html_root_url = "https://docs.rs/coflux-codec/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod extract;
pub mod media;
pub mod reader;
pub mod registry;
pub mod target;

pub use extract::{to_form_data, to_value, HttpInputMessage};
pub use media::MultiValueMap;
pub use reader::{ByteArrayReader, FormReader, JsonReader, MessageReader, StringReader};
pub use registry::MessageReaders;
pub use target::{Decoded, TargetType};
