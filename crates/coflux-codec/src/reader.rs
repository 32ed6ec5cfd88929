//! Message readers.
//!
//! A [`MessageReader`] decodes a complete body into a [`Decoded`] payload
//! for the (target type, media type) pairs it accepts. The default set
//! mirrors what a reactive web stack registers out of the box:
//!
//! | Reader | Target types | Media types |
//! |--------|--------------|-------------|
//! | [`ByteArrayReader`] | `Bytes`, `Vec<u8>` | any |
//! | [`StringReader`] | `String` | any |
//! | [`FormReader`] | `MultiValueMap` | `application/x-www-form-urlencoded` |
//! | [`JsonReader`] | any | `application/json`, `*/*+json` |

use crate::media::{self, MultiValueMap};
use crate::target::{Decoded, TargetType};
use bytes::Bytes;
use coflux_core::{BridgeError, BridgeResult};
use mime::Mime;
use std::fmt;

/// Decodes message bodies.
pub trait MessageReader: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// True if this reader can decode `media_type` into `target`.
    fn can_read(&self, target: &TargetType, media_type: &Mime) -> bool;

    /// Decodes a complete, non-empty body.
    fn read(&self, target: &TargetType, media_type: &Mime, body: Bytes) -> BridgeResult<Decoded>;
}

/// Passes the body through as raw bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByteArrayReader;

impl MessageReader for ByteArrayReader {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn can_read(&self, target: &TargetType, _media_type: &Mime) -> bool {
        target.is::<Bytes>() || target.is::<Vec<u8>>()
    }

    fn read(&self, _target: &TargetType, _media_type: &Mime, body: Bytes) -> BridgeResult<Decoded> {
        Ok(Decoded::Bytes(body))
    }
}

/// Decodes UTF-8 (or ASCII) text.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringReader;

impl MessageReader for StringReader {
    fn name(&self) -> &'static str {
        "string"
    }

    fn can_read(&self, target: &TargetType, _media_type: &Mime) -> bool {
        target.is::<String>()
    }

    fn read(&self, target: &TargetType, media_type: &Mime, body: Bytes) -> BridgeResult<Decoded> {
        if let Some(charset) = media::charset(media_type) {
            if !matches!(charset.as_str(), "utf-8" | "utf8" | "us-ascii") {
                return Err(BridgeError::decode(
                    media_type.as_ref(),
                    target.name(),
                    format!("unsupported charset: {charset}"),
                ));
            }
        }
        String::from_utf8(body.to_vec())
            .map(Decoded::Text)
            .map_err(|e| BridgeError::decode(media_type.as_ref(), target.name(), e.to_string()))
    }
}

/// Decodes `application/x-www-form-urlencoded` bodies into a [`MultiValueMap`].
///
/// Repeated keys keep every value, in body order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormReader;

impl MessageReader for FormReader {
    fn name(&self) -> &'static str {
        "form"
    }

    fn can_read(&self, target: &TargetType, media_type: &Mime) -> bool {
        target.is::<MultiValueMap>() && media::is_form(media_type)
    }

    fn read(&self, target: &TargetType, media_type: &Mime, body: Bytes) -> BridgeResult<Decoded> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
            .map_err(|e| BridgeError::decode(media_type.as_ref(), target.name(), e.to_string()))?;

        let mut form = MultiValueMap::new();
        for (key, value) in pairs {
            form.entry(key).or_default().push(value);
        }
        Ok(Decoded::Form(form))
    }
}

/// Parses JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReader;

impl MessageReader for JsonReader {
    fn name(&self) -> &'static str {
        "json"
    }

    fn can_read(&self, _target: &TargetType, media_type: &Mime) -> bool {
        media::is_json(media_type)
    }

    fn read(&self, target: &TargetType, media_type: &Mime, body: Bytes) -> BridgeResult<Decoded> {
        serde_json::from_slice(&body)
            .map(Decoded::Json)
            .map_err(|e| BridgeError::decode(media_type.as_ref(), target.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_media() -> Mime {
        mime::APPLICATION_WWW_FORM_URLENCODED
    }

    #[test]
    fn test_form_keeps_repeated_keys() {
        let decoded = FormReader
            .read(
                &TargetType::of::<MultiValueMap>(),
                &form_media(),
                Bytes::from_static(b"tag=a&name=joe&tag=b"),
            )
            .unwrap();

        let Decoded::Form(form) = decoded else {
            panic!("expected form payload");
        };
        assert_eq!(form["tag"], vec!["a", "b"]);
        assert_eq!(form.get_index(1).unwrap().0, "name");
    }

    #[test]
    fn test_form_requires_form_media_type() {
        let target = TargetType::of::<MultiValueMap>();
        assert!(FormReader.can_read(&target, &form_media()));
        assert!(!FormReader.can_read(&target, &mime::APPLICATION_JSON));
        assert!(!FormReader.can_read(&TargetType::of::<String>(), &form_media()));
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        let err = StringReader
            .read(
                &TargetType::of::<String>(),
                &mime::TEXT_PLAIN_UTF_8,
                Bytes::from_static(&[0xff, 0xfe]),
            )
            .unwrap_err();
        assert!(matches!(err, BridgeError::Decode { .. }));
    }

    #[test]
    fn test_string_rejects_unknown_charset() {
        let latin: Mime = "text/plain; charset=iso-8859-1".parse().unwrap();
        let err = StringReader
            .read(&TargetType::of::<String>(), &latin, Bytes::from_static(b"x"))
            .unwrap_err();
        assert!(err.to_string().contains("iso-8859-1"));
    }

    #[test]
    fn test_json_reports_syntax_errors() {
        let err = JsonReader
            .read(
                &TargetType::of::<serde_json::Value>(),
                &mime::APPLICATION_JSON,
                Bytes::from_static(b"{not json"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("application/json"));
    }
}
