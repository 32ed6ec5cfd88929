//! Target types and decoded payloads.
//!
//! Readers do not know the concrete Rust type they decode into. They see a
//! [`TargetType`] (a `TypeId` plus a readable name) and produce a
//! [`Decoded`] payload, which is then converted into the caller's type.

use crate::media::MultiValueMap;
use bytes::Bytes;
use coflux_core::{BridgeError, BridgeResult};
use mime::Mime;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::fmt;

/// Runtime description of the type a body is decoded into.
#[derive(Debug, Clone, Copy)]
pub struct TargetType {
    id: TypeId,
    name: &'static str,
}

impl TargetType {
    /// Describes `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True if this describes `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TargetType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TargetType {}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A payload as produced by a message reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Raw bytes.
    Bytes(Bytes),
    /// Character data.
    Text(String),
    /// Form fields.
    Form(MultiValueMap),
    /// A JSON document.
    Json(serde_json::Value),
}

impl Decoded {
    /// Converts the payload into `T`.
    ///
    /// Bytes convert to [`Bytes`] or `Vec<u8>`, text to [`String`], form
    /// fields to [`MultiValueMap`]. Everything else goes through serde.
    pub fn into_typed<T>(self, media_type: &Mime) -> BridgeResult<T>
    where
        T: DeserializeOwned + 'static,
    {
        let target = TargetType::of::<T>();
        let failed = |message: String| BridgeError::decode(media_type.as_ref(), target.name(), message);

        match self {
            Self::Bytes(bytes) => {
                let converted = if target.is::<Bytes>() {
                    cast(bytes)
                } else if target.is::<Vec<u8>>() {
                    cast(bytes.to_vec())
                } else {
                    None
                };
                converted.ok_or_else(|| failed("raw bytes cannot be converted to this type".into()))
            }
            Self::Text(text) if target.is::<String>() => {
                cast(text).ok_or_else(|| failed("text cannot be converted".into()))
            }
            Self::Text(text) => serde_json::from_value(serde_json::Value::String(text))
                .map_err(|e| failed(e.to_string())),
            Self::Form(form) if target.is::<MultiValueMap>() => {
                cast(form).ok_or_else(|| failed("form data cannot be converted".into()))
            }
            Self::Form(form) => serde_json::to_value(form)
                .and_then(serde_json::from_value)
                .map_err(|e| failed(e.to_string())),
            Self::Json(value) => serde_json::from_value(value).map_err(|e| failed(e.to_string())),
        }
    }
}

fn cast<T: 'static, U: 'static>(value: U) -> Option<T> {
    let boxed: Box<dyn Any> = Box::new(value);
    boxed.downcast::<T>().ok().map(|value| *value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_target_type_identity() {
        let target = TargetType::of::<String>();
        assert!(target.is::<String>());
        assert!(!target.is::<Bytes>());
        assert_eq!(target, TargetType::of::<String>());
        assert!(target.to_string().ends_with("String"));
    }

    #[test]
    fn test_bytes_into_vec() {
        let decoded = Decoded::Bytes(Bytes::from_static(b"abc"));
        let bytes: Vec<u8> = decoded.into_typed(&mime::APPLICATION_OCTET_STREAM).unwrap();
        assert_eq!(bytes, b"abc");
    }

    #[test]
    fn test_bytes_into_struct_fails() {
        let decoded = Decoded::Bytes(Bytes::from_static(b"abc"));
        let err = decoded
            .into_typed::<Point>(&mime::APPLICATION_OCTET_STREAM)
            .unwrap_err();
        assert!(matches!(err, BridgeError::Decode { .. }));
    }

    #[test]
    fn test_json_into_struct() {
        let decoded = Decoded::Json(serde_json::json!({"x": 1, "y": 2}));
        let point: Point = decoded.into_typed(&mime::APPLICATION_JSON).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn test_text_into_string() {
        let decoded = Decoded::Text("hi".into());
        let text: String = decoded.into_typed(&mime::TEXT_PLAIN).unwrap();
        assert_eq!(text, "hi");
    }
}
