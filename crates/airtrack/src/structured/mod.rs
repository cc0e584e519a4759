// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Structured request bodies.
//!
//! Requests arrive in one of two encodings: JSON text or base64-wrapped
//! MessagePack. Both decode into one [`Structured`] abstraction exposing
//! key presence tests and typed extraction with defaults. Decode failures
//! are malformed-request conditions, raised before any registry lock is
//! taken.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use std::fmt;

/// Failure while decoding or interpreting a structured body.
#[derive(Debug)]
pub enum StructuredError {
    Json(serde_json::Error),
    Msgpack(rmp_serde::decode::Error),
    Base64(base64::DecodeError),
    /// The body decoded but the root is not a key/value object.
    NotAnObject,
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "unparseable json body: {}", e),
            Self::Msgpack(e) => write!(f, "unparseable msgpack body: {}", e),
            Self::Base64(e) => write!(f, "invalid base64 wrapping: {}", e),
            Self::NotAnObject => write!(f, "body must be a structured object"),
        }
    }
}

impl std::error::Error for StructuredError {}

impl From<serde_json::Error> for StructuredError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<rmp_serde::decode::Error> for StructuredError {
    fn from(value: rmp_serde::decode::Error) -> Self {
        Self::Msgpack(value)
    }
}

impl From<base64::DecodeError> for StructuredError {
    fn from(value: base64::DecodeError) -> Self {
        Self::Base64(value)
    }
}

/// Decoded structured data: one node of a request body.
#[derive(Debug, Clone, PartialEq)]
pub struct Structured {
    value: Value,
}

impl Structured {
    /// Decode a JSON text body. The root must be an object.
    pub fn from_json(text: &str) -> Result<Self, StructuredError> {
        Self::from_root(serde_json::from_str(text)?)
    }

    /// Decode a raw MessagePack body. The root must be a map.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, StructuredError> {
        Self::from_root(rmp_serde::from_slice(bytes)?)
    }

    /// Decode a base64-wrapped MessagePack body (the form it travels in
    /// request variables).
    pub fn from_base64_msgpack(text: &str) -> Result<Self, StructuredError> {
        let bytes = BASE64.decode(text.trim())?;
        Self::from_msgpack(&bytes)
    }

    fn from_root(value: Value) -> Result<Self, StructuredError> {
        if value.is_object() {
            Ok(Self { value })
        } else {
            Err(StructuredError::NotAnObject)
        }
    }

    fn wrap(value: &Value) -> Self {
        Self {
            value: value.clone(),
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.value.get(key).is_some()
    }

    /// Sub-node under `key`, if present.
    pub fn get(&self, key: &str) -> Option<Structured> {
        self.value.get(key).map(Self::wrap)
    }

    pub fn is_string(&self) -> bool {
        self.value.is_string()
    }

    pub fn is_array(&self) -> bool {
        self.value.is_array()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Truthiness of this node: a real bool, or the string `"true"` (the
    /// form grid clients send flag values in).
    pub fn as_bool_lenient(&self) -> bool {
        match &self.value {
            Value::Bool(b) => *b,
            Value::String(s) => s == "true",
            _ => false,
        }
    }

    /// String under `key`, or `default` when absent or non-string.
    pub fn key_as_string(&self, key: &str, default: &str) -> String {
        self.value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn key_as_bool(&self, key: &str, default: bool) -> bool {
        self.value.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn key_as_i64(&self, key: &str, default: i64) -> i64 {
        self.value.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    /// Elements of an array node. `None` when this node is not an array.
    pub fn array(&self) -> Option<Vec<Structured>> {
        self.value
            .as_array()
            .map(|items| items.iter().map(Self::wrap).collect())
    }

    /// Members of this node when it is an array of strings. Any non-string
    /// member fails the whole extraction.
    pub fn as_string_vec(&self) -> Option<Vec<String>> {
        let items = self.value.as_array()?;
        items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_extraction() {
        let body = Structured::from_json(
            r#"{"fields":["a","b"],"wrapper":"devices","datatable":true,"start":10}"#,
        )
        .unwrap();

        assert!(body.has_key("fields"));
        assert!(!body.has_key("regex"));
        assert_eq!(body.key_as_string("wrapper", ""), "devices");
        assert_eq!(body.key_as_string("missing", "dflt"), "dflt");
        assert!(body.key_as_bool("datatable", false));
        assert_eq!(body.key_as_i64("start", 0), 10);
        assert_eq!(
            body.get("fields").unwrap().as_string_vec().unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_nested_arrays() {
        let body =
            Structured::from_json(r#"{"fields":["plain",["renamed.field","alias"]]}"#).unwrap();
        let fields = body.get("fields").unwrap().array().unwrap();

        assert!(fields[0].is_string());
        assert_eq!(fields[0].as_str(), Some("plain"));
        assert!(fields[1].is_array());
        assert_eq!(
            fields[1].as_string_vec().unwrap(),
            vec!["renamed.field", "alias"]
        );
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let json: Value = serde_json::json!({"wrapper":"w","start":3});
        let packed = rmp_serde::to_vec_named(&json).unwrap();
        let body = Structured::from_msgpack(&packed).unwrap();

        assert_eq!(body.key_as_string("wrapper", ""), "w");
        assert_eq!(body.key_as_i64("start", 0), 3);
    }

    #[test]
    fn test_base64_msgpack() {
        let json: Value = serde_json::json!({"datatable":true});
        let packed = rmp_serde::to_vec_named(&json).unwrap();
        let wrapped = BASE64.encode(&packed);

        let body = Structured::from_base64_msgpack(&wrapped).unwrap();
        assert!(body.key_as_bool("datatable", false));
    }

    #[test]
    fn test_malformed_bodies_rejected() {
        assert!(matches!(
            Structured::from_json("not json"),
            Err(StructuredError::Json(_))
        ));
        assert!(matches!(
            Structured::from_json("[1,2,3]"),
            Err(StructuredError::NotAnObject)
        ));
        assert!(matches!(
            Structured::from_base64_msgpack("!!not-base64!!"),
            Err(StructuredError::Base64(_))
        ));
    }

    #[test]
    fn test_string_vec_rejects_mixed() {
        let body = Structured::from_json(r#"{"fields":["a",7]}"#).unwrap();
        assert!(body.get("fields").unwrap().as_string_vec().is_none());
    }
}
