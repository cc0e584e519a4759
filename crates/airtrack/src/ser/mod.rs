// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Wire-format serialization of entity trees.
//!
//! The output format is derived from a resource's trailing suffix
//! (`.json`, `.ekjson`, `.msgpack`). All encoders render through one
//! JSON-value conversion; `ekjson` emits one compact JSON document per
//! top-level sequence item, which is what lets the full device list
//! stream item-by-item instead of materializing one payload.

mod json;

pub use json::to_json_value;

use crate::entity::{Element, FieldRegistrar, RenameCache};
use std::fmt;
use std::io::Write;

/// Supported wire formats.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    Json,
    EkJson,
    Msgpack,
}

impl OutputFormat {
    /// Derive the format from a resource name's trailing suffix.
    pub fn from_suffix(resource: &str) -> Option<Self> {
        match resource.rsplit_once('.').map(|(_, suffix)| suffix) {
            Some("json") => Some(Self::Json),
            Some("ekjson") => Some(Self::EkJson),
            Some("msgpack") => Some(Self::Msgpack),
            _ => None,
        }
    }
}

/// Resource name with any serialization suffix removed.
pub fn strip_suffix(resource: &str) -> &str {
    match resource.rsplit_once('.') {
        Some((stem, "json" | "ekjson" | "msgpack")) => stem,
        _ => resource,
    }
}

/// Whether a resource names a supported output format.
pub fn can_serialize(resource: &str) -> bool {
    OutputFormat::from_suffix(resource).is_some()
}

/// Serialization failure modes.
#[derive(Debug)]
pub enum SerializeError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Msgpack(rmp_serde::encode::Error),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "output sink error: {}", e),
            Self::Json(e) => write!(f, "json encoding error: {}", e),
            Self::Msgpack(e) => write!(f, "msgpack encoding error: {}", e),
        }
    }
}

impl std::error::Error for SerializeError {}

impl From<std::io::Error> for SerializeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SerializeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<rmp_serde::encode::Error> for SerializeError {
    fn from(value: rmp_serde::encode::Error) -> Self {
        Self::Msgpack(value)
    }
}

/// Encode `element` to `sink` in `format`.
///
/// `rename` carries the per-request output names produced during
/// summarization; `None` falls back to local names and registrar names.
pub fn serialize(
    format: OutputFormat,
    sink: &mut dyn Write,
    element: &Element,
    registrar: &FieldRegistrar,
    rename: Option<&RenameCache>,
) -> Result<(), SerializeError> {
    match format {
        OutputFormat::Json => {
            let value = to_json_value(element, registrar, rename);
            serde_json::to_writer(&mut *sink, &value)?;
            Ok(())
        }
        OutputFormat::EkJson => json::write_ekjson(sink, element, registrar, rename),
        OutputFormat::Msgpack => {
            let value = to_json_value(element, registrar, rename);
            rmp_serde::encode::write_named(&mut *sink, &value)?;
            Ok(())
        }
    }
}
