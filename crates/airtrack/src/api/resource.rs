// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Logical resource paths and the operation catalog.
//!
//! One shared shape parser serves both phases of request handling:
//! `validate` runs it to pre-flight legality, `execute` trusts its typed
//! output. GET and POST share the same path grammar, parameterized by
//! method rather than duplicated per verb.

use crate::api::error::ApiError;
use crate::entity::MacAddr;
use crate::registry::DeviceKey;
use crate::ser::{can_serialize, strip_suffix, OutputFormat};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
}

/// Typed request operations the core supports.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Stream every device, one document per line.
    StreamAllDevices,
    /// List registered device-kind handlers, optionally grid-wrapped.
    PhyList {
        wrapper: Option<&'static str>,
        format: OutputFormat,
    },
    /// One device's full or field-path-scoped tree.
    DeviceByKey {
        key: DeviceKey,
        field_path: Vec<String>,
        format: OutputFormat,
    },
    /// Every device sharing a hardware address.
    DevicesByAddr {
        address: MacAddr,
        format: OutputFormat,
    },
    /// Full devices inside a time window.
    DevicesLastTime {
        threshold: i64,
        format: OutputFormat,
    },
    /// Projected / filtered / sorted / paged device table.
    SummaryTable { format: OutputFormat },
    /// Time-windowed, optionally regex-filtered projection.
    SummaryLastTime {
        threshold: i64,
        format: OutputFormat,
    },
    /// Single-device projection.
    SummaryByKey {
        key: DeviceKey,
        format: OutputFormat,
    },
    /// Address-bucket projection.
    SummaryByAddr {
        address: MacAddr,
        format: OutputFormat,
    },
    /// Rename a device (mutating; session-gated).
    SetName { key: DeviceKey },
}

impl Operation {
    /// Whether this operation mutates registry state.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::SetName { .. })
    }
}

/// Split a logical path into non-empty segments.
pub fn tokenize(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn format_of(resource: &str) -> Result<OutputFormat, ApiError> {
    OutputFormat::from_suffix(resource).ok_or(ApiError::UnsupportedFormat)
}

fn parse_key(text: &str) -> Result<DeviceKey, ApiError> {
    text.parse()
        .map_err(|e: crate::registry::KeyParseError| ApiError::Malformed(e.to_string()))
}

fn parse_mac(text: &str) -> Result<MacAddr, ApiError> {
    text.parse()
        .map_err(|e: crate::entity::MacParseError| ApiError::Malformed(e.to_string()))
}

fn parse_threshold(text: &str) -> Result<i64, ApiError> {
    text.parse()
        .map_err(|_| ApiError::Malformed(format!("unparseable timestamp '{}'", text)))
}

/// Parse a logical resource path into a typed operation.
///
/// Pure shape checking only; resolution against the registry (does the
/// key exist, does the field path resolve) belongs to `validate`.
pub fn parse_resource(method: Method, path: &str) -> Result<Operation, ApiError> {
    // The item-streamed full list short-circuits suffix handling: it only
    // exists in the line-delimited encoding.
    if method == Method::Get && path == "/devices/all_devices.ekjson" {
        return Ok(Operation::StreamAllDevices);
    }

    if method == Method::Get && can_serialize(path) {
        match strip_suffix(path) {
            "/phy/all_phys" => {
                return Ok(Operation::PhyList {
                    wrapper: None,
                    format: format_of(path)?,
                });
            }
            "/phy/all_phys_dt" => {
                return Ok(Operation::PhyList {
                    wrapper: Some("aaData"),
                    format: format_of(path)?,
                });
            }
            _ => {}
        }
    }

    let tokens = tokenize(path);
    if tokens.len() < 3 || tokens[0] != "devices" {
        return Err(ApiError::Malformed(format!("unknown resource '{}'", path)));
    }
    // Everything except POST summary carries a fourth segment.
    if tokens.len() < 4 && !(method == Method::Post && tokens[1] == "summary") {
        return Err(ApiError::Malformed(format!("unknown resource '{}'", path)));
    }

    match (method, tokens[1]) {
        (Method::Get, "by-key") => {
            let key = parse_key(tokens[2])?;
            let format = format_of(tokens[3])?;
            if strip_suffix(tokens[3]) != "device" {
                return Err(ApiError::Malformed(format!(
                    "unknown by-key target '{}'",
                    tokens[3]
                )));
            }
            let field_path = tokens[4..].iter().map(|s| (*s).to_string()).collect();
            Ok(Operation::DeviceByKey {
                key,
                field_path,
                format,
            })
        }
        (Method::Get, "by-mac") => Ok(Operation::DevicesByAddr {
            address: parse_mac(tokens[2])?,
            format: expect_target(tokens[3], "devices")?,
        }),
        (Method::Get, "last-time") => Ok(Operation::DevicesLastTime {
            threshold: parse_threshold(tokens[2])?,
            format: expect_target(tokens[3], "devices")?,
        }),
        (Method::Post, "summary") => Ok(Operation::SummaryTable {
            format: format_of(tokens[2])?,
        }),
        (Method::Post, "last-time") => Ok(Operation::SummaryLastTime {
            threshold: parse_threshold(tokens[2])?,
            format: format_of(tokens[3])?,
        }),
        (Method::Post, "by-key") => {
            let key = parse_key(tokens[2])?;
            match strip_suffix(tokens[3]) {
                "device" => Ok(Operation::SummaryByKey {
                    key,
                    format: format_of(tokens[3])?,
                }),
                "set_name" => {
                    // Format checked for shape parity with other by-key
                    // targets even though the reply carries no tree.
                    format_of(tokens[3])?;
                    Ok(Operation::SetName { key })
                }
                other => Err(ApiError::Malformed(format!(
                    "unknown by-key target '{}'",
                    other
                ))),
            }
        }
        (Method::Post, "by-mac") => Ok(Operation::SummaryByAddr {
            address: parse_mac(tokens[2])?,
            format: expect_target(tokens[3], "devices")?,
        }),
        _ => Err(ApiError::Malformed(format!("unknown resource '{}'", path))),
    }
}

fn expect_target(resource: &str, expected: &str) -> Result<OutputFormat, ApiError> {
    let format = format_of(resource)?;
    if strip_suffix(resource) != expected {
        return Err(ApiError::Malformed(format!(
            "unknown target '{}'",
            resource
        )));
    }
    Ok(format)
}
