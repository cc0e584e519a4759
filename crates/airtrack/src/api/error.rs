// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Request-surface error taxonomy.
//!
//! Malformed requests and unsupported formats are structural: they are
//! rejected at validation, before any lock or response buffer. Not-found
//! is an expected runtime outcome, distinct from malformation. Data
//! absence during projection is not an error at all and never surfaces
//! here.

use crate::query::RequestError;
use crate::ser::SerializeError;
use crate::structured::StructuredError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad path shape, unparseable timestamp, unresolvable body.
    #[error("invalid request: {0}")]
    Malformed(String),

    /// The resource names a serialization format nobody registered.
    #[error("unsupported serialization format")]
    UnsupportedFormat,

    /// Unknown key, unknown address, or unresolvable field path.
    #[error("not found")]
    NotFound,

    /// Mutating operation without an authenticated session.
    #[error("login required")]
    SessionRequired,

    #[error("{0}")]
    Serialize(#[from] SerializeError),
}

impl From<StructuredError> for ApiError {
    fn from(value: StructuredError) -> Self {
        Self::Malformed(value.to_string())
    }
}

impl From<RequestError> for ApiError {
    fn from(value: RequestError) -> Self {
        Self::Malformed(value.to_string())
    }
}

impl ApiError {
    /// HTTP-shaped status code for the transport collaborator.
    pub fn status(&self) -> u16 {
        match self {
            Self::Malformed(_) | Self::UnsupportedFormat => 400,
            Self::SessionRequired => 401,
            Self::NotFound => 404,
            Self::Serialize(_) => 500,
        }
    }
}
