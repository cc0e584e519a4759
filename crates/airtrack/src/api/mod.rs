// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Request surface: resource grammar, validation, execution.

pub mod dispatch;
pub mod error;
pub mod resource;

pub use dispatch::{execute, validate, NoSessions, OpenSessions, SessionValidator};
pub use error::ApiError;
pub use resource::{parse_resource, tokenize, Method, Operation};
