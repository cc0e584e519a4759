// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Entity tree: dynamically-typed, self-describing values.
//!
//! Devices and query projections are represented as trees of [`Element`]
//! nodes (scalar / sequence / map). Field names are interned process-wide
//! by the [`FieldRegistrar`] so the same logical field carries the same
//! [`FieldId`] on every device instance.

pub mod mac;
pub mod path;
pub mod registrar;
pub mod summary;
pub mod value;

pub use mac::{MacAddr, MacParseError};
pub use path::{get_path, intern_path, lookup_path, FieldPath};
pub use registrar::{FieldId, FieldRegistrar};
pub use summary::{summarize, FieldSummary, RenameCache};
pub use value::{compare_elements, Element, ElementKind, ElementValue};
