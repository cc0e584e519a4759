// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Projection of entity trees into request-shaped summaries.
//!
//! A request supplies a list of [`FieldSummary`] entries (field path plus
//! optional output rename). [`summarize`] builds a fresh, standalone map
//! containing only those fields, in request order, omitting paths that do
//! not resolve on a given device. Renames are recorded once per resolved
//! path in a [`RenameCache`] shared across all devices of one request.

use super::path::{get_path, intern_path, FieldPath};
use super::registrar::{FieldId, FieldRegistrar};
use super::value::Element;
use std::collections::HashMap;

/// One projected output field: where it comes from and what to call it.
#[derive(Debug, Clone)]
pub struct FieldSummary {
    path: FieldPath,
    rename: Option<String>,
}

impl FieldSummary {
    /// Parse a `/`-separated field path, no rename.
    pub fn parse(spec: &str, registrar: &FieldRegistrar) -> Self {
        Self {
            path: intern_path(spec, registrar),
            rename: None,
        }
    }

    /// Parse a field path with an output rename.
    pub fn parse_renamed(spec: &str, rename: impl Into<String>, registrar: &FieldRegistrar) -> Self {
        Self {
            path: intern_path(spec, registrar),
            rename: Some(rename.into()),
        }
    }

    pub fn path(&self) -> &[FieldId] {
        &self.path
    }

    pub fn rename(&self) -> Option<&str> {
        self.rename.as_deref()
    }
}

/// Rename cache built during summarization.
///
/// Keyed by resolved field-id path so repeated projections across many
/// devices reuse the same entry; a leaf-id view serves the serializer,
/// which sees nodes rather than paths.
#[derive(Debug, Default)]
pub struct RenameCache {
    by_path: HashMap<FieldPath, String>,
    by_leaf: HashMap<FieldId, String>,
}

impl RenameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rename for `path`, if not already cached.
    pub fn record(&mut self, path: &[FieldId], name: &str) {
        if self.by_path.contains_key(path) {
            return;
        }
        self.by_path.insert(path.to_vec(), name.to_string());
        if let Some(leaf) = path.last() {
            self.by_leaf.insert(*leaf, name.to_string());
        }
    }

    pub fn name_for_path(&self, path: &[FieldId]) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    /// Output name for a node carrying `leaf`, if any rename targets it.
    pub fn name_for_leaf(&self, leaf: FieldId) -> Option<&str> {
        self.by_leaf.get(&leaf).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

/// Project `root` through `summaries` into a fresh map element.
///
/// The output shares no state with `root`; absent paths are omitted. An
/// empty summary list projects nothing.
pub fn summarize(root: &Element, summaries: &[FieldSummary], cache: &mut RenameCache) -> Element {
    let mut out = Element::map();

    for summary in summaries {
        let Some(leaf) = summary.path().last().copied() else {
            continue;
        };
        let Some(node) = get_path(root, summary.path()) else {
            continue;
        };

        if let Some(name) = summary.rename() {
            cache.record(summary.path(), name);
        }

        out.insert(leaf, node.clone());
    }

    out
}
