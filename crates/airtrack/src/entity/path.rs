// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Field path resolution over entity trees.
//!
//! A path is an ordered sequence of field ids descended through map nodes.
//! Resolution is pure: an unreachable path is `None`, never an error.

use super::registrar::{FieldId, FieldRegistrar};
use super::value::Element;

/// Ordered field-id sequence locating a node inside an entity tree.
pub type FieldPath = Vec<FieldId>;

/// Resolve `path` against `root` by repeated map descent.
pub fn get_path<'a>(root: &'a Element, path: &[FieldId]) -> Option<&'a Element> {
    let mut node = root;
    for id in path {
        node = node.get(*id)?;
    }
    Some(node)
}

/// Resolve a `/`-separated name path to field ids, interning each segment.
///
/// Interning means a request may name fields no device carries yet; those
/// paths simply resolve to absent on every device.
pub fn intern_path(spec: &str, registrar: &FieldRegistrar) -> FieldPath {
    spec.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| registrar.intern(s))
        .collect()
}

/// Resolve a name path without interning unknown segments.
///
/// Used by validation: a path containing a never-registered name cannot
/// resolve on any device.
pub fn lookup_path(segments: &[String], registrar: &FieldRegistrar) -> Option<FieldPath> {
    segments
        .iter()
        .map(|s| registrar.lookup(s))
        .collect::<Option<FieldPath>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ElementValue;

    fn sample_tree(registrar: &FieldRegistrar) -> Element {
        let sig = registrar.intern("base.signal");
        let dbm = registrar.intern("signal.last_signal_dbm");

        let mut inner = Element::map();
        inner.insert(dbm, Element::int(-61));

        let mut root = Element::map();
        root.insert(sig, inner);
        root
    }

    #[test]
    fn test_nested_resolution() {
        let registrar = FieldRegistrar::new();
        let root = sample_tree(&registrar);
        let path = intern_path("base.signal/signal.last_signal_dbm", &registrar);

        let node = get_path(&root, &path).unwrap();
        assert_eq!(node.as_i64(), Some(-61));
    }

    #[test]
    fn test_absent_path_is_none() {
        let registrar = FieldRegistrar::new();
        let root = sample_tree(&registrar);
        let path = intern_path("base.signal/no.such.field", &registrar);

        assert!(get_path(&root, &path).is_none());
    }

    #[test]
    fn test_descent_through_scalar_is_none() {
        let registrar = FieldRegistrar::new();
        let root = sample_tree(&registrar);
        let mut path = intern_path("base.signal/signal.last_signal_dbm", &registrar);
        path.push(registrar.intern("deeper"));

        assert!(get_path(&root, &path).is_none());
    }

    #[test]
    fn test_empty_path_is_root() {
        let registrar = FieldRegistrar::new();
        let root = sample_tree(&registrar);
        let node = get_path(&root, &[]).unwrap();
        assert!(matches!(node.value(), ElementValue::Map(_)));
    }

    #[test]
    fn test_lookup_path_rejects_unknown_names() {
        let registrar = FieldRegistrar::new();
        registrar.intern("known");

        assert!(lookup_path(&["known".to_string()], &registrar).is_some());
        assert!(lookup_path(&["unknown".to_string()], &registrar).is_none());
    }
}
