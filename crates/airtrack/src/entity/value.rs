// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Dynamically-typed, self-describing entity tree.
//!
//! An [`Element`] is one node of the tree: a scalar, an ordered sequence, or
//! a map from [`FieldId`] to child node. A node's variant shape is fixed at
//! creation; mutation replaces values, never variants.

use super::registrar::FieldId;
use crate::entity::MacAddr;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Variant tag of an [`ElementValue`], used to enforce shape stability.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ElementKind {
    UInt64,
    Int64,
    Float,
    Bool,
    String,
    Bytes,
    Mac,
    Vector,
    Map,
}

/// Payload of one entity tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    UInt64(u64),
    Int64(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Mac(MacAddr),
    Vector(Vec<Element>),
    Map(HashMap<FieldId, Element>),
}

impl ElementValue {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::UInt64(_) => ElementKind::UInt64,
            Self::Int64(_) => ElementKind::Int64,
            Self::Float(_) => ElementKind::Float,
            Self::Bool(_) => ElementKind::Bool,
            Self::String(_) => ElementKind::String,
            Self::Bytes(_) => ElementKind::Bytes,
            Self::Mac(_) => ElementKind::Mac,
            Self::Vector(_) => ElementKind::Vector,
            Self::Map(_) => ElementKind::Map,
        }
    }
}

/// One node of an entity tree.
///
/// Nodes optionally carry the [`FieldId`] they were registered under and a
/// local (serialization) name overriding the registrar's name.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    field_id: Option<FieldId>,
    local_name: Option<String>,
    value: ElementValue,
}

impl Element {
    pub fn new(value: ElementValue) -> Self {
        Self {
            field_id: None,
            local_name: None,
            value,
        }
    }

    /// Empty map node.
    pub fn map() -> Self {
        Self::new(ElementValue::Map(HashMap::new()))
    }

    /// Empty sequence node.
    pub fn vector() -> Self {
        Self::new(ElementValue::Vector(Vec::new()))
    }

    pub fn uint(v: u64) -> Self {
        Self::new(ElementValue::UInt64(v))
    }

    pub fn int(v: i64) -> Self {
        Self::new(ElementValue::Int64(v))
    }

    pub fn float(v: f64) -> Self {
        Self::new(ElementValue::Float(v))
    }

    pub fn boolean(v: bool) -> Self {
        Self::new(ElementValue::Bool(v))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self::new(ElementValue::String(v.into()))
    }

    pub fn bytes(v: Vec<u8>) -> Self {
        Self::new(ElementValue::Bytes(v))
    }

    pub fn mac(v: MacAddr) -> Self {
        Self::new(ElementValue::Mac(v))
    }

    pub fn with_id(mut self, id: FieldId) -> Self {
        self.field_id = Some(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = Some(name.into());
        self
    }

    pub fn field_id(&self) -> Option<FieldId> {
        self.field_id
    }

    pub fn set_field_id(&mut self, id: FieldId) {
        self.field_id = Some(id);
    }

    pub fn local_name(&self) -> Option<&str> {
        self.local_name.as_deref()
    }

    pub fn set_local_name(&mut self, name: impl Into<String>) {
        self.local_name = Some(name.into());
    }

    pub fn value(&self) -> &ElementValue {
        &self.value
    }

    pub fn kind(&self) -> ElementKind {
        self.value.kind()
    }

    /// Replace this node's value, preserving the variant shape.
    ///
    /// Returns `false` (and leaves the node untouched) when the replacement
    /// would change the variant tag.
    pub fn set(&mut self, value: ElementValue) -> bool {
        if self.value.kind() != value.kind() {
            log::debug!(
                "[entity] rejected shape change {:?} -> {:?}",
                self.value.kind(),
                value.kind()
            );
            return false;
        }
        self.value = value;
        true
    }

    /// Map child registered under `id`.
    pub fn get(&self, id: FieldId) -> Option<&Element> {
        match &self.value {
            ElementValue::Map(fields) => fields.get(&id),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut Element> {
        match &mut self.value {
            ElementValue::Map(fields) => fields.get_mut(&id),
            _ => None,
        }
    }

    /// Insert a child into a map node under `id`, stamping the child's
    /// field id. Returns `false` on non-map nodes.
    pub fn insert(&mut self, id: FieldId, mut child: Element) -> bool {
        match &mut self.value {
            ElementValue::Map(fields) => {
                child.field_id = Some(id);
                fields.insert(id, child);
                true
            }
            _ => false,
        }
    }

    /// Append a child to a sequence node. Returns `false` on non-sequence
    /// nodes.
    pub fn push(&mut self, child: Element) -> bool {
        match &mut self.value {
            ElementValue::Vector(items) => {
                items.push(child);
                true
            }
            _ => false,
        }
    }

    pub fn as_vector(&self) -> Option<&[Element]> {
        match &self.value {
            ElementValue::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<FieldId, Element>> {
        match &self.value {
            ElementValue::Map(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match &self.value {
            ElementValue::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match &self.value {
            ElementValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ElementValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mac(&self) -> Option<MacAddr> {
        match &self.value {
            ElementValue::Mac(v) => Some(*v),
            _ => None,
        }
    }

    /// Stringified form used by the substring and regex filters.
    ///
    /// Byte buffers and composites have no searchable text form.
    pub fn as_search_string(&self) -> Option<String> {
        match &self.value {
            ElementValue::String(v) => Some(v.clone()),
            ElementValue::Mac(v) => Some(v.to_string()),
            ElementValue::UInt64(v) => Some(v.to_string()),
            ElementValue::Int64(v) => Some(v.to_string()),
            ElementValue::Float(v) => Some(v.to_string()),
            ElementValue::Bool(v) => Some(v.to_string()),
            ElementValue::Bytes(_) | ElementValue::Vector(_) | ElementValue::Map(_) => None,
        }
    }

    fn as_numeric(&self) -> Option<f64> {
        match &self.value {
            ElementValue::UInt64(v) => Some(*v as f64),
            ElementValue::Int64(v) => Some(*v as f64),
            ElementValue::Float(v) => Some(*v),
            ElementValue::Bool(v) => Some(u8::from(*v).into()),
            _ => None,
        }
    }
}

/// Natural ordering between two optionally-present nodes, used by the sort
/// stage. Absent sorts before present; numeric kinds compare cross-kind;
/// incomparable kinds compare equal so a stable sort leaves them in place.
pub fn compare_elements(a: Option<&Element>, b: Option<&Element>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

fn compare_present(a: &Element, b: &Element) -> Ordering {
    if let (Some(na), Some(nb)) = (a.as_numeric(), b.as_numeric()) {
        return na.partial_cmp(&nb).unwrap_or(Ordering::Equal);
    }

    match (a.value(), b.value()) {
        (ElementValue::String(sa), ElementValue::String(sb)) => sa.cmp(sb),
        (ElementValue::Mac(ma), ElementValue::Mac(mb)) => ma.cmp(mb),
        (ElementValue::Bytes(ba), ElementValue::Bytes(bb)) => ba.cmp(bb),
        _ => Ordering::Equal,
    }
}
