// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Entity tree to JSON value conversion.

use crate::entity::{Element, ElementValue, FieldId, FieldRegistrar, RenameCache};
use crate::ser::SerializeError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Number, Value};
use std::io::Write;

/// Render an entity tree as a `serde_json::Value`.
///
/// Map entries are emitted in field-id order so repeated serializations of
/// the same tree are byte-identical. Output names resolve rename cache
/// first, then the node's local name, then the registrar.
pub fn to_json_value(
    element: &Element,
    registrar: &FieldRegistrar,
    rename: Option<&RenameCache>,
) -> Value {
    match element.value() {
        ElementValue::UInt64(v) => Value::Number((*v).into()),
        ElementValue::Int64(v) => Value::Number((*v).into()),
        ElementValue::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
        ElementValue::Bool(v) => Value::Bool(*v),
        ElementValue::String(v) => Value::String(v.clone()),
        ElementValue::Bytes(v) => Value::String(BASE64.encode(v)),
        ElementValue::Mac(v) => Value::String(v.to_string()),
        ElementValue::Vector(items) => Value::Array(
            items
                .iter()
                .map(|item| to_json_value(item, registrar, rename))
                .collect(),
        ),
        ElementValue::Map(fields) => {
            let mut ids: Vec<FieldId> = fields.keys().copied().collect();
            ids.sort_unstable();

            let mut out = Map::new();
            for id in ids {
                let child = &fields[&id];
                out.insert(
                    output_name(id, child, registrar, rename),
                    to_json_value(child, registrar, rename),
                );
            }
            Value::Object(out)
        }
    }
}

fn output_name(
    id: FieldId,
    child: &Element,
    registrar: &FieldRegistrar,
    rename: Option<&RenameCache>,
) -> String {
    if let Some(name) = rename.and_then(|r| r.name_for_leaf(id)) {
        return name.to_string();
    }
    if let Some(name) = child.local_name() {
        return name.to_string();
    }
    registrar
        .name_of(id)
        .unwrap_or_else(|| format!("field.{}", id))
}

/// Write newline-delimited JSON: one compact document per top-level
/// sequence item, or a single line for non-sequence roots.
pub(crate) fn write_ekjson(
    sink: &mut dyn Write,
    element: &Element,
    registrar: &FieldRegistrar,
    rename: Option<&RenameCache>,
) -> Result<(), SerializeError> {
    match element.value() {
        ElementValue::Vector(items) => {
            for item in items {
                let value = to_json_value(item, registrar, rename);
                serde_json::to_writer(&mut *sink, &value)?;
                sink.write_all(b"\n")?;
            }
            Ok(())
        }
        _ => {
            let value = to_json_value(element, registrar, rename);
            serde_json::to_writer(&mut *sink, &value)?;
            sink.write_all(b"\n")?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_entries_in_field_id_order() {
        let registrar = FieldRegistrar::new();
        let b = registrar.intern("bbb");
        let a = registrar.intern("aaa");

        let mut root = Element::map();
        root.insert(a, Element::uint(1));
        root.insert(b, Element::uint(2));

        // "bbb" interned first -> lower id -> serialized first.
        let text = serde_json::to_string(&to_json_value(&root, &registrar, None)).unwrap();
        assert_eq!(text, r#"{"bbb":2,"aaa":1}"#);
    }

    #[test]
    fn test_local_name_beats_registrar() {
        let registrar = FieldRegistrar::new();
        let id = registrar.intern("registered.name");

        let mut root = Element::map();
        root.insert(id, Element::uint(1).with_name("local"));

        let text = serde_json::to_string(&to_json_value(&root, &registrar, None)).unwrap();
        assert_eq!(text, r#"{"local":1}"#);
    }

    #[test]
    fn test_bytes_render_as_base64() {
        let registrar = FieldRegistrar::new();
        let id = registrar.intern("blob");

        let mut root = Element::map();
        root.insert(id, Element::bytes(vec![1, 2, 3]));

        let value = to_json_value(&root, &registrar, None);
        assert_eq!(value["blob"], serde_json::json!("AQID"));
    }

    #[test]
    fn test_nan_float_renders_null() {
        let value = to_json_value(&Element::float(f64::NAN), &FieldRegistrar::new(), None);
        assert!(value.is_null());
    }
}
