// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Two-phase request handling: validate, then execute.
//!
//! `validate` is pure pre-flight: path shape, format support, resolution
//! of referenced keys/addresses, session for mutations. It needs no
//! serializer and commits no response resources, so a transport
//! collaborator can probe legality before allocating anything.
//! `execute` assumes validation passed and is deliberately tolerant of
//! data absence: heterogeneous devices are normal, structural errors are
//! request bugs.

use crate::api::error::ApiError;
use crate::api::resource::{parse_resource, Method, Operation};
use crate::entity::{lookup_path, summarize, Element, RenameCache};
use crate::query::{device_window, run_last_time, run_summary, SummaryRequest};
use crate::registry::{scan_registry, Device, DeviceContent, DeviceRegistry, FnWorker, ScanSignal};
use crate::ser::{serialize, OutputFormat};
use crate::structured::Structured;
use std::io::Write;
use std::sync::Arc;

/// External session/auth collaborator.
pub trait SessionValidator {
    fn has_valid_session(&self) -> bool;
}

/// Permit everything; suits capture-only deployments without auth.
pub struct OpenSessions;

impl SessionValidator for OpenSessions {
    fn has_valid_session(&self) -> bool {
        true
    }
}

/// Deny everything; mutating operations are rejected outright.
pub struct NoSessions;

impl SessionValidator for NoSessions {
    fn has_valid_session(&self) -> bool {
        false
    }
}

/// Phase one: confirm the request is legal without executing it.
///
/// Side-effect free. Returns the typed operation `execute` will run.
pub fn validate(
    method: Method,
    path: &str,
    registry: &DeviceRegistry,
    sessions: &dyn SessionValidator,
) -> Result<Operation, ApiError> {
    let op = parse_resource(method, path)?;

    if op.is_mutation() && !sessions.has_valid_session() {
        return Err(ApiError::SessionRequired);
    }

    match &op {
        Operation::DeviceByKey {
            key, field_path, ..
        } => {
            let device = registry.lookup_by_key(*key).ok_or(ApiError::NotFound)?;
            if !field_path.is_empty() {
                let path = lookup_path(field_path, registry.registrar())
                    .ok_or(ApiError::NotFound)?;
                let content = device.lock();
                if content.get(&path).is_none() {
                    return Err(ApiError::NotFound);
                }
            }
        }
        Operation::SummaryByKey { key, .. } | Operation::SetName { key } => {
            registry.lookup_by_key(*key).ok_or(ApiError::NotFound)?;
        }
        Operation::DevicesByAddr { address, .. } | Operation::SummaryByAddr { address, .. } => {
            if registry.lookup_by_addr(*address).is_empty() {
                return Err(ApiError::NotFound);
            }
        }
        _ => {}
    }

    Ok(op)
}

/// Phase two: run a validated operation and write the response to `sink`.
pub fn execute(
    op: &Operation,
    body: Option<&Structured>,
    registry: &DeviceRegistry,
    sink: &mut dyn Write,
    now: u64,
) -> Result<(), ApiError> {
    let registrar = registry.registrar();

    match op {
        Operation::StreamAllDevices => {
            // Serialize per element instead of accumulating a list; the
            // sink sees one complete document per device.
            let mut result = Ok(());
            scan_registry(
                registry,
                &mut FnWorker(|_d: &Arc<Device>, content: &DeviceContent| {
                    match serialize(
                        OutputFormat::EkJson,
                        sink,
                        content.root(),
                        registrar,
                        None,
                    ) {
                        Ok(()) => ScanSignal::Continue,
                        Err(e) => {
                            result = Err(ApiError::Serialize(e));
                            ScanSignal::Stop
                        }
                    }
                }),
            );
            result
        }

        Operation::PhyList { wrapper, format } => {
            let element = phy_tree(registry, *wrapper);
            serialize(*format, sink, &element, registrar, None)?;
            Ok(())
        }

        Operation::DeviceByKey {
            key,
            field_path,
            format,
        } => {
            let device = registry.lookup_by_key(*key).ok_or(ApiError::NotFound)?;
            let content = device.lock();

            let node = if field_path.is_empty() {
                content.root().clone()
            } else {
                let path =
                    lookup_path(field_path, registrar).ok_or(ApiError::NotFound)?;
                content.get(&path).ok_or(ApiError::NotFound)?.clone()
            };
            drop(content);

            serialize(*format, sink, &node, registrar, None)?;
            Ok(())
        }

        Operation::DevicesByAddr { address, format } => {
            let mut out = Element::vector();
            for device in registry.lookup_by_addr(*address) {
                out.push(device.lock().root().clone());
            }
            serialize(*format, sink, &out, registrar, None)?;
            Ok(())
        }

        Operation::DevicesLastTime { threshold, format } => {
            let window = device_window(registry, *threshold, now);
            serialize(*format, sink, &window, registrar, None)?;
            Ok(())
        }

        Operation::SummaryTable { format } => {
            let req = parse_body(body, registrar)?;
            let out = run_summary(registry, &req);
            serialize(*format, sink, &out.element, registrar, Some(&out.rename))?;
            Ok(())
        }

        Operation::SummaryLastTime { threshold, format } => {
            let req = parse_body(body, registrar)?;
            let out = run_last_time(registry, *threshold, &req, now);
            serialize(*format, sink, &out.element, registrar, Some(&out.rename))?;
            Ok(())
        }

        Operation::SummaryByKey { key, format } => {
            let req = parse_body(body, registrar)?;
            let device = registry.lookup_by_key(*key).ok_or(ApiError::NotFound)?;

            let mut rename = RenameCache::new();
            let content = device.lock();
            let projected = match req.fields() {
                Some(fields) => summarize(content.root(), fields, &mut rename),
                None => content.root().clone(),
            };
            drop(content);

            serialize(*format, sink, &projected, registrar, Some(&rename))?;
            Ok(())
        }

        Operation::SummaryByAddr { address, format } => {
            let req = parse_body(body, registrar)?;
            let mut rename = RenameCache::new();
            let mut out = Element::vector();

            for device in registry.lookup_by_addr(*address) {
                let content = device.lock();
                let projected = match req.fields() {
                    Some(fields) => summarize(content.root(), fields, &mut rename),
                    None => content.root().clone(),
                };
                out.push(projected);
            }

            serialize(*format, sink, &out, registrar, Some(&rename))?;
            Ok(())
        }

        Operation::SetName { key } => {
            let body = body.ok_or_else(|| ApiError::Malformed("missing request body".into()))?;
            let name = body.key_as_string("name", "");
            if name.is_empty() {
                return Err(ApiError::Malformed("missing device name".into()));
            }

            let device = registry.lookup_by_key(*key).ok_or(ApiError::NotFound)?;
            device.lock().set_name(&name);
            log::debug!("[api] renamed device {} to '{}'", key, name);

            sink.write_all(b"OK").map_err(crate::ser::SerializeError::from)?;
            Ok(())
        }
    }
}

/// Build the device-kind handler listing.
///
/// The aggregate pseudo-phy leads the list, then every registered handler.
fn phy_tree(registry: &DeviceRegistry, wrapper: Option<&'static str>) -> Element {
    let registrar = registry.registrar();
    let id_field = registrar.intern("airtrack.phy.id");
    let name_field = registrar.intern("airtrack.phy.name");

    let mut vec = Element::vector();
    let mut any = Element::map();
    any.insert(id_field, Element::uint(u64::from(crate::registry::PHY_ANY.0)));
    any.insert(name_field, Element::string(crate::registry::PHY_ANY_NAME));
    vec.push(any);

    for phy in registry.phy_list() {
        let mut entry = Element::map();
        entry.insert(id_field, Element::uint(u64::from(phy.id.0)));
        entry.insert(name_field, Element::string(phy.name));
        vec.push(entry);
    }

    match wrapper {
        Some(name) => {
            let mut outer = Element::map();
            let wrap_id = registrar.intern(name);
            outer.insert(wrap_id, vec.with_name(name));
            outer
        }
        None => vec,
    }
}

fn parse_body(
    body: Option<&Structured>,
    registrar: &crate::entity::FieldRegistrar,
) -> Result<SummaryRequest, ApiError> {
    match body {
        Some(body) => Ok(SummaryRequest::parse(body, registrar)?),
        None => Err(crate::query::RequestError::MissingBody.into()),
    }
}
