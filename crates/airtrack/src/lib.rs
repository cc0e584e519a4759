// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! # Airtrack - Wireless device registry and query engine
//!
//! Core of a wireless monitoring stack: a concurrently-mutated registry of
//! observed devices, each modeled as a dynamically-typed entity tree, plus
//! a query pipeline that filters, projects, sorts, and paginates device
//! views for serialization.
//!
//! ## Quick Start
//!
//! ```rust
//! use airtrack::registry::DeviceRegistry;
//! use airtrack::api::{execute, validate, Method, OpenSessions};
//!
//! let registry = DeviceRegistry::new();
//! let phy = registry.register_phy("IEEE802.11");
//! registry.new_device(phy, "AA:00:00:00:00:01".parse().unwrap(), 1700000000);
//!
//! let op = validate(
//!     Method::Get,
//!     "/devices/all_devices.ekjson",
//!     &registry,
//!     &OpenSessions,
//! ).unwrap();
//!
//! let mut out = Vec::new();
//! execute(&op, None, &registry, &mut out, 1700000000).unwrap();
//! assert_eq!(out.iter().filter(|b| **b == b'\n').count(), 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                       Request Surface                        |
//! |        validate (pure pre-flight) -> execute (typed op)      |
//! +--------------------------------------------------------------+
//! |                       Query Pipeline                         |
//! |   time window | regex / substring | sort | page | summarize  |
//! +--------------------------------------------------------------+
//! |                      Device Registry                         |
//! |    key index | address index | snapshot scans | per-device   |
//! |                       content locks                          |
//! +--------------------------------------------------------------+
//! |                        Entity Tree                           |
//! |      interned field ids | map / sequence / scalar nodes      |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`registry::DeviceRegistry`] | Owning device collection with key and address indices |
//! | [`entity::Element`] | One node of a device's self-describing tree |
//! | [`entity::FieldRegistrar`] | Process-wide field name interner |
//! | [`query::SummaryRequest`] | Parsed projection / filter / table request body |
//! | [`api::Operation`] | Typed, validated request operation |
//!
//! ## Concurrency model
//!
//! Two lock levels, never interleaved: the registry lock guards the device
//! collection and its indices for index-sized critical sections only, and
//! each device carries its own content mutex. Scans snapshot the device
//! sequence under the registry lock, release it, then lock devices one at
//! a time, so long queries never stall ingest.

pub mod api;
pub mod entity;
pub mod query;
pub mod registry;
pub mod ser;
pub mod structured;
pub mod time;

pub use api::{execute, validate, ApiError, Method, Operation, SessionValidator};
pub use entity::{Element, ElementValue, FieldId, FieldRegistrar, MacAddr};
pub use query::SummaryRequest;
pub use registry::{Device, DeviceKey, DeviceRegistry, PhyId};
pub use ser::OutputFormat;
pub use structured::Structured;
