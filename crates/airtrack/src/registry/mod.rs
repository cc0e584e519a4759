// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Device registry: the canonical, concurrently-mutated device collection.
//!
//! The registry owns every [`Device`] plus a primary key index and a
//! non-unique hardware-address index. All three structures are updated
//! atomically under one registry lock; that lock is held only for
//! index-sized critical sections and is never held while a device's own
//! content lock is taken.

pub mod device;
pub mod worker;

pub use device::{BaseFields, Device, DeviceContent, DeviceKey, KeyParseError};
pub use worker::{scan_devices, scan_registry, DeviceWorker, FnWorker, ScanSignal};

use crate::entity::{FieldRegistrar, MacAddr};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a registered device-kind (phy) handler.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PhyId(pub u32);

/// One registered device-kind handler.
#[derive(Debug, Clone)]
pub struct PhyHandler {
    pub id: PhyId,
    pub name: String,
}

/// Aggregate pseudo-phy spanning devices of every kind. Never registered;
/// real handler ids start at 1.
pub const PHY_ANY: PhyId = PhyId(0);

/// Name of the aggregate pseudo-phy.
pub const PHY_ANY_NAME: &str = "ANY";

/// Registry failure modes.
///
/// `DuplicateKey` cannot occur with registry-derived keys; seeing it means
/// a caller fabricated a key, which is a programmer error.
#[derive(Debug)]
pub enum RegistryError {
    DuplicateKey(DeviceKey),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey(key) => write!(f, "duplicate device key {}", key),
        }
    }
}

impl std::error::Error for RegistryError {}

struct RegistryInner {
    /// Append-ordered canonical sequence; defines default enumeration order.
    devices: Vec<Arc<Device>>,
    by_key: HashMap<DeviceKey, Arc<Device>>,
    by_addr: HashMap<MacAddr, Vec<Arc<Device>>>,
}

/// Owning collection of tracked devices plus key and address indices.
pub struct DeviceRegistry {
    registrar: Arc<FieldRegistrar>,
    base: BaseFields,
    next_device_id: AtomicU64,
    inner: RwLock<RegistryInner>,
    phys: RwLock<Vec<PhyHandler>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let registrar = Arc::new(FieldRegistrar::new());
        let base = BaseFields::register(&registrar);
        Self {
            registrar,
            base,
            next_device_id: AtomicU64::new(1),
            inner: RwLock::new(RegistryInner {
                devices: Vec::new(),
                by_key: HashMap::new(),
                by_addr: HashMap::new(),
            }),
            phys: RwLock::new(Vec::new()),
        }
    }

    pub fn registrar(&self) -> &Arc<FieldRegistrar> {
        &self.registrar
    }

    pub fn base_fields(&self) -> BaseFields {
        self.base
    }

    /// Register a device-kind handler, returning its id. Registering the
    /// same name twice returns the existing id.
    pub fn register_phy(&self, name: &str) -> PhyId {
        let mut phys = self.phys.write();
        if let Some(existing) = phys.iter().find(|p| p.name == name) {
            return existing.id;
        }
        let id = PhyId(u32::try_from(phys.len()).unwrap_or(u32::MAX) + 1);
        phys.push(PhyHandler {
            id,
            name: name.to_string(),
        });
        log::debug!("[registry] registered phy handler '{}' as {:?}", name, id);
        id
    }

    /// Snapshot of the registered device-kind handlers.
    pub fn phy_list(&self) -> Vec<PhyHandler> {
        self.phys.read().clone()
    }

    pub fn phy_name(&self, id: PhyId) -> Option<String> {
        if id == PHY_ANY {
            return Some(PHY_ANY_NAME.to_string());
        }
        self.phys
            .read()
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
    }

    /// Create a device under `phy` on first observation and insert it.
    ///
    /// Keys are derived here (phy id plus a never-reused serial), so
    /// insertion cannot collide.
    pub fn new_device(&self, phy: PhyId, address: MacAddr, now: u64) -> Arc<Device> {
        let serial = self.next_device_id.fetch_add(1, Ordering::Relaxed);
        let key = DeviceKey::new(phy.0, serial);
        let phy_name = self.phy_name(phy).unwrap_or_default();
        let device = Arc::new(Device::new(key, address, &phy_name, now, self.base));

        // Serial allocation makes DuplicateKey unreachable on this path.
        if let Err(e) = self.insert(device.clone()) {
            log::error!("[registry] {}", e);
        }
        device
    }

    /// Insert a pre-built device, indexing it by key and address.
    pub fn insert(&self, device: Arc<Device>) -> Result<(), RegistryError> {
        // Read the address before touching the registry lock; the registry
        // lock is never held across a device lock.
        let address = device.lock().address();
        let key = device.key();

        let mut inner = self.inner.write();
        if inner.by_key.contains_key(&key) {
            return Err(RegistryError::DuplicateKey(key));
        }

        inner.devices.push(device.clone());
        inner.by_key.insert(key, device.clone());
        inner.by_addr.entry(address).or_default().push(device);
        log::debug!("[registry] inserted device {} addr {}", key, address);
        Ok(())
    }

    /// O(1) key lookup. The registry lock is held only long enough to copy
    /// the shared reference out.
    pub fn lookup_by_key(&self, key: DeviceKey) -> Option<Arc<Device>> {
        self.inner.read().by_key.get(&key).cloned()
    }

    /// Address lookup; several devices may share one address.
    pub fn lookup_by_addr(&self, address: MacAddr) -> Vec<Arc<Device>> {
        self.inner
            .read()
            .by_addr
            .get(&address)
            .cloned()
            .unwrap_or_default()
    }

    /// Stable snapshot of the enumeration order. Iterating the snapshot
    /// does not hold the registry lock.
    pub fn snapshot(&self) -> Vec<Arc<Device>> {
        self.inner.read().devices.clone()
    }

    pub fn device_count(&self) -> usize {
        self.inner.read().devices.len()
    }

    /// Index `device` under an additional observed address.
    pub fn record_address(&self, address: MacAddr, device: &Arc<Device>) {
        let mut inner = self.inner.write();
        let bucket = inner.by_addr.entry(address).or_default();
        if !bucket.iter().any(|d| Arc::ptr_eq(d, device)) {
            bucket.push(device.clone());
        }
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
