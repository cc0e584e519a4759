// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Tracked device entity.
//!
//! A device is an entity tree rooted at a map plus an immutable key and its
//! own content lock. All content reads and writes go through that lock;
//! the registry lock is never required to touch device fields.

use crate::entity::{get_path, Element, ElementValue, FieldId, FieldRegistrar, MacAddr};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::str::FromStr;

/// Unique, immutable device identity: owning phy plus per-phy serial.
///
/// # Display Format
/// `PPPPPPPP_DDDDDDDDDDDDDDDD` (hex phy id, underscore, hex device id).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DeviceKey {
    phy: u32,
    device: u64,
}

impl DeviceKey {
    pub fn new(phy: u32, device: u64) -> Self {
        Self { phy, device }
    }

    pub fn phy(&self) -> u32 {
        self.phy
    }

    pub fn device(&self) -> u64 {
        self.device
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}_{:016X}", self.phy, self.device)
    }
}

/// Parse failure for a device key literal.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyParseError {
    input: String,
}

impl fmt::Display for KeyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid device key '{}'", self.input)
    }
}

impl std::error::Error for KeyParseError {}

impl FromStr for DeviceKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || KeyParseError {
            input: s.to_string(),
        };

        let (phy, device) = s.split_once('_').ok_or_else(err)?;
        if phy.len() != 8 || device.len() != 16 {
            return Err(err());
        }

        Ok(Self {
            phy: u32::from_str_radix(phy, 16).map_err(|_| err())?,
            device: u64::from_str_radix(device, 16).map_err(|_| err())?,
        })
    }
}

/// Interned ids of the base fields every device carries.
#[derive(Debug, Copy, Clone)]
pub struct BaseFields {
    pub key: FieldId,
    pub macaddr: FieldId,
    pub name: FieldId,
    pub phyname: FieldId,
    pub first_time: FieldId,
    pub last_time: FieldId,
    pub packets: FieldId,
    pub channel: FieldId,
    pub frequency: FieldId,
}

impl BaseFields {
    /// Register the base schema with `registrar`. Idempotent.
    pub fn register(registrar: &FieldRegistrar) -> Self {
        Self {
            key: registrar.intern("airtrack.device.base.key"),
            macaddr: registrar.intern("airtrack.device.base.macaddr"),
            name: registrar.intern("airtrack.device.base.name"),
            phyname: registrar.intern("airtrack.device.base.phyname"),
            first_time: registrar.intern("airtrack.device.base.first_time"),
            last_time: registrar.intern("airtrack.device.base.last_time"),
            packets: registrar.intern("airtrack.device.base.packets.total"),
            channel: registrar.intern("airtrack.device.base.channel"),
            frequency: registrar.intern("airtrack.device.base.frequency"),
        }
    }
}

/// Mutable content of one device, guarded by the device's lock.
pub struct DeviceContent {
    base: BaseFields,
    root: Element,
    address: MacAddr,
    last_time: u64,
}

impl DeviceContent {
    fn new(base: BaseFields, key: DeviceKey, address: MacAddr, phy_name: &str, now: u64) -> Self {
        let mut root = Element::map();
        root.insert(base.key, Element::string(key.to_string()));
        root.insert(base.macaddr, Element::mac(address));
        root.insert(base.name, Element::string(address.to_string()));
        root.insert(base.phyname, Element::string(phy_name));
        root.insert(base.first_time, Element::uint(now));
        root.insert(base.last_time, Element::uint(now));
        root.insert(base.packets, Element::uint(0));

        Self {
            base,
            root,
            address,
            last_time: now,
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn address(&self) -> MacAddr {
        self.address
    }

    pub fn last_time(&self) -> u64 {
        self.last_time
    }

    /// Advance the last-seen timestamp. Monotonically non-decreasing:
    /// stale observations are ignored.
    pub fn update_last_time(&mut self, ts: u64) {
        if ts < self.last_time {
            return;
        }
        self.last_time = ts;
        if let Some(node) = self.root.get_mut(self.base.last_time) {
            node.set(ElementValue::UInt64(ts));
        }
    }

    pub fn name(&self) -> Option<String> {
        self.root
            .get(self.base.name)
            .and_then(|n| n.as_str())
            .map(str::to_string)
    }

    pub fn set_name(&mut self, name: &str) {
        if let Some(node) = self.root.get_mut(self.base.name) {
            node.set(ElementValue::String(name.to_string()));
        }
    }

    pub fn bump_packets(&mut self) {
        if let Some(node) = self.root.get_mut(self.base.packets) {
            let total = node.as_u64().unwrap_or(0);
            node.set(ElementValue::UInt64(total + 1));
        }
    }

    /// Insert or replace an arbitrary sub-field on the device root.
    pub fn set_field(&mut self, id: FieldId, value: Element) {
        if let Some(existing) = self.root.get_mut(id) {
            if existing.kind() == value.kind() {
                existing.set(value.value().clone());
                return;
            }
        }
        self.root.insert(id, value);
    }

    /// Pure path resolution over this device's tree.
    pub fn get(&self, path: &[FieldId]) -> Option<&Element> {
        get_path(&self.root, path)
    }
}

/// One tracked device: immutable key plus exclusively-locked content.
pub struct Device {
    key: DeviceKey,
    content: Mutex<DeviceContent>,
}

impl Device {
    pub fn new(
        key: DeviceKey,
        address: MacAddr,
        phy_name: &str,
        now: u64,
        base: BaseFields,
    ) -> Self {
        Self {
            key,
            content: Mutex::new(DeviceContent::new(base, key, address, phy_name, now)),
        }
    }

    pub fn key(&self) -> DeviceKey {
        self.key
    }

    /// Acquire this device's content lock.
    ///
    /// Callers must not hold the registry lock here, and must release the
    /// guard before locking any other device.
    pub fn lock(&self) -> MutexGuard<'_, DeviceContent> {
        self.content.lock()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(s: &str) -> MacAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_key_display_parse_roundtrip() {
        let key = DeviceKey::new(0x11, 0xDEADBEEF);
        let text = key.to_string();
        assert_eq!(text, "00000011_00000000DEADBEEF");
        assert_eq!(text.parse::<DeviceKey>().unwrap(), key);
    }

    #[test]
    fn test_key_parse_rejects_malformed() {
        assert!("garbage".parse::<DeviceKey>().is_err());
        assert!("0011_00".parse::<DeviceKey>().is_err());
        assert!("0000001100000000DEADBEEF".parse::<DeviceKey>().is_err());
        assert!("ZZZZZZZZ_00000000DEADBEEF".parse::<DeviceKey>().is_err());
    }

    #[test]
    fn test_new_device_base_fields() {
        let registrar = FieldRegistrar::new();
        let base = BaseFields::register(&registrar);
        let dev = Device::new(DeviceKey::new(1, 2), mac("AA:00:00:00:00:01"), "IEEE802.11", 100, base);

        let content = dev.lock();
        assert_eq!(content.last_time(), 100);
        assert_eq!(content.get(&[base.phyname]).unwrap().as_str(), Some("IEEE802.11"));
        assert_eq!(content.get(&[base.first_time]).unwrap().as_u64(), Some(100));
        assert_eq!(
            content.get(&[base.macaddr]).unwrap().as_mac(),
            Some(mac("AA:00:00:00:00:01"))
        );
    }

    #[test]
    fn test_last_time_is_monotonic() {
        let registrar = FieldRegistrar::new();
        let base = BaseFields::register(&registrar);
        let dev = Device::new(DeviceKey::new(1, 2), mac("AA:00:00:00:00:01"), "phy", 100, base);

        let mut content = dev.lock();
        content.update_last_time(200);
        content.update_last_time(150); // stale, ignored
        assert_eq!(content.last_time(), 200);
        assert_eq!(content.get(&[base.last_time]).unwrap().as_u64(), Some(200));
    }

    #[test]
    fn test_set_field_preserves_shape() {
        let registrar = FieldRegistrar::new();
        let base = BaseFields::register(&registrar);
        let dev = Device::new(DeviceKey::new(1, 2), mac("AA:00:00:00:00:01"), "phy", 100, base);
        let chan = base.channel;

        let mut content = dev.lock();
        content.set_field(chan, Element::string("6"));
        content.set_field(chan, Element::string("11"));
        assert_eq!(content.get(&[chan]).unwrap().as_str(), Some("11"));
    }
}
