// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Visitor protocol for registry scans.
//!
//! A worker is invoked once per candidate device with that device's lock
//! held. The driver takes the registry lock only to snapshot the target
//! sequence, releases it, then locks devices one at a time in snapshot
//! order. Worker passes chain: one pass's accumulator becomes the next
//! pass's input sequence, so multi-stage queries never hold a
//! registry-wide lock.

use super::device::{Device, DeviceContent};
use super::DeviceRegistry;
use std::sync::Arc;

/// Continuation signal returned by a worker visit.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScanSignal {
    /// Keep scanning.
    Continue,
    /// Terminate the scan early (find-first queries, cancellation).
    Stop,
}

/// Unit of work applied per device during a scan.
pub trait DeviceWorker {
    /// Inspect one device. `content` is guarded by the device's own lock
    /// for exactly the duration of this call.
    fn visit(&mut self, device: &Arc<Device>, content: &DeviceContent) -> ScanSignal;
}

/// Closure adapter for one-off workers.
pub struct FnWorker<F>(pub F);

impl<F> DeviceWorker for FnWorker<F>
where
    F: FnMut(&Arc<Device>, &DeviceContent) -> ScanSignal,
{
    fn visit(&mut self, device: &Arc<Device>, content: &DeviceContent) -> ScanSignal {
        (self.0)(device, content)
    }
}

/// Apply `worker` to every device in the registry's current snapshot.
pub fn scan_registry(registry: &DeviceRegistry, worker: &mut dyn DeviceWorker) {
    let snapshot = registry.snapshot();
    scan_devices(&snapshot, worker);
}

/// Apply `worker` to a caller-supplied candidate sequence.
///
/// Device locks are acquired strictly in sequence order, one at a time,
/// and released before the next device is touched.
pub fn scan_devices(devices: &[Arc<Device>], worker: &mut dyn DeviceWorker) {
    for device in devices {
        let content = device.lock();
        let signal = worker.visit(device, &content);
        drop(content);
        if signal == ScanSignal::Stop {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::MacAddr;

    fn mac(i: u8) -> MacAddr {
        MacAddr::new([0xAA, 0, 0, 0, 0, i])
    }

    fn seeded_registry(n: u8) -> DeviceRegistry {
        let reg = DeviceRegistry::new();
        let phy = reg.register_phy("IEEE802.11");
        for i in 0..n {
            reg.new_device(phy, mac(i), u64::from(i) * 10);
        }
        reg
    }

    #[test]
    fn test_full_scan_visits_all_in_order() {
        let reg = seeded_registry(4);
        let mut seen = Vec::new();
        scan_registry(
            &reg,
            &mut FnWorker(|_d: &Arc<Device>, c: &DeviceContent| {
                seen.push(c.last_time());
                ScanSignal::Continue
            }),
        );
        assert_eq!(seen, vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_stop_terminates_early() {
        let reg = seeded_registry(10);
        let mut visits = 0;
        scan_registry(
            &reg,
            &mut FnWorker(|_d: &Arc<Device>, _c: &DeviceContent| {
                visits += 1;
                if visits == 3 {
                    ScanSignal::Stop
                } else {
                    ScanSignal::Continue
                }
            }),
        );
        assert_eq!(visits, 3);
    }

    #[test]
    fn test_chained_passes_use_prior_accumulator() {
        let reg = seeded_registry(6);

        // Pass 1: devices seen at 20 or later.
        let mut recent = Vec::new();
        scan_registry(
            &reg,
            &mut FnWorker(|d: &Arc<Device>, c: &DeviceContent| {
                if c.last_time() >= 20 {
                    recent.push(d.clone());
                }
                ScanSignal::Continue
            }),
        );
        assert_eq!(recent.len(), 4);

        // Pass 2 runs against pass 1's accumulator only.
        let mut count = 0;
        scan_devices(
            &recent,
            &mut FnWorker(|_d: &Arc<Device>, _c: &DeviceContent| {
                count += 1;
                ScanSignal::Continue
            }),
        );
        assert_eq!(count, 4);
    }

    #[test]
    fn test_scan_does_not_block_inserts() {
        // A worker body mid-scan must not hold the registry lock.
        let reg = seeded_registry(3);
        let phy = reg.register_phy("IEEE802.11");
        let mut inserted = false;
        scan_registry(
            &reg,
            &mut FnWorker(|_d: &Arc<Device>, _c: &DeviceContent| {
                if !inserted {
                    // Would deadlock if the scan held the registry lock.
                    reg.new_device(phy, mac(0x99), 500);
                    inserted = true;
                }
                ScanSignal::Continue
            }),
        );
        assert_eq!(reg.device_count(), 4);
    }
}
