// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Filtering workers for the query pipeline.

use crate::entity::{get_path, FieldPath};
use crate::query::request::RegexClause;
use crate::registry::{Device, DeviceContent, DeviceWorker, ScanSignal};
use std::sync::Arc;

/// Keep devices seen strictly after a threshold.
///
/// A negative threshold is a relative window: "now plus threshold".
pub struct TimeFilter {
    threshold: u64,
    matched: Vec<Arc<Device>>,
}

impl TimeFilter {
    pub fn new(threshold: i64, now: u64) -> Self {
        let threshold = if threshold < 0 {
            now.saturating_sub(threshold.unsigned_abs())
        } else {
            threshold as u64
        };
        Self {
            threshold,
            matched: Vec::new(),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn into_matched(self) -> Vec<Arc<Device>> {
        self.matched
    }
}

impl DeviceWorker for TimeFilter {
    fn visit(&mut self, device: &Arc<Device>, content: &DeviceContent) -> ScanSignal {
        // Strictly greater: a device seen exactly at the threshold is out.
        if content.last_time() > self.threshold {
            self.matched.push(device.clone());
        }
        ScanSignal::Continue
    }
}

/// Keep devices where any clause's target field matches its pattern.
pub struct RegexFilter<'a> {
    clauses: &'a [RegexClause],
    matched: Vec<Arc<Device>>,
}

impl<'a> RegexFilter<'a> {
    pub fn new(clauses: &'a [RegexClause]) -> Self {
        Self {
            clauses,
            matched: Vec::new(),
        }
    }

    pub fn into_matched(self) -> Vec<Arc<Device>> {
        self.matched
    }
}

impl DeviceWorker for RegexFilter<'_> {
    fn visit(&mut self, device: &Arc<Device>, content: &DeviceContent) -> ScanSignal {
        for clause in self.clauses {
            let Some(node) = get_path(content.root(), &clause.path) else {
                continue;
            };
            let Some(text) = node.as_search_string() else {
                continue;
            };
            if clause.pattern.is_match(&text) {
                self.matched.push(device.clone());
                break;
            }
        }
        ScanSignal::Continue
    }
}

/// Keep devices where the stringified value at any searchable path
/// contains the query substring. Literal match, no fuzzing.
pub struct StringMatch<'a> {
    query: &'a str,
    paths: &'a [FieldPath],
    matched: Vec<Arc<Device>>,
}

impl<'a> StringMatch<'a> {
    pub fn new(query: &'a str, paths: &'a [FieldPath]) -> Self {
        Self {
            query,
            paths,
            matched: Vec::new(),
        }
    }

    pub fn into_matched(self) -> Vec<Arc<Device>> {
        self.matched
    }
}

impl DeviceWorker for StringMatch<'_> {
    fn visit(&mut self, device: &Arc<Device>, content: &DeviceContent) -> ScanSignal {
        for path in self.paths {
            let Some(node) = get_path(content.root(), path) else {
                continue;
            };
            let Some(text) = node.as_search_string() else {
                continue;
            };
            if text.contains(self.query) {
                self.matched.push(device.clone());
                break;
            }
        }
        ScanSignal::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::MacAddr;
    use crate::query::request::SummaryRequest;
    use crate::registry::{scan_devices, scan_registry, DeviceRegistry};
    use crate::structured::Structured;

    fn mac(i: u8) -> MacAddr {
        MacAddr::new([0xAA, 0, 0, 0, 0, i])
    }

    fn seeded() -> DeviceRegistry {
        let reg = DeviceRegistry::new();
        let phy = reg.register_phy("IEEE802.11");
        for (i, ts) in [10u64, 20, 30].iter().enumerate() {
            reg.new_device(phy, mac(i as u8), *ts);
        }
        reg
    }

    #[test]
    fn test_time_filter_strictly_greater() {
        let reg = seeded();
        let mut filter = TimeFilter::new(20, 0);
        scan_registry(&reg, &mut filter);

        let matched = filter.into_matched();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].lock().last_time(), 30);
    }

    #[test]
    fn test_time_filter_relative_window() {
        // -60 with now=100 is an absolute threshold of 40.
        let filter = TimeFilter::new(-60, 100);
        assert_eq!(filter.threshold(), 40);

        // Window larger than the clock clamps to zero.
        let filter = TimeFilter::new(-200, 100);
        assert_eq!(filter.threshold(), 0);
    }

    #[test]
    fn test_regex_filter_on_mac_text() {
        let reg = seeded();
        let body = Structured::from_json(
            r#"{"regex":[["airtrack.device.base.macaddr","^AA:00:00:00:00:0[01]$"]]}"#,
        )
        .unwrap();
        let req = SummaryRequest::parse(&body, reg.registrar()).unwrap();

        let mut filter = RegexFilter::new(req.regex());
        scan_registry(&reg, &mut filter);
        assert_eq!(filter.into_matched().len(), 2);
    }

    #[test]
    fn test_regex_filter_tolerates_absent_field() {
        let reg = seeded();
        let body = Structured::from_json(r#"{"regex":[["no.such.field",".*"]]}"#).unwrap();
        let req = SummaryRequest::parse(&body, reg.registrar()).unwrap();

        let mut filter = RegexFilter::new(req.regex());
        scan_registry(&reg, &mut filter);
        assert!(filter.into_matched().is_empty());
    }

    #[test]
    fn test_string_match_literal_substring() {
        let reg = seeded();
        let path = vec![reg.base_fields().macaddr];
        let paths = vec![path];

        let mut filter = StringMatch::new("00:02", &paths);
        scan_registry(&reg, &mut filter);
        assert_eq!(filter.into_matched().len(), 1);

        // Case matters: literal match only.
        let mut filter = StringMatch::new("aa:00", &paths);
        scan_registry(&reg, &mut filter);
        assert!(filter.into_matched().is_empty());
    }

    #[test]
    fn test_filters_chain_as_worker_passes() {
        let reg = seeded();

        let mut time = TimeFilter::new(15, 0);
        scan_registry(&reg, &mut time);
        let timedevs = time.into_matched();
        assert_eq!(timedevs.len(), 2);

        let body = Structured::from_json(
            r#"{"regex":[["airtrack.device.base.macaddr","0:02$"]]}"#,
        )
        .unwrap();
        let req = SummaryRequest::parse(&body, reg.registrar()).unwrap();
        let mut regex = RegexFilter::new(req.regex());
        scan_devices(&timedevs, &mut regex);

        let out = regex.into_matched();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].lock().last_time(), 30);
    }
}
