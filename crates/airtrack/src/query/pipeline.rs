// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! The filter / sort / paginate / summarize pipeline.
//!
//! Stages run in a fixed order: candidate selection (structured regex
//! beats substring search beats full registry), stable single-key sort,
//! page slicing, projection, wrapping. Candidate selection and projection
//! run as chained worker passes, so no stage holds the registry lock
//! while inspecting device content.

use crate::entity::{
    compare_elements, get_path, summarize, Element, FieldId, RenameCache,
};
use crate::query::filter::{RegexFilter, StringMatch, TimeFilter};
use crate::query::request::SummaryRequest;
use crate::registry::{scan_devices, scan_registry, Device, DeviceRegistry};
use std::sync::Arc;

/// Hard ceiling on a requested page length.
pub const MAX_PAGE_LENGTH: usize = 200;
/// Length forced when a request asks for nothing or too much.
pub const DEFAULT_PAGE_LENGTH: usize = 50;

/// Clamp a requested page length into the supported range.
pub fn clamp_length(raw: i64) -> usize {
    match usize::try_from(raw) {
        Ok(len) if len > 0 && len <= MAX_PAGE_LENGTH => len,
        _ => DEFAULT_PAGE_LENGTH,
    }
}

/// Clamp a page offset: past-the-end offsets silently restart at the top.
pub fn clamp_start(start: usize, count: usize) -> usize {
    if start >= count {
        0
    } else {
        start
    }
}

/// Result of a pipeline run: the response-shaped tree plus the rename
/// cache accumulated during projection.
pub struct QueryOutput {
    pub element: Element,
    pub rename: RenameCache,
}

/// Run the full summary pipeline against the registry.
pub fn run_summary(registry: &DeviceRegistry, req: &SummaryRequest) -> QueryOutput {
    let records_total = registry.device_count() as u64;

    let mut candidates: Vec<Arc<Device>> = if !req.regex().is_empty() {
        // A structured regex clause takes precedence over substring search.
        let mut worker = RegexFilter::new(req.regex());
        scan_registry(registry, &mut worker);
        worker.into_matched()
    } else if let Some(table) = req.table().filter(|t| t.search_active()) {
        let mut worker = StringMatch::new(&table.search, &table.search_paths);
        scan_registry(registry, &mut worker);
        worker.into_matched()
    } else {
        registry.snapshot()
    };

    let records_filtered = candidates.len() as u64;

    if let (Some(table), Some(fields)) = (req.table(), req.fields()) {
        if let Some(col) = table.order_column {
            sort_candidates(&mut candidates, fields[col].path(), table.descending);
        }
    }

    let page: &[Arc<Device>] = match req.table() {
        Some(table) => {
            let start = clamp_start(table.start, candidates.len());
            let end = (start + table.length).min(candidates.len());
            &candidates[start..end]
        }
        None => &candidates,
    };

    let (outdevs, rename) = project(page, req);
    let element = wrap_output(registry, req, outdevs, records_total, records_filtered);
    QueryOutput { element, rename }
}

/// Run the time-window pipeline: time filter, optional regex pass,
/// projection. No sort or paging; the window itself bounds the result.
pub fn run_last_time(
    registry: &DeviceRegistry,
    threshold: i64,
    req: &SummaryRequest,
    now: u64,
) -> QueryOutput {
    let mut time = TimeFilter::new(threshold, now);
    scan_registry(registry, &mut time);
    let timedevs = time.into_matched();

    let candidates = if req.regex().is_empty() {
        timedevs
    } else {
        let mut worker = RegexFilter::new(req.regex());
        scan_devices(&timedevs, &mut worker);
        worker.into_matched()
    };

    let (outdevs, rename) = project(&candidates, req);
    let element = match req.wrapper() {
        Some(name) => wrap_named(registry, name, outdevs),
        None => outdevs,
    };
    QueryOutput { element, rename }
}

/// Full (unprojected) clones of every device inside a time window.
pub fn device_window(registry: &DeviceRegistry, threshold: i64, now: u64) -> Element {
    let mut time = TimeFilter::new(threshold, now);
    scan_registry(registry, &mut time);

    let mut out = Element::vector();
    for device in &time.into_matched() {
        out.push(device.lock().root().clone());
    }
    out
}

/// Stable single-key sort. Sort keys are extracted first, one device lock
/// at a time, so the comparator itself never takes a lock.
fn sort_candidates(devices: &mut Vec<Arc<Device>>, path: &[FieldId], descending: bool) {
    let mut keyed: Vec<(Option<Element>, Arc<Device>)> = devices
        .drain(..)
        .map(|device| {
            let key = {
                let content = device.lock();
                get_path(content.root(), path).cloned()
            };
            (key, device)
        })
        .collect();

    keyed.sort_by(|a, b| {
        let ord = compare_elements(a.0.as_ref(), b.0.as_ref());
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });

    devices.extend(keyed.into_iter().map(|(_, device)| device));
}

fn project(page: &[Arc<Device>], req: &SummaryRequest) -> (Element, RenameCache) {
    let mut rename = RenameCache::new();
    let mut outdevs = Element::vector();

    for device in page {
        let content = device.lock();
        let projected = match req.fields() {
            Some(fields) => summarize(content.root(), fields, &mut rename),
            None => content.root().clone(),
        };
        outdevs.push(projected);
    }
    (outdevs, rename)
}

fn wrap_named(registry: &DeviceRegistry, name: &str, outdevs: Element) -> Element {
    let id = registry.registrar().intern(name);
    let mut wrapper = Element::map();
    wrapper.insert(id, outdevs.with_name(name));
    wrapper
}

fn wrap_output(
    registry: &DeviceRegistry,
    req: &SummaryRequest,
    outdevs: Element,
    records_total: u64,
    records_filtered: u64,
) -> Element {
    let registrar = registry.registrar();

    if let Some(table) = req.table() {
        // A tabular response always wraps, regardless of the wrapper key:
        // the grid client needs the side-channel counts and the echo token.
        let mut wrapper = Element::map();
        wrapper.insert(
            registrar.intern("airtrack.datatable.data"),
            outdevs.with_name("data"),
        );
        wrapper.insert(
            registrar.intern("airtrack.datatable.draw"),
            Element::uint(table.draw).with_name("draw"),
        );
        wrapper.insert(
            registrar.intern("airtrack.datatable.records_total"),
            Element::uint(records_total).with_name("recordsTotal"),
        );
        wrapper.insert(
            registrar.intern("airtrack.datatable.records_filtered"),
            Element::uint(records_filtered).with_name("recordsFiltered"),
        );
        wrapper
    } else if let Some(name) = req.wrapper() {
        wrap_named(registry, name, outdevs)
    } else {
        outdevs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::MacAddr;
    use crate::structured::Structured;

    fn mac(i: u8) -> MacAddr {
        MacAddr::new([0xAA, 0, 0, 0, 0, i])
    }

    fn seeded(n: u8) -> DeviceRegistry {
        let reg = DeviceRegistry::new();
        let phy = reg.register_phy("IEEE802.11");
        for i in 0..n {
            reg.new_device(phy, mac(i), u64::from(i) * 10);
        }
        reg
    }

    fn parse(reg: &DeviceRegistry, body: &str) -> SummaryRequest {
        SummaryRequest::parse(&Structured::from_json(body).unwrap(), reg.registrar()).unwrap()
    }

    #[test]
    fn test_clamp_length() {
        assert_eq!(clamp_length(25), 25);
        assert_eq!(clamp_length(200), 200);
        assert_eq!(clamp_length(0), DEFAULT_PAGE_LENGTH);
        assert_eq!(clamp_length(-3), DEFAULT_PAGE_LENGTH);
        assert_eq!(clamp_length(100_000), DEFAULT_PAGE_LENGTH);
    }

    #[test]
    fn test_clamp_start_restarts_at_top() {
        assert_eq!(clamp_start(10, 100), 10);
        assert_eq!(clamp_start(100, 100), 0);
        assert_eq!(clamp_start(0, 0), 0);
    }

    #[test]
    fn test_pages_are_exhaustive_and_disjoint() {
        let reg = seeded(23);
        let mut seen = Vec::new();

        for page in 0..5 {
            let body = format!(
                r#"{{"fields":["airtrack.device.base.last_time"],"datatable":true,
                    "start":{},"length":5,
                    "order":{{"column":0,"dir":"asc"}}}}"#,
                page * 5
            );
            let req = parse(&reg, &body);
            let out = run_summary(&reg, &req);

            let data_id = reg.registrar().lookup("airtrack.datatable.data").unwrap();
            let items = out.element.get(data_id).unwrap().as_vector().unwrap();
            let ts_id = reg.registrar().lookup("airtrack.device.base.last_time").unwrap();
            for item in items {
                seen.push(item.get(ts_id).unwrap().as_u64().unwrap());
            }
        }

        // Union of all pages reconstructs the sorted sequence exactly once.
        let expected: Vec<u64> = (0..23).map(|i| i * 10).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_sort_is_deterministic() {
        let reg = seeded(9);
        let body = r#"{"fields":["airtrack.device.base.last_time"],"datatable":true,
                       "length":200,"order":{"column":0,"dir":"desc"}}"#;

        let first = run_summary(&reg, &parse(&reg, body));
        let second = run_summary(&reg, &parse(&reg, body));
        assert_eq!(first.element, second.element);
    }

    #[test]
    fn test_table_metadata_counts() {
        let reg = seeded(10);
        let body = r#"{"fields":["airtrack.device.base.macaddr"],"datatable":true,"length":3,
                       "regex":[["airtrack.device.base.macaddr","0[0-4]$"]]}"#;
        let out = run_summary(&reg, &parse(&reg, body));

        let registrar = reg.registrar();
        let total = out
            .element
            .get(registrar.lookup("airtrack.datatable.records_total").unwrap())
            .unwrap();
        let filtered = out
            .element
            .get(registrar.lookup("airtrack.datatable.records_filtered").unwrap())
            .unwrap();
        let data = out
            .element
            .get(registrar.lookup("airtrack.datatable.data").unwrap())
            .unwrap();

        assert_eq!(total.as_u64(), Some(10));
        assert_eq!(filtered.as_u64(), Some(5));
        assert_eq!(data.as_vector().unwrap().len(), 3); // page-limited
    }

    #[test]
    fn test_wrapper_name_without_table() {
        let reg = seeded(2);
        let body = r#"{"fields":["airtrack.device.base.macaddr"],"wrapper":"devices"}"#;
        let out = run_summary(&reg, &parse(&reg, body));

        let id = reg.registrar().lookup("devices").unwrap();
        let inner = out.element.get(id).unwrap();
        assert_eq!(inner.local_name(), Some("devices"));
        assert_eq!(inner.as_vector().unwrap().len(), 2);
    }

    #[test]
    fn test_last_time_pipeline_filters_then_projects() {
        let reg = seeded(5); // timestamps 0,10,20,30,40
        let body = r#"{"fields":["airtrack.device.base.last_time"]}"#;
        let req = parse(&reg, body);

        let out = run_last_time(&reg, 15, &req, 0);
        let items = out.element.as_vector().unwrap();
        assert_eq!(items.len(), 3);

        let ts_id = reg.registrar().lookup("airtrack.device.base.last_time").unwrap();
        let times: Vec<u64> = items
            .iter()
            .map(|i| i.get(ts_id).unwrap().as_u64().unwrap())
            .collect();
        assert_eq!(times, vec![20, 30, 40]);
    }

    #[test]
    fn test_device_window_full_clones() {
        let reg = seeded(4);
        let window = device_window(&reg, -25, 40); // threshold 15
        assert_eq!(window.as_vector().unwrap().len(), 2);

        // Full device trees, not projections.
        let key_id = reg.registrar().lookup("airtrack.device.base.key").unwrap();
        assert!(window.as_vector().unwrap()[0].get(key_id).is_some());
    }

    #[test]
    fn test_regex_beats_search() {
        let reg = seeded(6);
        // Search would match everything; the regex clause must win.
        let body = r#"{"fields":["airtrack.device.base.macaddr"],"datatable":true,
                       "search":"AA:","searchable":[true],
                       "regex":[["airtrack.device.base.macaddr","05$"]]}"#;
        let out = run_summary(&reg, &parse(&reg, body));

        let filtered = out
            .element
            .get(reg.registrar().lookup("airtrack.datatable.records_filtered").unwrap())
            .unwrap();
        assert_eq!(filtered.as_u64(), Some(1));
    }

    #[test]
    fn test_empty_fields_projects_nothing() {
        let reg = seeded(2);
        let body = r#"{"fields":[]}"#;
        let out = run_summary(&reg, &parse(&reg, body));

        let items = out.element.as_vector().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].as_map().unwrap().is_empty());
    }
}
