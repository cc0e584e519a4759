// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Query pipeline: filter, sort, paginate, summarize.

pub mod filter;
pub mod pipeline;
pub mod request;

pub use filter::{RegexFilter, StringMatch, TimeFilter};
pub use pipeline::{
    clamp_length, clamp_start, device_window, run_last_time, run_summary, QueryOutput,
    DEFAULT_PAGE_LENGTH, MAX_PAGE_LENGTH,
};
pub use request::{RegexClause, RequestError, SummaryRequest, TableOptions};
