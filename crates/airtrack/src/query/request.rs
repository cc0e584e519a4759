// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Summary request parsing.
//!
//! A request body describes the projection (`fields`), an optional output
//! `wrapper`, an optional structured `regex` clause list, and an optional
//! tabular option block (paging, search, one sort column). Structural
//! malformation rejects the request here, before any registry work.

use crate::entity::{FieldPath, FieldRegistrar, FieldSummary};
use crate::query::pipeline::clamp_length;
use crate::structured::{Structured, StructuredError};
use regex::Regex;
use std::fmt;

/// Request parsing failure modes; all client-visible rejections.
#[derive(Debug)]
pub enum RequestError {
    MissingBody,
    /// A `fields` entry was neither a string nor a `[field, rename]` pair.
    BadFieldSpec,
    /// A `regex` entry was not a `{field, regex}` clause.
    BadRegexClause,
    BadRegex(regex::Error),
    Structured(StructuredError),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBody => write!(f, "missing request body"),
            Self::BadFieldSpec => write!(f, "expected field or [field, rename] pair"),
            Self::BadRegexClause => write!(f, "expected [field, regex] clause"),
            Self::BadRegex(e) => write!(f, "invalid regex: {}", e),
            Self::Structured(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<StructuredError> for RequestError {
    fn from(value: StructuredError) -> Self {
        Self::Structured(value)
    }
}

impl From<regex::Error> for RequestError {
    fn from(value: regex::Error) -> Self {
        Self::BadRegex(value)
    }
}

/// One structured regex filter clause: match `pattern` against the value
/// at `path`.
#[derive(Debug)]
pub struct RegexClause {
    pub path: FieldPath,
    pub pattern: Regex,
}

/// Tabular (paged-grid) options.
#[derive(Debug, Clone)]
pub struct TableOptions {
    pub start: usize,
    pub length: usize,
    /// Opaque request-echo token, returned alongside the page.
    pub draw: u64,
    pub search: String,
    /// Resolved paths of the columns flagged searchable.
    pub search_paths: Vec<FieldPath>,
    /// Sort column as an index into the summary list; out-of-range
    /// indices have already been discarded.
    pub order_column: Option<usize>,
    pub descending: bool,
}

impl TableOptions {
    /// Whether the substring filter applies.
    pub fn search_active(&self) -> bool {
        !self.search.is_empty() && !self.search_paths.is_empty()
    }
}

/// Parsed summary request.
pub struct SummaryRequest {
    fields: Option<Vec<FieldSummary>>,
    wrapper: Option<String>,
    regex: Vec<RegexClause>,
    table: Option<TableOptions>,
}

impl SummaryRequest {
    /// Parse a structured body. Field names are interned once here; the
    /// resulting request is independent of the registry.
    pub fn parse(body: &Structured, registrar: &FieldRegistrar) -> Result<Self, RequestError> {
        let fields = parse_fields(body, registrar)?;

        let wrapper = match body.key_as_string("wrapper", "") {
            w if w.is_empty() => None,
            w => Some(w),
        };

        let regex = match body.get("regex") {
            Some(clauses) => parse_regex(&clauses, registrar)?,
            None => Vec::new(),
        };

        let table = if body.key_as_bool("datatable", false) {
            Some(parse_table(body, fields.as_deref().unwrap_or(&[])))
        } else {
            None
        };

        Ok(Self {
            fields,
            wrapper,
            regex,
            table,
        })
    }

    /// Request with no body at all (plain GET-style listing).
    pub fn empty() -> Self {
        Self {
            fields: None,
            wrapper: None,
            regex: Vec::new(),
            table: None,
        }
    }

    pub fn fields(&self) -> Option<&[FieldSummary]> {
        self.fields.as_deref()
    }

    pub fn wrapper(&self) -> Option<&str> {
        self.wrapper.as_deref()
    }

    pub fn regex(&self) -> &[RegexClause] {
        &self.regex
    }

    pub fn table(&self) -> Option<&TableOptions> {
        self.table.as_ref()
    }
}

fn parse_fields(
    body: &Structured,
    registrar: &FieldRegistrar,
) -> Result<Option<Vec<FieldSummary>>, RequestError> {
    let Some(fields) = body.get("fields") else {
        return Ok(None);
    };
    let entries = fields.array().ok_or(RequestError::BadFieldSpec)?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(spec) = entry.as_str() {
            out.push(FieldSummary::parse(spec, registrar));
        } else if entry.is_array() {
            let pair = entry.as_string_vec().ok_or(RequestError::BadFieldSpec)?;
            if pair.len() != 2 {
                return Err(RequestError::BadFieldSpec);
            }
            out.push(FieldSummary::parse_renamed(&pair[0], &pair[1], registrar));
        } else {
            return Err(RequestError::BadFieldSpec);
        }
    }
    Ok(Some(out))
}

fn parse_regex(
    clauses: &Structured,
    registrar: &FieldRegistrar,
) -> Result<Vec<RegexClause>, RequestError> {
    let entries = clauses.array().ok_or(RequestError::BadRegexClause)?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let (field, pattern) = if entry.is_array() {
            let pair = entry.as_string_vec().ok_or(RequestError::BadRegexClause)?;
            if pair.len() != 2 {
                return Err(RequestError::BadRegexClause);
            }
            (pair[0].clone(), pair[1].clone())
        } else if entry.has_key("field") && entry.has_key("regex") {
            (
                entry.key_as_string("field", ""),
                entry.key_as_string("regex", ""),
            )
        } else {
            return Err(RequestError::BadRegexClause);
        };

        out.push(RegexClause {
            path: crate::entity::intern_path(&field, registrar),
            pattern: Regex::new(&pattern)?,
        });
    }
    Ok(out)
}

fn parse_table(body: &Structured, fields: &[FieldSummary]) -> TableOptions {
    let start = usize::try_from(body.key_as_i64("start", 0)).unwrap_or(0);
    let length = clamp_length(body.key_as_i64("length", 0));
    let draw = u64::try_from(body.key_as_i64("draw", 0)).unwrap_or(0);
    let search = body.key_as_string("search", "");

    // Column order doubles as the searchable/sortable enumeration: the
    // i-th searchable flag and the sort column index both refer to the
    // i-th summary entry.
    let mut search_paths = Vec::new();
    if !search.is_empty() {
        if let Some(flags) = body.get("searchable").and_then(|s| s.array()) {
            for (i, flag) in flags.iter().enumerate().take(fields.len()) {
                if flag.as_bool_lenient() {
                    search_paths.push(fields[i].path().to_vec());
                }
            }
        }
    }

    let mut order_column = None;
    let mut descending = false;
    if let Some(order) = body.get("order") {
        let col = order.key_as_i64("column", -1);
        if col >= 0 {
            let col = usize::try_from(col).unwrap_or(usize::MAX);
            // Ordering by a column outside the summary list disables the
            // sort rather than failing the request.
            if col < fields.len() {
                order_column = Some(col);
                descending = order.key_as_string("dir", "asc") == "desc";
            }
        }
    }

    TableOptions {
        start,
        length,
        draw,
        search,
        search_paths,
        order_column,
        descending,
    }
}
