// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Process-wide field name interning.
//!
//! Every logical field name maps to exactly one [`FieldId`] for the lifetime
//! of the process, regardless of which device instance defines it. This is
//! what makes field-path based sort/search/rename keys comparable across
//! heterogeneous devices.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Stable numeric identity of a registered field name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only, thread-safe interning table for field names.
///
/// Ids are assigned in registration order and never reused. Interning the
/// same name twice returns the same id.
pub struct FieldRegistrar {
    inner: RwLock<RegistrarInner>,
}

struct RegistrarInner {
    names: Vec<String>,
    ids: HashMap<String, FieldId>,
}

impl FieldRegistrar {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistrarInner {
                names: Vec::new(),
                ids: HashMap::new(),
            }),
        }
    }

    /// Intern a field name, registering it if unseen.
    pub fn intern(&self, name: &str) -> FieldId {
        if let Some(id) = self.inner.read().ids.get(name) {
            return *id;
        }

        let mut inner = self.inner.write();
        // Re-check under the write lock; another thread may have won the race.
        if let Some(id) = inner.ids.get(name) {
            return *id;
        }

        let id = FieldId(u32::try_from(inner.names.len()).unwrap_or(u32::MAX));
        inner.names.push(name.to_string());
        inner.ids.insert(name.to_string(), id);
        id
    }

    /// Look up an already-registered name without interning it.
    pub fn lookup(&self, name: &str) -> Option<FieldId> {
        self.inner.read().ids.get(name).copied()
    }

    /// Name registered for `id`, if any.
    pub fn name_of(&self, id: FieldId) -> Option<String> {
        self.inner.read().names.get(id.0 as usize).cloned()
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.inner.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().names.is_empty()
    }
}

impl Default for FieldRegistrar {
    fn default() -> Self {
        Self::new()
    }
}
