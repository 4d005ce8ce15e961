//! The ordered search path and its de-duplication set.

use std::collections::HashSet;

use crate::path::{absolute, normcase};

/// Ordered list of directories consulted by the module loader.
///
/// Earlier entries win on name collisions. Entries are only ever added,
/// at the front or at the back; nothing here reorders or removes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<String>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Register an entry.
    ///
    /// Note the inverted naming, kept for compatibility with existing
    /// callers: `prepend_mode == true` appends to the back, `false`
    /// inserts at the front.
    pub fn insert(&mut self, entry: String, prepend_mode: bool) {
        if prepend_mode {
            self.entries.push(entry);
        } else {
            self.entries.insert(0, entry);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.iter().any(|e| e == entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

/// Canonical keys of directories already on the search path.
///
/// Shared by every directive file processed during one bootstrap so the
/// same directory is never registered twice.
#[derive(Debug, Clone, Default)]
pub struct KnownPaths {
    keys: HashSet<String>,
}

impl KnownPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the set from an existing search path. Entries that cannot be
    /// made absolute are skipped.
    pub fn from_search_path(search_path: &SearchPath) -> Self {
        let keys = search_path
            .iter()
            .filter_map(|entry| absolute(entry).ok())
            .map(|resolved| normcase(&resolved))
            .collect();
        Self { keys }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Record a key. Returns `false` if it was already known.
    pub fn insert(&mut self, key: String) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
