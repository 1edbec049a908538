//! Directory watch registry
//!
//! One kernel watch per distinct directory string, however many interest
//! paths resolve to it. The registry is a pure pair of maps — the installer
//! owns the kernel call — which keeps both directions independently testable:
//! directory-keyed for idempotence, descriptor-keyed for resolving raw events
//! back to a directory.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Bidirectional directory ↔ watch-descriptor mapping
#[derive(Debug, Default)]
pub struct WatchRegistry {
    by_dir: BTreeMap<OsString, i32>,
    by_wd: BTreeMap<i32, OsString>,
}

impl WatchRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `dir` already has a watch, i.e. the kernel need not be asked
    pub fn contains(&self, dir: &OsStr) -> bool {
        self.by_dir.contains_key(dir)
    }

    /// Record a freshly created watch in both directions.
    ///
    /// The kernel hands out one descriptor per inode, so two directory
    /// strings naming the same directory (`a`, `./a`) share a descriptor; the
    /// first string registered for it wins the reverse mapping.
    pub fn insert(&mut self, dir: OsString, wd: i32) {
        self.by_wd.entry(wd).or_insert_with(|| dir.clone());
        self.by_dir.insert(dir, wd);
    }

    /// Resolve a raw event's watch descriptor back to its directory.
    ///
    /// Unknown descriptors (stale, foreign, or the -1 of queue-overflow
    /// records) resolve to `None`; the caller skips those events.
    pub fn resolve(&self, wd: i32) -> Option<&OsStr> {
        self.by_wd.get(&wd).map(OsString::as_os_str)
    }

    /// Number of live directory watches
    pub fn len(&self) -> usize {
        self.by_dir.len()
    }

    /// Whether no watches are registered
    pub fn is_empty(&self) -> bool {
        self.by_dir.is_empty()
    }
}
