//! Process-lifetime modification cache.
//!
//! Records the mtime of every compiled source (plus the mtimes of the files
//! it imports) so that unchanged sources are not compiled twice.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use super::mtime::mtime_secs;

/// Snapshot taken at `store` time.
#[derive(Debug, Clone)]
struct Entry {
    mtime: u64,
    dependencies: Vec<(PathBuf, u64)>,
}

/// Mtime table guarded by a single mutex.
///
/// Both [`store`](Self::store) and [`is_modified`](Self::is_modified) take
/// the same lock, so a compile decision never races a concurrent store.
/// Owned by whoever drives the compiler; there is no global instance.
#[derive(Debug, Default)]
pub struct ModificationCache {
    entries: Mutex<FxHashMap<PathBuf, Entry>>,
}

impl ModificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current mtime of `file` and of each dependency.
    ///
    /// Dependencies that cannot be stat'ed are not recorded. If `file` itself
    /// is gone the entry is dropped, so the next check reports it modified.
    pub fn store(&self, file: &Path, dependencies: &[PathBuf]) {
        let mut entries = self.entries.lock();

        let Some(mtime) = mtime_secs(file) else {
            entries.remove(file);
            return;
        };

        let dependencies = dependencies
            .iter()
            .filter_map(|dep| mtime_secs(dep).map(|m| (dep.clone(), m)))
            .collect();

        entries.insert(
            file.to_path_buf(),
            Entry {
                mtime,
                dependencies,
            },
        );
    }

    /// Whether `file` needs recompiling.
    ///
    /// True if it was never stored, if its mtime is strictly greater than the
    /// stored one, or if any stored dependency is newer than when it was
    /// stored (or has disappeared). Same-second edits are not detected.
    pub fn is_modified(&self, file: &Path) -> bool {
        let entries = self.entries.lock();

        let Some(entry) = entries.get(file) else {
            return true;
        };

        match mtime_secs(file) {
            Some(current) if entry.mtime < current => return true,
            None => return true,
            _ => {}
        }

        entry
            .dependencies
            .iter()
            .any(|(dep, stored)| mtime_secs(dep).is_none_or(|current| *stored < current))
    }

    /// Forget everything.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
