// SPDX-License-Identifier: MIT

//! Best-effort local key-value store for guest-scoped data.
//!
//! The contract mirrors browser local storage: `get` returns absent on any
//! failure, `set`/`remove` never propagate errors. Values live in an
//! in-memory map with a JSON file snapshot so guest sessions survive a
//! restart. A corrupt or unreadable snapshot degrades to an empty store.

use std::fs;
use std::path::PathBuf;

use dashmap::DashMap;

/// Local key-value store. Cheap to share via `Arc`.
pub struct LocalStore {
    cache: DashMap<String, String>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Open a store backed by a JSON file snapshot.
    ///
    /// A missing or unparseable snapshot starts the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = DashMap::new();

        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<std::collections::HashMap<String, String>>(&raw)
            {
                Ok(entries) => {
                    for (k, v) in entries {
                        cache.insert(k, v);
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Local store snapshot unreadable, starting empty");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Local store snapshot unreadable, starting empty");
            }
        }

        Self {
            cache,
            path: Some(path),
        }
    }

    /// In-memory store with no file snapshot (tests).
    pub fn in_memory() -> Self {
        Self {
            cache: DashMap::new(),
            path: None,
        }
    }

    /// Get a value, or None if absent.
    pub fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).map(|v| v.clone())
    }

    /// Set a value. The snapshot write is best-effort.
    pub fn set(&self, key: &str, value: &str) {
        self.cache.insert(key.to_string(), value.to_string());
        self.snapshot();
    }

    /// Remove a key. No-op if absent.
    pub fn remove(&self, key: &str) {
        self.cache.remove(key);
        self.snapshot();
    }

    /// Write the snapshot file. Failures are logged and swallowed.
    fn snapshot(&self) {
        let Some(path) = &self.path else {
            return;
        };

        let entries: std::collections::HashMap<String, String> = self
            .cache
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let raw = match serde_json::to_string(&entries) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Local store snapshot serialization failed");
                return;
            }
        };

        // Write-then-rename so a crash never leaves a torn snapshot.
        let tmp = path.with_extension("tmp");
        if let Err(e) = fs::write(&tmp, raw).and_then(|_| fs::rename(&tmp, path)) {
            tracing::warn!(path = %path.display(), error = %e, "Local store snapshot write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_roundtrip() {
        let store = LocalStore::in_memory();
        assert_eq!(store.get("missing"), None);

        store.set("k", "v");
        assert_eq!(store.get("k"), Some("v".to_string()));

        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = LocalStore::open(&path);
        store.set("muse_guest_session_x", "{\"id\":\"x\"}");
        drop(store);

        let reopened = LocalStore::open(&path);
        assert_eq!(
            reopened.get("muse_guest_session_x"),
            Some("{\"id\":\"x\"}".to_string())
        );
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json at all").unwrap();

        let store = LocalStore::open(&path);
        assert_eq!(store.get("anything"), None);
    }
}
