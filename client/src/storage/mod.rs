//! Key-value storage backends.
//!
//! Two backends with different lifetimes back the credential store:
//! [`MemoryStorage`] lives for the process (session-scoped) and holds the
//! tokens, [`FileStorage`] survives restarts (persistent) and holds only
//! the `theme` preference after migration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A flat string-to-string store.
///
/// All operations are infallible by contract: a backend that cannot read
/// or write degrades to "no value" rather than erroring, so the session
/// layer resolves into an unauthenticated state instead of failing.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// In-process storage, cleared when the process ends.
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.lock().unwrap().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.map.lock().unwrap().keys().cloned().collect()
    }
}

/// File-backed storage persisted as a JSON object.
///
/// The file is read once at construction and rewritten on every mutation.
/// I/O and parse failures are logged and swallowed; a corrupt or
/// unreadable file behaves like an empty store.
pub struct FileStorage {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = Self::read_file(&path);
        Self {
            path,
            map: Mutex::new(map),
        }
    }

    fn read_file(path: &Path) -> HashMap<String, String> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Ignoring corrupt storage file {}: {}", path.display(), e);
                HashMap::new()
            }
        }
    }

    fn flush(&self, map: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!("Cannot create storage dir {}: {}", parent.display(), e);
                    return;
                }
            }
        }
        let contents = match serde_json::to_string_pretty(map) {
            Ok(contents) => contents,
            Err(_) => return,
        };
        if let Err(e) = fs::write(&self.path, contents) {
            tracing::warn!("Cannot write storage file {}: {}", self.path.display(), e);
        }
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.map.lock().unwrap();
        map.insert(key.to_string(), value.to_string());
        self.flush(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.map.lock().unwrap();
        if map.remove(key).is_some() {
            self.flush(&map);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.map.lock().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.get("access").is_none());

        storage.set("access", "tok");
        assert_eq!(storage.get("access").as_deref(), Some("tok"));

        storage.remove("access");
        assert!(storage.get("access").is_none());
    }

    #[test]
    fn test_memory_storage_keys() {
        let storage = MemoryStorage::new();
        storage.set("a", "1");
        storage.set("b", "2");

        let mut keys = storage.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let storage = FileStorage::open(&path);
        storage.set("theme", "dark");
        drop(storage);

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_storage_corrupt_file_behaves_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::open(&path);
        assert!(storage.get("theme").is_none());
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn test_file_storage_unwritable_path_is_swallowed() {
        // /dev/null is a file, so it cannot be used as a parent directory.
        let storage = FileStorage::open("/dev/null/nested/store.json");
        storage.set("theme", "dark");
        // The in-memory view still works; only persistence is lost.
        assert_eq!(storage.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_storage_remove_missing_key_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("store.json"));
        storage.remove("absent");
        assert!(storage.keys().is_empty());
    }
}
