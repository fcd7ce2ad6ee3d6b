//! File-backed store.
//!
//! The file is the only copy of the data. Every read loads it, and every write
//! reloads it, changes the one key and atomically replaces the file. Several
//! processes can then share one path without reverting each other's changes.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::KeyValueStore;

type Entries = BTreeMap<String, String>;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// Only a failure to create the parent directory is an error. An
    /// unreadable or corrupt file is logged and reads as empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;

        let store = Self {
            path,
            dir,
            write_lock: Mutex::new(()),
        };
        debug!(path = %store.path.display(), keys = store.load().len(), "Opened file store");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Entries {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<Entries>(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Storage file is corrupt, reading as empty");
                    Entries::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read storage file, reading as empty");
                Entries::new()
            }
        }
    }

    /// Write to a sibling temp file, then rename it over the store so readers
    /// never see a half-written file.
    fn persist(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut Entries) -> bool) {
        let _guard = self.write_lock.lock();
        let mut entries = self.load();
        if !change(&mut entries) {
            return;
        }
        if let Err(e) = self.persist(&entries) {
            warn!(path = %self.path.display(), error = %e, "Failed to write storage file");
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        });
    }

    fn remove(&self, key: &str) {
        self.update(|entries| entries.remove(key).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::{TokenPair, TokenStore};
    use crate::notifications::{NotificationCenter, NotificationKind, NotificationPayload, Unsupported};

    fn temp_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devsync").join("storage.json");
        (dir, path)
    }

    #[test]
    fn test_values_survive_reopen() {
        let (_dir, path) = temp_path();
        {
            let store = FileStore::open(&path).unwrap();
            store.set("access_token", "A1");
            store.set("refresh_token", "R1");
            store.remove("refresh_token");
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("access_token").as_deref(), Some("A1"));
        assert!(reopened.get("refresh_token").is_none());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let (_dir, path) = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.get("notifications").is_none());

        store.set("k", "v");
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_writes_from_another_store_are_visible() {
        let (_dir, path) = temp_path();
        let first = FileStore::open(&path).unwrap();
        let second = FileStore::open(&path).unwrap();

        first.set("access_token", "A1");
        assert_eq!(second.get("access_token").as_deref(), Some("A1"));

        second.set("notifications", "[]");
        first.remove("access_token");
        assert!(second.get("access_token").is_none());
        assert_eq!(first.get("notifications").as_deref(), Some("[]"));
    }

    #[test]
    fn test_logout_elsewhere_is_not_reverted() {
        let (_dir, path) = temp_path();
        let cli: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
        let tokens = TokenStore::new(cli);
        tokens.set_tokens(&TokenPair {
            access: "A1".to_string(),
            refresh: "R1".to_string(),
        });

        let watcher: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
        let center = NotificationCenter::load(watcher, Arc::new(Unsupported));

        tokens.clear_tokens();
        center.add(NotificationPayload::new(NotificationKind::Success, "Build finished", "main is green"));

        let fresh = FileStore::open(&path).unwrap();
        assert!(fresh.get("access_token").is_none());
        assert!(fresh.get("refresh_token").is_none());
        assert!(fresh.get("notifications").is_some());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (_dir, path) = temp_path();
        let store = FileStore::open(&path).unwrap();
        store.set("a", "1");
        store.set("b", "2");

        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("storage.json")]);
    }
}
