use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use crate::{PhysicalStore, Result};
use log::warn;

/// A physical store persisted to a single JSON file.
///
/// Entries are served from memory. Every mutation rewrites the file using an
/// atomic "write-then-rename" strategy, so a crash leaves either the old or the
/// new contents on disk, never a torn file.
pub struct FileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, creating its parent directory if needed.
    ///
    /// A missing file starts an empty store. An unreadable or malformed file is
    /// logged and also treated as empty; the next write replaces it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let data = load(&path);
        Ok(Self { path, data: RwLock::new(data) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, data: &BTreeMap<String, String>) -> Result<()> {
        let temp_path = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(data)?;

        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

fn load(path: &Path) -> BTreeMap<String, String> {
    if !path.exists() {
        return BTreeMap::new();
    }
    let content = match fs::read(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not read store file {:?}: {}", path, e);
            return BTreeMap::new();
        }
    };
    match serde_json::from_slice(&content) {
        Ok(d) => d,
        Err(e) => {
            warn!("Could not unmarshal store file {:?}: {}", path, e);
            BTreeMap::new()
        }
    }
}

impl PhysicalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let previous = data.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save(&data) {
            match previous {
                Some(old) => data.insert(key.to_string(), old),
                None => data.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let Some(old) = data.remove(key) else {
            return;
        };
        if let Err(e) = self.save(&data) {
            warn!("Failed to persist removal of {}: {}", key, e);
            data.insert(key.to_string(), old);
        }
    }

    fn clear(&self) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::take(&mut *data);
        if let Err(e) = self.save(&data) {
            warn!("Failed to persist clear of {:?}: {}", self.path, e);
            *data = previous;
        }
    }

    fn keys(&self) -> Vec<String> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("primary.json");

        let store = FileStore::open(&path).unwrap();
        store.set("app_user", "{\"name\":\"Alice\"}").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("app_user").as_deref(), Some("{\"name\":\"Alice\"}"));
    }

    #[test]
    fn test_atomic_rename() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("primary.json");

        let store = FileStore::open(&path).unwrap();
        store.set("k", "1").unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("primary.json.tmp").exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let store = FileStore::open(&path).unwrap();
        store.set("k", "1").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("primary.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.keys().is_empty());
        store.set("k", "2").unwrap();
        assert_eq!(FileStore::open(&path).unwrap().get("k").as_deref(), Some("2"));
    }

    #[test]
    fn test_failed_save_keeps_memory_and_disk_in_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("primary.json");

        let store = FileStore::open(&path).unwrap();
        store.set("app_token", "\"x\"").unwrap();
        store.set("app_other", "1").unwrap();

        // A directory in the way of the temp file makes every save fail.
        fs::create_dir(dir.path().join("primary.json.tmp")).unwrap();

        store.remove("app_token");
        assert_eq!(store.get("app_token").as_deref(), Some("\"x\""));

        store.clear();
        assert_eq!(store.keys(), vec!["app_other".to_string(), "app_token".to_string()]);

        assert!(store.set("app_new", "2").is_err());
        assert_eq!(store.get("app_new"), None);

        let on_disk = FileStore::open(&path).unwrap();
        assert_eq!(on_disk.keys(), store.keys());
    }

    #[test]
    fn test_remove_and_clear_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("primary.json");

        let store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a");
        assert_eq!(FileStore::open(&path).unwrap().keys(), vec!["b".to_string()]);

        store.clear();
        assert!(FileStore::open(&path).unwrap().keys().is_empty());
    }
}
