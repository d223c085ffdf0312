//! Key/value configuration stores
//!
//! [`ConfigStore`] is the persistence seam for everything sandworm remembers
//! between runs. Values are plain strings keyed by dotted names such as
//! `claude.project_id`.

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Trait for key/value configuration storage
///
/// Implementations use interior mutability so a single store can be shared
/// between the transport (session refresh) and the sync logic.
pub trait ConfigStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Check if a value is stored under `key`
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Store several entries as one write.
    ///
    /// Either every entry is persisted or the call fails.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// In-memory store, used by tests and for throwaway sessions
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow!("config store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow!("config store lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk
///
/// Every mutation rewrites the whole file atomically. The in-memory copy is
/// only updated once the write succeeded, so a failed write leaves both the
/// file and the store unchanged.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            crate::load_json_file(&path)?
        } else {
            BTreeMap::new()
        };
        debug!("Opened config store {} ({} keys)", path.display(), values.len());

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Open a store file inside the sandworm config directory
    pub fn open_in_config_dir(filename: &str) -> Result<Self> {
        let dir = crate::ensure_config_dir()?;
        Self::open(dir.join(filename))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the values, persist it, then publish it
    fn update(&self, mutate: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow!("config store lock poisoned"))?;

        let mut next = values.clone();
        mutate(&mut next);
        if next == *values {
            return Ok(());
        }

        crate::save_json_file(&self.path, &next)
            .with_context(|| format!("Failed to save config store: {}", self.path.display()))?;
        *values = next;
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.update(|values| {
            for (key, value) in entries {
                values.insert(key.to_string(), value.to_string());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(!store.has("claude.project_id"));

        store.set("claude.project_id", "p1").unwrap();
        assert!(store.has("claude.project_id"));
        assert_eq!(store.get("claude.project_id").as_deref(), Some("p1"));

        store.delete("claude.project_id").unwrap();
        assert_eq!(store.get("claude.project_id"), None);

        // Deleting again is fine
        store.delete("claude.project_id").unwrap();
    }

    #[test]
    fn test_memory_store_with_entries() {
        let store = MemoryStore::with_entries([("a", "1"), ("b", "2")]);
        assert_eq!(store.get("a").as_deref(), Some("1"));
        assert_eq!(store.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path().join("absent.json")).unwrap();
        assert!(!store.has("anything"));
        // Opening alone must not create the file
        assert!(!store.path().exists());
    }

    #[test]
    fn test_json_store_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".sandworm.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("claude.organization_id", "org-1").unwrap();
            store
                .set_many(&[("claude.document_id", "doc-1"), ("claude.content_hash", "abc")])
                .unwrap();
            store.delete("claude.organization_id").unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("claude.organization_id"), None);
        assert_eq!(reopened.get("claude.document_id").as_deref(), Some("doc-1"));
        assert_eq!(reopened.get("claude.content_hash").as_deref(), Some("abc"));
    }

    #[test]
    fn test_json_store_failed_write_keeps_previous_state() {
        let tmp = TempDir::new().unwrap();
        // A directory in place of the file makes the rename fail
        let path = tmp.path().join("store.json");
        std::fs::create_dir(&path).unwrap();

        let store = JsonFileStore {
            path: path.clone(),
            values: RwLock::new(BTreeMap::new()),
        };

        assert!(store.set("claude.document_id", "doc-1").is_err());
        assert_eq!(store.get("claude.document_id"), None);
    }
}
