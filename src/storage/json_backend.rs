use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    errors::Result,
    utils::{
        paths::PathResolver,
        persistence::{ensure_dir, write_atomic},
    },
};

use super::KeyValueStore;

/// File-backed key-value store. The whole map is read on every access and
/// rewritten wholesale on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let base = PathResolver::resolve_base(root);
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::storage_file_in(&base),
        })
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), keys = entries.len(), "local storage written");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_survive_a_fresh_handle() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(Some(dir.path().to_path_buf())).unwrap();
        store.set("customChecklistItems", "[]").unwrap();
        store.set("entry:2025-01-02", "{}").unwrap();

        let reopened = JsonFileStore::new(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(
            reopened.get("customChecklistItems").unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(reopened.keys().unwrap().len(), 2);

        reopened.remove("entry:2025-01-02").unwrap();
        assert!(store.get("entry:2025-01-02").unwrap().is_none());
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::at_path(dir.path().join("absent.json"));
        assert!(store.get("anything").unwrap().is_none());
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::at_path(path);
        assert!(matches!(
            store.get("x"),
            Err(crate::errors::ChecklistError::Storage(_))
        ));
    }
}
