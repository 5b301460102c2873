//! Page mapping storage backed by one JSON file per workspace.

use msf_editor::{MappingStorage, StorageError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key/value entries kept as a single JSON object on disk
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStorage {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

impl MappingStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msf_editor::PageMappingIndex;
    use msf_parser::generate;

    #[test]
    fn test_mappings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pages.json");
        let id = generate().to_string();

        let mut storage = JsonFileStorage::open(&path).unwrap();
        let mut index = PageMappingIndex::new();
        index.set(&id, 9);
        assert!(index.persist(&mut storage, "/docs/34401A.msf"));
        assert!(path.exists());

        let reopened = JsonFileStorage::open(&path).unwrap();
        let mut restored = PageMappingIndex::new();
        assert!(restored.load_persisted(&reopened, "/docs/34401A.msf"));
        assert_eq!(restored.get(&id), Some(9));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(JsonFileStorage::open(&path), Err(StorageError::Json(_))));
    }
}
