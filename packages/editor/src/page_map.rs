//! # Page Mapping
//!
//! Associates function identifiers with pages of the source datasheet.
//!
//! Explicit mappings win. Without one, a page is estimated from the
//! function's position: the first function is on page 1, later ones are
//! spread proportionally over a known page total, or spaced by a fixed span
//! when the total is unknown.
//!
//! Persistence goes through a [`MappingStorage`] supplied by the caller, keyed
//! by a digest of the document path. Storage failures are logged and treated
//! as "no mapping".

use crate::errors::StorageError;
use msf_parser::{get_document_id, is_valid};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Page span per function when the document's page total is unknown
pub const DEFAULT_PAGES_PER_FUNCTION: u32 = 2;

const STORAGE_KEY_PREFIX: &str = "msf-page-map-";

/// Key/value surface for persisted mappings
pub trait MappingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    pub entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MappingStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage key for the mappings of the document at `path`
pub fn storage_key(document_path: &str) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, get_document_id(document_path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMappingIndex {
    mappings: BTreeMap<String, u32>,
    pages_per_function: u32,
}

impl Default for PageMappingIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PageMappingIndex {
    pub fn new() -> Self {
        Self::with_pages_per_function(DEFAULT_PAGES_PER_FUNCTION)
    }

    pub fn with_pages_per_function(pages_per_function: u32) -> Self {
        Self {
            mappings: BTreeMap::new(),
            pages_per_function: pages_per_function.max(1),
        }
    }

    pub fn pages_per_function(&self) -> u32 {
        self.pages_per_function
    }

    /// Map `id` to `page`; malformed ids and pages below 1 are rejected
    pub fn set(&mut self, id: &str, page: i64) -> bool {
        if !is_valid(id) {
            warn!("ignoring page mapping for malformed identifier {:?}", id);
            return false;
        }
        let Some(page) = u32::try_from(page).ok().filter(|p| *p >= 1) else {
            warn!("ignoring page mapping {} for {}: page must be at least 1", page, id);
            return false;
        };

        self.mappings.insert(id.to_string(), page);
        true
    }

    pub fn get(&self, id: &str) -> Option<u32> {
        self.mappings.get(id).copied()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.mappings.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.mappings.clear();
    }

    pub fn get_all(&self) -> BTreeMap<String, u32> {
        self.mappings.clone()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Replace every mapping with `mappings`; invalid entries are skipped.
    /// Returns how many entries were accepted.
    pub fn load<I, K>(&mut self, mappings: I) -> usize
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        self.mappings.clear();
        mappings
            .into_iter()
            .filter(|(id, page)| self.set(id.as_ref(), *page))
            .count()
    }

    /// Estimated page of the function at `index` out of `count` functions
    pub fn estimate_page_number(&self, index: usize, count: usize, total_pages: Option<u32>) -> u32 {
        estimate_page_number(index, count, total_pages, self.pages_per_function)
    }

    /// Explicit mapping for `id` if present, otherwise the estimate
    pub fn resolve_page(&self, id: &str, index: usize, count: usize, total_pages: Option<u32>) -> u32 {
        self.get(id)
            .unwrap_or_else(|| self.estimate_page_number(index, count, total_pages))
    }

    pub fn persist(&self, storage: &mut dyn MappingStorage, document_path: &str) -> bool {
        let key = storage_key(document_path);
        let result = serde_json::to_string(&self.mappings)
            .map_err(StorageError::from)
            .and_then(|json| storage.set(&key, json));

        match result {
            Ok(()) => {
                debug!("persisted {} page mappings under {}", self.len(), key);
                true
            }
            Err(e) => {
                warn!("failed to persist page mappings for {}: {}", document_path, e);
                false
            }
        }
    }

    /// Replace current mappings with the persisted ones. Returns `false` and
    /// leaves the index untouched when nothing usable is stored.
    pub fn load_persisted(&mut self, storage: &dyn MappingStorage, document_path: &str) -> bool {
        let key = storage_key(document_path);
        let stored = storage.get(&key).and_then(|value| match value {
            Some(json) => Ok(Some(serde_json::from_str::<BTreeMap<String, i64>>(&json)?)),
            None => Ok(None),
        });

        match stored {
            Ok(Some(mappings)) => {
                let accepted = self.load(mappings);
                debug!("loaded {} page mappings from {}", accepted, key);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("failed to load page mappings for {}: {}", document_path, e);
                false
            }
        }
    }

    pub fn clear_persisted(storage: &mut dyn MappingStorage, document_path: &str) -> bool {
        match storage.remove(&storage_key(document_path)) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to clear page mappings for {}: {}", document_path, e);
                false
            }
        }
    }
}

/// Page estimate for the function at `index` of `count`.
///
/// Index 0 is always page 1. With a known total, pages are distributed
/// proportionally and never exceed the total; otherwise each function spans
/// `pages_per_function` pages.
pub fn estimate_page_number(
    index: usize,
    count: usize,
    total_pages: Option<u32>,
    pages_per_function: u32,
) -> u32 {
    if index == 0 {
        return 1;
    }

    match total_pages {
        Some(total) if total >= 1 && count > 0 => {
            let page = 1 + (index as u64 * total as u64) / count as u64;
            page.min(total as u64) as u32
        }
        _ => {
            let page = 1 + index as u64 * pages_per_function.max(1) as u64;
            page.min(u32::MAX as u64) as u32
        }
    }
}
