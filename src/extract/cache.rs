//! Derivation cache
//!
//! Content-addressed memoization of extraction results. The key covers only
//! the region fields that change what extraction produces, so renaming or
//! recoloring a region keeps its cached readings.
//!
//! The cache is advisory: every storage failure degrades to recomputation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::types::RegionDerivedPageNumber;
use crate::coords::ExtractionBox;
use crate::page_config::{PageConfigMode, Region};

/// Prefix of the storage key holding a project's cached readings
pub const STORAGE_KEY_PREFIX: &str = "region-page-numbers-";

// ============================================================
// Key-Value Storage
// ============================================================

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Persisted key-value storage backing the derivation cache
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Remove `key`; missing keys are not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Storage(format!("Lock error: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Storage(format!("Lock error: {}", e)))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Storage(format!("Lock error: {}", e)))?;
        entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Get the storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================
// Derivation Cache
// ============================================================

/// Stored cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPageNumbers {
    pub cache_key: String,
    pub results: Vec<RegionDerivedPageNumber>,
    pub timestamp: DateTime<Utc>,
}

/// Region fields that affect extraction output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyRegion<'a> {
    id: &'a str,
    bbox: &'a ExtractionBox,
    page_config_mode: PageConfigMode,
    page_number: Option<u32>,
    page_range: Option<&'a str>,
    every_other: bool,
    start_page: Option<u32>,
    end_page: Option<u32>,
    except_pages: Vec<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyPayload<'a> {
    project_id: &'a str,
    regions: Vec<KeyRegion<'a>>,
}

/// Cache of region-derived readings over an injected store
#[derive(Clone)]
pub struct DerivationCache {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for DerivationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationCache").finish_non_exhaustive()
    }
}

impl DerivationCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cache backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Stable hash of the extraction-relevant fields of every page-number region
    pub fn compute_key(project_id: &str, regions: &[Region]) -> String {
        let mut relevant: Vec<&Region> = regions.iter().filter(|r| r.is_page_number()).collect();
        relevant.sort_by(|a, b| a.id.cmp(&b.id));

        let payload = KeyPayload {
            project_id,
            regions: relevant
                .into_iter()
                .map(|r| {
                    let mut except_pages = r.except_pages.clone();
                    except_pages.sort_unstable();
                    KeyRegion {
                        id: &r.id,
                        bbox: &r.bbox,
                        page_config_mode: r.page_config_mode,
                        page_number: r.page_number,
                        page_range: r.page_range.as_deref(),
                        every_other: r.every_other,
                        start_page: r.start_page,
                        end_page: r.end_page,
                        except_pages,
                    }
                })
                .collect(),
        };

        let mut hasher = Sha256::new();
        // Serializing plain structs of strings and numbers cannot fail
        if let Ok(bytes) = serde_json::to_vec(&payload) {
            hasher.update(&bytes);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Storage key for a project's entry
    pub fn storage_key(project_id: &str) -> String {
        format!("{STORAGE_KEY_PREFIX}{project_id}")
    }

    /// Cached readings if the stored entry matches `cache_key`.
    ///
    /// Read failures and corrupt entries count as misses.
    pub fn lookup(&self, project_id: &str, cache_key: &str) -> Option<Vec<RegionDerivedPageNumber>> {
        let raw = match self.store.get(&Self::storage_key(project_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(project_id, error = %e, "Failed to read page number cache");
                return None;
            }
        };

        let cached: CachedPageNumbers = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(project_id, error = %e, "Discarding corrupt page number cache");
                return None;
            }
        };

        if cached.cache_key == cache_key {
            tracing::debug!(project_id, readings = cached.results.len(), "Page number cache hit");
            Some(cached.results)
        } else {
            tracing::debug!(project_id, "Page number cache is stale");
            None
        }
    }

    /// Store readings under `cache_key`; failures are logged and swallowed
    pub fn store(&self, project_id: &str, cache_key: &str, results: &[RegionDerivedPageNumber]) {
        let entry = CachedPageNumbers {
            cache_key: cache_key.to_string(),
            results: results.to_vec(),
            timestamp: Utc::now(),
        };

        let written = serde_json::to_string(&entry)
            .map_err(StoreError::from)
            .and_then(|json| self.store.set(&Self::storage_key(project_id), &json));

        if let Err(e) = written {
            tracing::warn!(project_id, error = %e, "Failed to write page number cache");
        }
    }

    /// Drop a project's entry; failures are logged and swallowed
    pub fn invalidate(&self, project_id: &str) {
        if let Err(e) = self.store.remove(&Self::storage_key(project_id)) {
            tracing::warn!(project_id, error = %e, "Failed to clear page number cache");
        }
    }
}
