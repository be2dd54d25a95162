//! Incremental scan cache
//!
//! Maps a scanned image's relative path to its content hash, the time it was
//! last scanned and what was extracted, so unchanged files skip OCR on the
//! next run.

use crate::record::FieldRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Current cache format version
pub const CACHE_VERSION: u32 = 1;

/// Cached result for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// SHA-256 of the file content (hex)
    pub hash: String,
    /// RFC 3339 timestamp of the scan
    pub scanned_at: String,
    /// Extracted fields; `None` when the scan produced no usable record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<FieldRecord>,
    /// Leading part of the OCR text kept for the search index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_excerpt: Option<String>,
}

/// Cache file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanCacheFile {
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,
}

impl Default for ScanCacheFile {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl ScanCacheFile {
    /// Cached entry for `path` if its content hash is unchanged
    pub fn fresh_entry(&self, path: &str, hash: &str) -> Option<&CacheEntry> {
        self.entries.get(path).filter(|entry| entry.hash == hash)
    }

    pub fn insert(&mut self, path: String, entry: CacheEntry) {
        self.entries.insert(path, entry);
    }

    /// Drop entries whose files no longer exist
    pub fn retain_paths<'a>(&mut self, live: impl IntoIterator<Item = &'a str>) {
        let live: std::collections::HashSet<&str> = live.into_iter().collect();
        self.entries.retain(|path, _| live.contains(path.as_str()));
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json_str = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json_str)?;
        Ok(())
    }

    /// Load from JSON file; a missing file is an empty cache
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json_str = std::fs::read_to_string(path)?;
        let cache: ScanCacheFile = serde_json::from_str(&json_str)?;
        if cache.version != CACHE_VERSION {
            anyhow::bail!(
                "Unsupported cache version {} in {} (expected {})",
                cache.version,
                path.display(),
                CACHE_VERSION
            );
        }
        Ok(cache)
    }
}
