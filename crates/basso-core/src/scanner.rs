//! Site directory scanner
//!
//! Walks the site root once and sorts what it finds into scanned pages,
//! audio tracks and index documents. Traversal is sorted by file name so
//! repeated runs see files in the same order.

use crate::config::ScanConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Directory scan errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A document name pattern is not a valid glob
    #[error("Invalid document pattern: {0}")]
    InvalidPattern(#[from] globset::Error),
}

/// A file found by the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated
    pub relative: String,
    pub size_bytes: u64,
}

/// Everything the scan found
#[derive(Debug, Clone, Default)]
pub struct ScanInventory {
    pub images: Vec<ScannedFile>,
    pub audio: Vec<ScannedFile>,
    pub documents: Vec<ScannedFile>,
    /// Entries that could not be read
    pub errors: Vec<String>,
}

pub struct SiteScanner {
    config: ScanConfig,
    /// Compiled `document_names`, matched against file names
    document_names: GlobSet,
    excluded: Vec<PathBuf>,
}

impl SiteScanner {
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        let document_names = config
            .document_names
            .iter()
            .map(|pattern| Glob::new(pattern))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .fold(&mut GlobSetBuilder::new(), |builder, glob| builder.add(glob))
            .build()?;

        Ok(Self {
            config: config.clone(),
            document_names,
            excluded: Vec::new(),
        })
    }

    /// Never report these files (the run's own output and cache)
    pub fn exclude(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.excluded
            .extend(paths.into_iter().map(|p| p.canonicalize().unwrap_or(p)));
        self
    }

    /// Walk `root` and classify every file
    pub fn scan(&self, root: &Path) -> Result<ScanInventory, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut inventory = ScanInventory::default();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_ignored(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Error accessing entry: {}", e);
                    inventory.errors.push(e.to_string());
                    continue;
                }
            };
            if !entry.file_type().is_file() || self.is_excluded(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            let file = ScannedFile {
                path: entry.path().to_path_buf(),
                relative,
                size_bytes,
            };

            let extension = extension_of(entry.path());
            if has_extension(&self.config.image_extensions, &extension) {
                inventory.images.push(file);
            } else if has_extension(&self.config.audio_extensions, &extension) {
                inventory.audio.push(file);
            } else if extension == "json" && self.is_document(entry.path()) {
                inventory.documents.push(file);
            }
        }

        log::info!(
            "Scanned {}: {} images, {} audio files, {} documents",
            root.display(),
            inventory.images.len(),
            inventory.audio.len(),
            inventory.documents.len()
        );
        Ok(inventory)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        self.config.ignore_patterns.iter().any(|p| *p == name)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.excluded.contains(&path)
    }

    /// Index documents are recognised by file name, or by living in a
    /// versioned export folder
    fn is_document(&self, path: &Path) -> bool {
        if path
            .file_name()
            .map_or(false, |name| self.document_names.is_match(name))
        {
            return true;
        }

        let parent = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.config
            .document_dir_suffixes
            .iter()
            .any(|suffix| parent.ends_with(suffix.as_str()))
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn has_extension(extensions: &[String], extension: &str) -> bool {
    extensions.iter().any(|e| e.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "Base de connaissances/Methodes/Funk/page_002.png", b"png");
        touch(root, "Base de connaissances/Methodes/Funk/page_001.PNG", b"png");
        touch(root, "Base de connaissances/Methodes/Funk/songs_index.json", b"{}");
        touch(root, "Base de connaissances/MP3/Funk MP3/Track 01.mp3", b"id3");
        touch(root, "Export_v4.0/anything.json", b"[]");
        touch(root, "search_index_v3.json", b"{}");
        touch(root, "package.json", b"{}");
        touch(root, ".git/objects/x.png", b"png");
        touch(root, "node_modules/lib/readme.mp3", b"id3");
        dir
    }

    #[test]
    fn test_missing_root() {
        let scanner = SiteScanner::new(&ScanConfig::default()).unwrap();
        assert!(matches!(
            scanner.scan(Path::new("/nonexistent/site")),
            Err(ScanError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();
        let scanner = SiteScanner::new(&ScanConfig::default()).unwrap();
        assert!(matches!(scanner.scan(&file), Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn test_classifies_files() {
        let dir = site();
        let inventory = SiteScanner::new(&ScanConfig::default()).unwrap().scan(dir.path()).unwrap();

        let images: Vec<&str> = inventory.images.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(
            images,
            vec![
                "Base de connaissances/Methodes/Funk/page_001.PNG",
                "Base de connaissances/Methodes/Funk/page_002.png",
            ]
        );
        assert_eq!(inventory.audio.len(), 1);
        assert_eq!(inventory.audio[0].size_bytes, 3);

        let documents: Vec<&str> = inventory.documents.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(
            documents,
            vec![
                "Base de connaissances/Methodes/Funk/songs_index.json",
                "Export_v4.0/anything.json",
                "search_index_v3.json",
            ]
        );
    }

    #[test]
    fn test_excluded_files_are_skipped() {
        let dir = site();
        let output = dir.path().join("search_index_v3.json");
        let inventory = SiteScanner::new(&ScanConfig::default())
            .unwrap()
            .exclude(vec![output])
            .scan(dir.path())
            .unwrap();
        assert!(inventory
            .documents
            .iter()
            .all(|f| f.relative != "search_index_v3.json"));
    }

    #[test]
    fn test_document_name_globs() {
        let config = ScanConfig {
            document_names: vec![
                "search_index*.json".to_string(),
                "Pratique.json".to_string(),
                "*_ocr_*.json".to_string(),
            ],
            document_dir_suffixes: Vec::new(),
            ..Default::default()
        };
        let scanner = SiteScanner::new(&config).unwrap();

        assert!(scanner.is_document(Path::new("site/search_index.json")));
        assert!(scanner.is_document(Path::new("site/search_index_v5.json")));
        assert!(!scanner.is_document(Path::new("site/search_index.js")));
        assert!(scanner.is_document(Path::new("Pratique.json")));
        assert!(!scanner.is_document(Path::new("pratique.json")));
        // More than one wildcard
        assert!(scanner.is_document(Path::new("assets_ocr_index.json")));
        assert!(!scanner.is_document(Path::new("assets_index.json")));
    }

    #[test]
    fn test_invalid_document_pattern() {
        let config = ScanConfig {
            document_names: vec!["search_index[.json".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            SiteScanner::new(&config),
            Err(ScanError::InvalidPattern(_))
        ));
    }
}
