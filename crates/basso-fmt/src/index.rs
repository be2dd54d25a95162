//! Merged search index format
//!
//! `{ "metadata": {...}, "resources": [...] }` is the single file the site's
//! search page loads.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Current index format version
pub const INDEX_VERSION: &str = "5.0";

/// Kind of a merged resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Song,
    Exercise,
    Concept,
    Image,
    Mp3,
}

impl ResourceKind {
    /// Parse an explicit `type` value from an input document
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "song" | "songs" | "partition" => Some(Self::Song),
            "exercise" | "exercises" | "exercice" => Some(Self::Exercise),
            "concept" | "concepts" | "theory" => Some(Self::Concept),
            "image" | "page" | "png" | "jpg" | "jpeg" => Some(Self::Image),
            "mp3" | "audio" => Some(Self::Mp3),
            _ => None,
        }
    }

    /// Infer the kind from a file name or URL extension
    pub fn from_extension(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        let ext = lower.rsplit('.').next()?;
        match ext {
            "mp3" => Some(Self::Mp3),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Exercise => "exercise",
            Self::Concept => "concept",
            Self::Image => "image",
            Self::Mp3 => "mp3",
        }
    }
}

/// One normalized entry of the merged index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Absolute URL; absent only for records keyed by title and page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub techniques: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp3_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp3_confidence: Option<f64>,
    /// Documents (or scans) this entry was assembled from, first-seen order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default)]
    pub search_text: String,
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl Resource {
    /// Create an empty resource of the given kind
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            title: None,
            url: None,
            page: None,
            track: None,
            composer: None,
            key: None,
            tempo: None,
            techniques: BTreeSet::new(),
            book: None,
            category: None,
            difficulty: None,
            description: None,
            ocr_text: None,
            ocr_confidence: None,
            file_hash: None,
            mp3_url: None,
            mp3_confidence: None,
            sources: Vec::new(),
            search_text: String::new(),
        }
    }

    /// Fill this record's empty fields from a later duplicate.
    ///
    /// Fields already set are kept; technique tags and sources are unioned.
    pub fn fill_gaps(&mut self, other: Resource) {
        fill(&mut self.title, other.title);
        fill(&mut self.url, other.url);
        fill(&mut self.page, other.page);
        fill(&mut self.track, other.track);
        fill(&mut self.composer, other.composer);
        fill(&mut self.key, other.key);
        fill(&mut self.tempo, other.tempo);
        fill(&mut self.book, other.book);
        fill(&mut self.category, other.category);
        fill(&mut self.difficulty, other.difficulty);
        fill(&mut self.description, other.description);
        fill(&mut self.ocr_text, other.ocr_text);
        fill(&mut self.ocr_confidence, other.ocr_confidence);
        fill(&mut self.file_hash, other.file_hash);
        if self.mp3_url.is_none() {
            self.mp3_url = other.mp3_url;
            self.mp3_confidence = other.mp3_confidence;
        }
        self.techniques.extend(other.techniques);
        for source in other.sources {
            if !self.sources.contains(&source) {
                self.sources.push(source);
            }
        }
    }

    /// Rebuild the lower-cased text the site's search box matches against
    pub fn refresh_search_text(&mut self) {
        let mut parts: Vec<&str> = Vec::new();
        for field in [
            &self.title,
            &self.composer,
            &self.key,
            &self.book,
            &self.category,
            &self.difficulty,
            &self.description,
        ] {
            if let Some(value) = field {
                parts.push(value);
            }
        }
        parts.extend(self.techniques.iter().map(String::as_str));
        if let Some(ocr) = &self.ocr_text {
            parts.push(ocr);
        }

        let text = parts
            .iter()
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        self.search_text = text;
    }
}

/// Header of the merged index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub version: String,
    pub generated_at: String,
    pub total_resources: usize,
    pub by_type: BTreeMap<String, usize>,
    pub with_ocr: usize,
    pub with_mp3: usize,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Complete merged index file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFile {
    pub metadata: IndexMetadata,
    pub resources: Vec<Resource>,
}

impl IndexFile {
    /// Build an index file, computing the header statistics
    pub fn new(resources: Vec<Resource>, sources: Vec<String>) -> Self {
        let mut by_type = BTreeMap::new();
        for resource in &resources {
            *by_type.entry(resource.kind.as_str().to_string()).or_insert(0) += 1;
        }
        let with_ocr = resources.iter().filter(|r| r.ocr_confidence.is_some()).count();
        let with_mp3 = resources.iter().filter(|r| r.mp3_url.is_some()).count();

        Self {
            metadata: IndexMetadata {
                version: INDEX_VERSION.to_string(),
                generated_at: chrono::Utc::now().to_rfc3339(),
                total_resources: resources.len(),
                by_type,
                with_ocr,
                with_mp3,
                sources,
            },
            resources,
        }
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json_str = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json_str)?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json_str = std::fs::read_to_string(path)?;
        let index: IndexFile = serde_json::from_str(&json_str)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(ResourceKind::parse("Song"), Some(ResourceKind::Song));
        assert_eq!(ResourceKind::parse("exercises"), Some(ResourceKind::Exercise));
        assert_eq!(ResourceKind::parse("audio"), Some(ResourceKind::Mp3));
        assert_eq!(ResourceKind::parse("html"), None);
        assert_eq!(ResourceKind::from_extension("a/b/Track 01.MP3"), Some(ResourceKind::Mp3));
        assert_eq!(ResourceKind::from_extension("page_007.jpeg"), Some(ResourceKind::Image));
        assert_eq!(ResourceKind::from_extension("book.pdf"), None);
    }

    #[test]
    fn test_fill_gaps_keeps_existing_values() {
        let mut first = Resource::new("a", ResourceKind::Image);
        first.title = Some("So What".to_string());
        first.ocr_text = Some("so what by miles davis".to_string());
        first.techniques.insert("walking".to_string());
        first.sources.push("assets_ocr_index.json".to_string());

        let mut second = Resource::new("b", ResourceKind::Song);
        second.title = Some("Other".to_string());
        second.composer = Some("Miles Davis".to_string());
        second.techniques.insert("jazz".to_string());
        second.sources.push("songs_index.json".to_string());
        second.sources.push("assets_ocr_index.json".to_string());

        first.fill_gaps(second);

        assert_eq!(first.id, "a");
        assert_eq!(first.kind, ResourceKind::Image);
        assert_eq!(first.title.as_deref(), Some("So What"));
        assert_eq!(first.composer.as_deref(), Some("Miles Davis"));
        assert_eq!(first.techniques.len(), 2);
        assert_eq!(first.sources, vec!["assets_ocr_index.json", "songs_index.json"]);
    }

    #[test]
    fn test_search_text() {
        let mut resource = Resource::new("a", ResourceKind::Song);
        resource.title = Some("So  What".to_string());
        resource.composer = Some("Miles Davis".to_string());
        resource.techniques.insert("walking".to_string());
        resource.refresh_search_text();
        assert_eq!(resource.search_text, "so what miles davis walking");
    }

    #[test]
    fn test_index_statistics() {
        let mut image = Resource::new("a", ResourceKind::Image);
        image.ocr_confidence = Some(85);
        image.mp3_url = Some("https://example.org/a.mp3".to_string());
        let song = Resource::new("b", ResourceKind::Song);

        let index = IndexFile::new(vec![image, song], vec!["songs_index.json".to_string()]);
        assert_eq!(index.metadata.total_resources, 2);
        assert_eq!(index.metadata.by_type["image"], 1);
        assert_eq!(index.metadata.by_type["song"], 1);
        assert_eq!(index.metadata.with_ocr, 1);
        assert_eq!(index.metadata.with_mp3, 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("megasearch.json");

        let index = IndexFile::new(vec![Resource::new("a", ResourceKind::Mp3)], Vec::new());
        index.save(&path).unwrap();

        let loaded = IndexFile::load(&path).unwrap();
        assert_eq!(loaded, index);
    }
}
