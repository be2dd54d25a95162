//! Index merging
//!
//! Reads records out of every classified input document, normalises the
//! field names used by the various generations of index files, and folds
//! duplicates together. A record is identified by its absolute URL, by
//! title and page when it has no URL, and by its document-scoped id as a
//! last resort. Later duplicates only fill fields that are still empty.

use crate::urls::SiteUrls;
use basso_fmt::{is_placeholder, Collection, RawDocument, Resource, ResourceKind, ShapeEntry};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Field names a record's location is read from, in priority order
pub const URL_FIELDS: &[&str] = &["url", "page_url", "file", "path"];
pub const TITLE_FIELDS: &[&str] = &["title", "name"];
pub const PAGE_FIELDS: &[&str] = &["page", "page_number"];
pub const TECHNIQUE_FIELDS: &[&str] = &["techniques", "technique", "tags", "styles"];

/// Counters of one merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub documents: usize,
    pub skipped_documents: usize,
    pub records: usize,
    pub skipped_records: usize,
    pub duplicates: usize,
}

/// Result of a merge
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Deduplicated resources in first-seen order
    pub resources: Vec<Resource>,
    pub warnings: Vec<String>,
    /// Documents and scans that contributed, in order
    pub sources: Vec<String>,
    pub stats: MergeStats,
}

/// Accumulates resources from documents and scans
pub struct IndexMerger {
    urls: SiteUrls,
    resources: Vec<Resource>,
    keys: HashMap<String, usize>,
    warnings: Vec<String>,
    sources: Vec<String>,
    stats: MergeStats,
}

impl IndexMerger {
    pub fn new(urls: SiteUrls) -> Self {
        Self {
            urls,
            resources: Vec::new(),
            keys: HashMap::new(),
            warnings: Vec::new(),
            sources: Vec::new(),
            stats: MergeStats::default(),
        }
    }

    /// Merge a set of documents in order
    pub fn merge(mut self, documents: &[RawDocument]) -> MergeOutcome {
        for document in documents {
            self.add_document(document);
        }
        self.finish()
    }

    /// Add an already normalised resource, e.g. one produced by a scan
    pub fn add_resource(&mut self, resource: Resource) {
        for source in &resource.sources {
            self.note_source(source);
        }
        self.stats.records += 1;
        match merge_key(&resource, None) {
            Some(key) => self.insert(key, resource),
            None => self.skip_record(format!("resource {} has no usable key", resource.id)),
        }
    }

    /// Classify a document and add all of its records
    pub fn add_document(&mut self, document: &RawDocument) {
        let shape = match document.shape() {
            Ok(shape) => shape,
            Err(e) => {
                log::warn!("Skipping document: {}", e);
                self.warnings.push(e.to_string());
                self.stats.skipped_documents += 1;
                return;
            }
        };

        log::debug!("{}: {} document", document.name, shape.name());
        self.stats.documents += 1;
        self.note_source(&document.name);

        for (index, entry) in shape.entries().iter().enumerate() {
            self.stats.records += 1;
            match self.normalize(document, entry, index) {
                Ok(resource) => match merge_key(&resource, Some(&document.name)) {
                    Some(key) => self.insert(key, resource),
                    None => self.skip_record(format!(
                        "{} record {}: no URL, title or id",
                        document.name, index
                    )),
                },
                Err(reason) => {
                    self.skip_record(format!("{} record {}: {}", document.name, index, reason))
                }
            }
        }
    }

    /// Finish the merge and refresh every search text
    pub fn finish(mut self) -> MergeOutcome {
        for resource in &mut self.resources {
            resource.refresh_search_text();
        }
        log::info!(
            "Merged {} records from {} documents into {} resources ({} duplicates, {} skipped)",
            self.stats.records,
            self.stats.documents,
            self.resources.len(),
            self.stats.duplicates,
            self.stats.skipped_records
        );
        MergeOutcome {
            resources: self.resources,
            warnings: self.warnings,
            sources: self.sources,
            stats: self.stats,
        }
    }

    fn note_source(&mut self, source: &str) {
        if !self.sources.iter().any(|s| s == source) {
            self.sources.push(source.to_string());
        }
    }

    fn skip_record(&mut self, warning: String) {
        log::warn!("Skipping {}", warning);
        self.warnings.push(warning);
        self.stats.skipped_records += 1;
    }

    fn insert(&mut self, key: String, resource: Resource) {
        match self.keys.get(&key) {
            Some(&slot) => {
                self.stats.duplicates += 1;
                self.resources[slot].fill_gaps(resource);
            }
            None => {
                self.keys.insert(key, self.resources.len());
                self.resources.push(resource);
            }
        }
    }

    /// Turn one raw record into a `Resource`
    fn normalize(
        &self,
        document: &RawDocument,
        entry: &ShapeEntry<'_>,
        index: usize,
    ) -> Result<Resource, String> {
        let object = entry
            .value
            .as_object()
            .ok_or_else(|| "not an object".to_string())?;
        let fields = Fields::new(object);
        let doc_dir = document.dir.as_deref();

        let raw_url = fields.text(URL_FIELDS).or_else(|| {
            entry
                .key
                .filter(|k| !is_placeholder(k) && looks_like_path(k))
                .map(str::to_string)
        });
        let url = raw_url
            .as_deref()
            .and_then(|raw| self.urls.resolve(raw, doc_dir));

        let kind = fields
            .text(&["type"])
            .and_then(|t| ResourceKind::parse(&t))
            .or(match entry.collection {
                Collection::Songs => Some(ResourceKind::Song),
                Collection::Exercises => Some(ResourceKind::Exercise),
                Collection::Concepts => Some(ResourceKind::Concept),
                Collection::Resources => None,
            })
            .or_else(|| raw_url.as_deref().and_then(ResourceKind::from_extension))
            .ok_or_else(|| "cannot tell the resource type".to_string())?;

        let title = match kind {
            ResourceKind::Concept => fields.text(&["title", "concept", "name"]),
            _ => fields.text(TITLE_FIELDS),
        };
        let page = fields.number(PAGE_FIELDS);

        let id = fields
            .text(&["id"])
            .or_else(|| entry.key.map(str::to_string))
            .or_else(|| raw_url.clone())
            .unwrap_or_else(|| format!("{}#{}", document.name, index));

        let mut resource = Resource::new(id, kind);
        resource.url = url;
        resource.title = title;
        resource.page = page;
        resource.track = fields.number(&["track", "track_number"]);
        resource.composer = fields.text(&["composer", "artist"]);
        resource.key = fields.text(&["key", "tonalite"]);
        resource.tempo = fields.number(&["tempo", "bpm"]);
        resource.techniques = fields.tags(TECHNIQUE_FIELDS);
        resource.book = fields.text(&["book", "method", "methode"]);
        resource.category = fields.text(&["category", "categorie"]);
        resource.difficulty = fields.text(&["difficulty", "difficulte", "level"]);
        resource.description = fields.text(&["description"]);
        resource.ocr_text = fields.text(&["ocr_text", "ocr_raw"]);
        resource.ocr_confidence = fields.percent(&["ocr_confidence", "confidence"]);
        resource.file_hash = fields.text(&["file_hash", "hash"]);
        resource.mp3_url = fields
            .text(&["mp3_url", "mp3"])
            .and_then(|raw| self.urls.resolve(&raw, doc_dir));
        if resource.mp3_url.is_some() {
            resource.mp3_confidence = fields.float(&["mp3_confidence"]);
        }
        resource.sources.push(document.name.clone());
        Ok(resource)
    }
}

/// Deduplication key: URL, else title and page, else document-scoped id
fn merge_key(resource: &Resource, document: Option<&str>) -> Option<String> {
    if let Some(url) = &resource.url {
        return Some(url_key(url));
    }
    if let Some(title) = &resource.title {
        return Some(title_key(title, resource.page));
    }
    if resource.id.is_empty() {
        return None;
    }
    Some(format!("id:{}:{}", document.unwrap_or(""), resource.id))
}

pub fn url_key(url: &str) -> String {
    format!("url:{}", url)
}

/// Key of a record known only by title and page; case-insensitive
pub fn title_key(title: &str, page: Option<u32>) -> String {
    let page = page.map(|p| p.to_string()).unwrap_or_default();
    format!("title:{}|page:{}", title.trim().to_lowercase(), page)
}

/// Map keys are ids unless they look like a file location
fn looks_like_path(key: &str) -> bool {
    key.contains('/')
        || key.contains('\\')
        || ResourceKind::from_extension(key).is_some()
}

/// Field lookup over a record and its nested `metadata` object
pub(crate) struct Fields<'a> {
    top: &'a Map<String, Value>,
    nested: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(top: &'a Map<String, Value>) -> Self {
        Self {
            top,
            nested: top.get("metadata").and_then(Value::as_object),
        }
    }

    /// First alias present, top level before `metadata`
    fn find<T>(&self, names: &[&str], read: impl Fn(&Value) -> Option<T>) -> Option<T> {
        let lookup = |map: &Map<String, Value>| names.iter().find_map(|n| map.get(*n).and_then(&read));
        lookup(self.top).or_else(|| self.nested.and_then(lookup))
    }

    pub(crate) fn text(&self, names: &[&str]) -> Option<String> {
        self.find(names, |value| match value {
            Value::String(s) if !is_placeholder(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(crate) fn number(&self, names: &[&str]) -> Option<u32> {
        self.find(names, |value| match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    fn float(&self, names: &[&str]) -> Option<f64> {
        self.find(names, |value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// 0-100 value. Decimal values up to 1 (`0.85`, `1.0`) are fractions
    /// and scaled up; integers are taken as percentages.
    fn percent(&self, names: &[&str]) -> Option<u8> {
        let scale = |value: f64, decimal: bool| {
            if decimal && value <= 1.0 {
                value * 100.0
            } else {
                value
            }
        };
        let value = self.find(names, |value| match value {
            Value::Number(n) => n.as_f64().map(|f| scale(f, n.is_f64())),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| scale(f, s.contains('.'))),
            _ => None,
        })?;
        (0.0..=100.0).contains(&value).then(|| value.round() as u8)
    }

    /// Tags from an array of strings or a comma-separated string
    pub(crate) fn tags(&self, names: &[&str]) -> BTreeSet<String> {
        self.find(names, |value| {
            let tags: BTreeSet<String> = match value {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !is_placeholder(s))
                    .collect(),
                Value::String(s) => s
                    .split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !is_placeholder(t))
                    .collect(),
                _ => BTreeSet::new(),
            };
            (!tags.is_empty()).then_some(tags)
        })
        .unwrap_or_default()
    }
}
