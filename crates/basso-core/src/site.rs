//! Whole-site indexing
//!
//! Glue between the scanner, the OCR pipeline, the matcher and the merger:
//! turns a scan inventory into audio resources and match candidates, runs
//! folder-aware matching, and assembles the merged index.

use crate::config::BassoConfig;
use crate::folders::FolderMapper;
use crate::matching::{ExerciseRecord, Match, MatchReport, ResourceMatcher};
use crate::merge::{
    title_key, url_key, Fields, IndexMerger, MergeOutcome, PAGE_FIELDS, TECHNIQUE_FIELDS,
    TITLE_FIELDS, URL_FIELDS,
};
use crate::resources::{AudioResource, ImageResource};
use crate::scanner::ScannedFile;
use crate::urls::SiteUrls;
use basso_fmt::{Collection, MappingFile, Mp3IndexFile, Mp3Method, RawDocument, Resource, ScanCacheFile};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

pub struct SiteIndexer {
    config: BassoConfig,
    urls: SiteUrls,
}

impl SiteIndexer {
    pub fn new(config: &BassoConfig) -> Self {
        Self {
            urls: SiteUrls::new(&config.site.base_url),
            config: config.clone(),
        }
    }

    pub fn urls(&self) -> &SiteUrls {
        &self.urls
    }

    /// Method folder of a root-relative path: the first folder below the
    /// methods root
    pub fn method_of(&self, relative: &str) -> Option<String> {
        let root = self.config.scan.methods_root.trim_matches('/');
        let rest = relative.strip_prefix(root)?.strip_prefix('/')?;
        let (folder, _) = rest.split_once('/')?;
        (!folder.is_empty()).then(|| folder.to_string())
    }

    pub fn audio_resources(&self, files: &[ScannedFile]) -> Vec<AudioResource> {
        files
            .iter()
            .filter_map(|f| {
                AudioResource::from_path(&f.relative, &self.config.scan.audio_root, f.size_bytes, &self.urls)
            })
            .collect()
    }

    /// Parse every document; unreadable ones become warnings
    pub fn load_documents(&self, root: &Path, files: &[ScannedFile]) -> (Vec<RawDocument>, Vec<String>) {
        let mut documents = Vec::new();
        let mut warnings = Vec::new();
        for file in files {
            match RawDocument::load(&file.path, root) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    log::warn!("Skipping document: {}", e);
                    warnings.push(e.to_string());
                }
            }
        }
        (documents, warnings)
    }

    /// Pages restored from a scan cache, for runs that skip OCR
    pub fn images_from_cache(&self, cache: &ScanCacheFile) -> Vec<ImageResource> {
        cache
            .entries
            .iter()
            .filter_map(|(path, entry)| {
                entry.record.clone().map(|record| ImageResource {
                    path: path.clone(),
                    hash: entry.hash.clone(),
                    ocr: None,
                    ocr_excerpt: entry.ocr_excerpt.clone(),
                    record,
                    scanned_at: entry.scanned_at.clone(),
                })
            })
            .collect()
    }

    /// Match candidates: scanned pages below the methods root, then the
    /// `content.exercises` lists of method documents
    pub fn exercise_candidates(
        &self,
        images: &[ImageResource],
        documents: &[RawDocument],
    ) -> Vec<ExerciseRecord> {
        let mut candidates: Vec<ExerciseRecord> = images
            .iter()
            .filter_map(|image| {
                let method = self.method_of(&image.path)?;
                let url = self.urls.resolve(&image.path, None);
                Some(ExerciseRecord::from_image(image, url, Some(method)))
            })
            .collect();

        let mut numbering: HashMap<String, usize> = HashMap::new();
        for document in documents {
            let Some(dir) = document.dir.as_deref() else {
                continue;
            };
            let Some(method) = self.method_of(&format!("{}/", dir)) else {
                continue;
            };
            let Ok(shape) = document.shape() else {
                continue;
            };

            for entry in shape.entries() {
                if entry.collection != Collection::Exercises {
                    continue;
                }
                let counter = numbering.entry(method.clone()).or_insert(0);
                *counter += 1;
                candidates.push(self.exercise_from_value(entry.value, &method, *counter, dir));
            }
        }

        log::info!("{} match candidates", candidates.len());
        candidates
    }

    fn exercise_from_value(&self, value: &Value, method: &str, number: usize, dir: &str) -> ExerciseRecord {
        let empty = Map::new();
        let fields = Fields::new(value.as_object().unwrap_or(&empty));

        ExerciseRecord {
            id: fields
                .text(&["id"])
                .unwrap_or_else(|| format!("{}_{:03}", method, number)),
            title: fields.text(TITLE_FIELDS),
            page: fields.number(PAGE_FIELDS),
            techniques: fields.tags(TECHNIQUE_FIELDS),
            url: fields
                .text(URL_FIELDS)
                .and_then(|raw| self.urls.resolve(&raw, Some(dir))),
            method: Some(method.to_string()),
        }
    }

    /// Pair MP3 folders with method folders, then match inside each pair.
    /// Audio in a folder without a method counterpart is unmatched.
    pub fn match_audio<'a>(
        &self,
        audio: &'a [AudioResource],
        candidates: &'a [ExerciseRecord],
    ) -> MatchReport<'a> {
        let audio_folders = distinct(audio.iter().filter_map(|a| a.method_folder.as_deref()));
        let method_folders = distinct(candidates.iter().filter_map(|c| c.method.as_deref()));

        let mapper = FolderMapper::new(self.config.matching.folder_threshold);
        let pairs = mapper.map(&audio_folders, &method_folders);
        let matcher = ResourceMatcher::new(&self.config.matching);

        let mut report = MatchReport::default();
        let mut mapped: BTreeSet<&str> = BTreeSet::new();
        for pair in &pairs {
            mapped.insert(pair.audio_folder.as_str());
            let tracks: Vec<&AudioResource> = audio
                .iter()
                .filter(|a| a.method_folder.as_deref() == Some(pair.audio_folder.as_str()))
                .collect();
            let pages: Vec<&ExerciseRecord> = candidates
                .iter()
                .filter(|c| c.method.as_deref() == Some(pair.method_folder.as_str()))
                .collect();

            let folder_report = matcher.match_refs(&tracks, &pages);
            log::info!(
                "{} -> {}: {}/{} matched",
                pair.audio_folder,
                pair.method_folder,
                folder_report.matches.len(),
                tracks.len()
            );
            report.extend(folder_report);
        }

        report.unmatched.extend(audio.iter().filter(|a| {
            a.method_folder
                .as_deref()
                .map_or(true, |folder| !mapped.contains(folder))
        }));
        report
    }

    /// Merge scanned pages, audio tracks and documents into one index
    pub fn build_index(
        &self,
        images: &[ImageResource],
        audio: &[AudioResource],
        documents: &[RawDocument],
        matches: &[Match<'_>],
    ) -> MergeOutcome {
        let mut merger = IndexMerger::new(self.urls.clone());
        for image in images {
            match image.to_resource(&self.urls) {
                Some(resource) => merger.add_resource(resource),
                None => log::warn!("No URL for {}", image.path),
            }
        }
        for track in audio {
            merger.add_resource(track.to_resource());
        }
        for document in documents {
            merger.add_document(document);
        }

        let mut outcome = merger.finish();
        attach_matches(&mut outcome.resources, matches);
        outcome
    }
}

/// Method name of tracks directly under the audio root
pub const LOOSE_AUDIO: &str = "_root";

/// Audio grouped by method folder, numbered per folder
pub fn mp3_index(audio: &[AudioResource]) -> Mp3IndexFile {
    let mut methods: BTreeMap<String, Mp3Method> = BTreeMap::new();
    for track in audio {
        let name = track.method_folder.as_deref().unwrap_or(LOOSE_AUDIO);
        let method = methods.entry(name.to_string()).or_insert_with(|| Mp3Method {
            method_name: name.to_string(),
            total_mp3: 0,
            mp3_files: Vec::new(),
        });
        method.total_mp3 += 1;
        method.mp3_files.push(track.to_mp3_entry(method.total_mp3));
    }
    Mp3IndexFile::new(methods)
}

pub fn mapping_file(report: &MatchReport<'_>, total_exercises: usize) -> MappingFile {
    MappingFile::new(
        report.matches.iter().map(Match::to_mapping_entry).collect(),
        report.unmatched.iter().map(|a| a.path.clone()).collect(),
        report.matches.len() + report.unmatched.len(),
        total_exercises,
    )
}

/// Set `mp3_url` on every resource that was matched to audio. Candidates
/// are found by URL, by title and page when they have no URL, and by id
/// otherwise. When several tracks matched the same page, the best score wins.
pub fn attach_matches(resources: &mut [Resource], matches: &[Match<'_>]) {
    let mut best: HashMap<String, &Match<'_>> = HashMap::new();
    for m in matches {
        let key = candidate_key(m.candidate);
        match best.get(&key) {
            Some(current) if current.score >= m.score => {}
            _ => {
                best.insert(key, m);
            }
        }
    }

    for resource in resources.iter_mut().filter(|r| r.mp3_url.is_none()) {
        let found = resource_keys(resource)
            .into_iter()
            .find_map(|key| best.get(&key).copied());
        if let Some(m) = found {
            resource.mp3_url = Some(m.audio.url.clone());
            resource.mp3_confidence = Some(m.confidence);
        }
    }
}

fn candidate_key(candidate: &ExerciseRecord) -> String {
    if let Some(url) = &candidate.url {
        return url_key(url);
    }
    match &candidate.title {
        Some(title) => title_key(title, candidate.page),
        None => format!("id:{}", candidate.id),
    }
}

/// Keys a merged resource answers to, most specific first
fn resource_keys(resource: &Resource) -> Vec<String> {
    let mut keys = Vec::with_capacity(3);
    if let Some(url) = &resource.url {
        keys.push(url_key(url));
    }
    if let Some(title) = &resource.title {
        keys.push(title_key(title, resource.page));
    }
    keys.push(format!("id:{}", resource.id));
    keys
}

/// Unique values in first-seen order
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.iter().any(|s: &String| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use basso_fmt::{CacheEntry, FieldRecord, ResourceKind};
    use serde_json::json;

    fn indexer() -> SiteIndexer {
        let mut config = BassoConfig::default();
        config.site.base_url = "https://example.org/site/".to_string();
        config.scan.methods_root = "Methodes".to_string();
        config.scan.audio_root = "MP3".to_string();
        SiteIndexer::new(&config)
    }

    fn image(path: &str, title: &str, page: u32) -> ImageResource {
        ImageResource {
            path: path.to_string(),
            hash: "h".to_string(),
            ocr: None,
            ocr_excerpt: None,
            record: FieldRecord {
                title: Some(title.to_string()),
                page: Some(page),
                confidence: 50,
                ..Default::default()
            },
            scanned_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn track(indexer: &SiteIndexer, path: &str) -> AudioResource {
        AudioResource::from_path(path, "MP3", 10, indexer.urls()).unwrap()
    }

    #[test]
    fn test_method_of() {
        let indexer = indexer();
        assert_eq!(indexer.method_of("Methodes/Funk Bass/page_001.png").as_deref(), Some("Funk Bass"));
        assert_eq!(indexer.method_of("Methodes/page_001.png"), None);
        assert_eq!(indexer.method_of("Other/Funk/page_001.png"), None);
    }

    #[test]
    fn test_candidates_from_images_and_documents() {
        let indexer = indexer();
        let images = vec![
            image("Methodes/Funk Bass/page_003.png", "Pattern 3", 3),
            image("Loose/page_009.png", "Stray", 9),
        ];
        let documents = vec![RawDocument::new(
            "Methodes/Funk Bass/songs_index.json",
            Some("Methodes/Funk Bass".to_string()),
            json!({ "content": { "exercises": [
                { "title": "Pattern 4", "page": 4, "technique": "Slap, Funk", "file": "page_004.png" },
                { "title": "Pattern 5", "page": "5" }
            ]}}),
        )];

        let candidates = indexer.exercise_candidates(&images, &documents);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].id, "Methodes/Funk Bass/page_003.png");
        assert_eq!(candidates[1].id, "Funk Bass_001");
        assert_eq!(candidates[1].techniques.len(), 2);
        assert_eq!(
            candidates[1].url.as_deref(),
            Some("https://example.org/site/Methodes/Funk%20Bass/page_004.png")
        );
        assert_eq!(candidates[2].id, "Funk Bass_002");
        assert_eq!(candidates[2].page, Some(5));
    }

    #[test]
    fn test_matching_runs_per_folder_pair() {
        let indexer = indexer();
        let audio = vec![
            track(&indexer, "MP3/Funk_Bass_v1.0 MP3/Page 3.mp3"),
            track(&indexer, "MP3/Jazz Trio MP3/Page 3.mp3"),
            track(&indexer, "MP3/Loose.mp3"),
        ];
        let images = vec![
            image("Methodes/Funk Bass/page_003.png", "Groove", 3),
            image("Methodes/Latin Grooves/page_003.png", "Bossa", 3),
        ];
        let candidates = indexer.exercise_candidates(&images, &[]);

        let report = indexer.match_audio(&audio, &candidates);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].candidate.method.as_deref(), Some("Funk Bass"));
        assert_eq!(report.unmatched.len(), 2);
    }

    #[test]
    fn test_build_index_attaches_audio() {
        let indexer = indexer();
        let audio = vec![track(&indexer, "MP3/Funk Bass MP3/Page 3.mp3")];
        let images = vec![image("Methodes/Funk Bass/page_003.png", "Groove", 3)];
        let candidates = indexer.exercise_candidates(&images, &[]);
        let report = indexer.match_audio(&audio, &candidates);

        let outcome = indexer.build_index(&images, &audio, &[], &report.matches);
        assert_eq!(outcome.resources.len(), 2);

        let page = &outcome.resources[0];
        assert_eq!(page.kind, ResourceKind::Image);
        assert_eq!(
            page.mp3_url.as_deref(),
            Some("https://example.org/site/MP3/Funk%20Bass%20MP3/Page%203.mp3")
        );
        assert_eq!(page.mp3_confidence, Some(0.6));
        assert_eq!(outcome.resources[1].kind, ResourceKind::Mp3);
    }

    #[test]
    fn test_images_from_cache_skip_empty_records() {
        let mut cache = ScanCacheFile::default();
        cache.insert(
            "Methodes/Funk/page_001.png".to_string(),
            CacheEntry {
                hash: "a".to_string(),
                scanned_at: "t".to_string(),
                record: Some(FieldRecord {
                    title: Some("Groove".to_string()),
                    ..Default::default()
                }),
                ocr_excerpt: None,
            },
        );
        cache.insert(
            "Methodes/Funk/page_002.png".to_string(),
            CacheEntry {
                hash: "b".to_string(),
                scanned_at: "t".to_string(),
                record: None,
                ocr_excerpt: None,
            },
        );

        let images = indexer().images_from_cache(&cache);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].path, "Methodes/Funk/page_001.png");
    }

    #[test]
    fn test_mp3_index_numbers_per_folder() {
        let indexer = indexer();
        let audio = vec![
            track(&indexer, "MP3/Funk/Track 01.mp3"),
            track(&indexer, "MP3/Jazz/Track 01.mp3"),
            track(&indexer, "MP3/Funk/Track 02.mp3"),
            track(&indexer, "MP3/Intro.mp3"),
        ];

        let index = mp3_index(&audio);
        assert_eq!(index.methods["Funk"].total_mp3, 2);
        assert_eq!(index.methods["Funk"].mp3_files[1].id, "mp3_002");
        assert_eq!(index.methods["Jazz"].mp3_files[0].id, "mp3_001");
        assert_eq!(index.methods[LOOSE_AUDIO].mp3_files[0].filename, "Intro.mp3");
    }

    #[test]
    fn test_exercise_without_url_gets_its_audio() {
        let indexer = indexer();
        let audio = vec![track(&indexer, "MP3/Funk Bass MP3/Page 3.mp3")];
        let documents = vec![RawDocument::new(
            "Methodes/Funk Bass/songs_index.json",
            Some("Methodes/Funk Bass".to_string()),
            json!({ "content": { "exercises": [
                { "title": "Pattern 3", "page": 3 },
                { "title": "Pattern 9", "page": 9 }
            ]}}),
        )];
        let candidates = indexer.exercise_candidates(&[], &documents);
        let report = indexer.match_audio(&audio, &candidates);
        assert_eq!(report.matches.len(), 1);

        let outcome = indexer.build_index(&[], &audio, &documents, &report.matches);
        let exercise = outcome
            .resources
            .iter()
            .find(|r| r.title.as_deref() == Some("Pattern 3"))
            .unwrap();
        assert!(exercise.url.is_none());
        assert_eq!(
            exercise.mp3_url.as_deref(),
            Some("https://example.org/site/MP3/Funk%20Bass%20MP3/Page%203.mp3")
        );
        let other = outcome
            .resources
            .iter()
            .find(|r| r.title.as_deref() == Some("Pattern 9"))
            .unwrap();
        assert!(other.mp3_url.is_none());
    }

    #[test]
    fn test_candidate_url_aliases_follow_the_merger() {
        let indexer = indexer();
        let documents = vec![RawDocument::new(
            "Methodes/Funk Bass/songs_index.json",
            Some("Methodes/Funk Bass".to_string()),
            json!({ "content": { "exercises": [
                { "name": "Pattern 1", "page_url": "page_001.png", "metadata": { "page_number": 1 } },
                { "title": "Pattern 2", "path": "Methodes/Funk Bass/page_002.png", "styles": ["Funk"] }
            ]}}),
        )];

        let candidates = indexer.exercise_candidates(&[], &documents);
        assert_eq!(candidates[0].title.as_deref(), Some("Pattern 1"));
        assert_eq!(candidates[0].page, Some(1));
        assert_eq!(
            candidates[0].url.as_deref(),
            Some("https://example.org/site/Methodes/Funk%20Bass/page_001.png")
        );
        assert_eq!(
            candidates[1].url.as_deref(),
            Some("https://example.org/site/Methodes/Funk%20Bass/page_002.png")
        );
        assert!(candidates[1].techniques.contains("funk"));
    }
}
