//! Scanned images and audio files

use crate::hints::audio_hints;
use crate::ocr::OcrText;
use crate::urls::SiteUrls;
use basso_fmt::{AudioHints, FieldRecord, Mp3Entry, Resource, ResourceKind};
use std::path::Path;

/// Source tag of resources produced by the OCR scan
pub const OCR_SOURCE: &str = "ocr-scan";
/// Source tag of resources produced by the audio scan
pub const AUDIO_SOURCE: &str = "audio-scan";

/// One scanned page with its extracted fields
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResource {
    /// Path relative to the site root, `/`-separated
    pub path: String,
    /// SHA-256 of the file content (hex)
    pub hash: String,
    /// OCR output; `None` when the record was restored from the cache
    pub ocr: Option<OcrText>,
    pub ocr_excerpt: Option<String>,
    pub record: FieldRecord,
    pub scanned_at: String,
}

impl ImageResource {
    /// Parent folder name, used as the book of the page
    pub fn folder(&self) -> Option<&str> {
        let mut parts = self.path.rsplit('/');
        parts.next();
        parts.next().filter(|p| !p.is_empty())
    }

    /// Index entry for this page; `None` when no URL can be built
    pub fn to_resource(&self, urls: &SiteUrls) -> Option<Resource> {
        let url = urls.resolve(&self.path, None)?;
        let record = &self.record;

        let mut resource = Resource::new(self.path.clone(), ResourceKind::Image);
        resource.url = Some(url);
        resource.title = record.title.clone();
        resource.composer = record.composer.clone();
        resource.key = record.key.clone();
        resource.tempo = record.tempo;
        resource.page = record.page;
        resource.techniques = record.techniques.clone();
        resource.book = self.folder().map(str::to_string);
        resource.ocr_text = self.ocr_excerpt.clone();
        resource.ocr_confidence = Some(record.confidence);
        resource.file_hash = Some(self.hash.clone());
        resource.sources.push(OCR_SOURCE.to_string());
        resource.refresh_search_text();
        Some(resource)
    }
}

/// One audio track found by the directory scan
#[derive(Debug, Clone, PartialEq)]
pub struct AudioResource {
    /// Path relative to the site root, `/`-separated
    pub path: String,
    pub filename: String,
    /// First folder below the audio root
    pub method_folder: Option<String>,
    pub url: String,
    pub size_bytes: u64,
    pub hints: AudioHints,
}

impl AudioResource {
    /// Build from a root-relative path.
    ///
    /// `audio_root` is the configured MP3 folder; the first folder below it
    /// names the method. Returns `None` when no URL can be built.
    pub fn from_path(path: &str, audio_root: &str, size_bytes: u64, urls: &SiteUrls) -> Option<Self> {
        let url = urls.resolve(path, None)?;
        let filename = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        let root = audio_root.trim_matches('/');
        let below = match path.strip_prefix(root) {
            Some(rest) if !root.is_empty() => rest.strip_prefix('/'),
            _ => Some(path),
        };
        let method_folder = below.and_then(|rest| {
            let (folder, remainder) = rest.split_once('/')?;
            (!folder.is_empty() && !remainder.is_empty()).then(|| folder.to_string())
        });

        Some(Self {
            path: path.to_string(),
            hints: audio_hints(&filename),
            filename,
            method_folder,
            url,
            size_bytes,
        })
    }

    /// File name without extension
    pub fn title(&self) -> String {
        Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone())
    }

    /// Index entry for this track
    pub fn to_resource(&self) -> Resource {
        let mut resource = Resource::new(self.path.clone(), ResourceKind::Mp3);
        resource.url = Some(self.url.clone());
        resource.title = Some(self.title());
        resource.page = self.hints.page;
        resource.track = self.hints.track.or(self.hints.disc_track);
        resource.techniques.extend(self.hints.style.clone());
        resource.book = self.method_folder.clone();
        resource.sources.push(AUDIO_SOURCE.to_string());
        resource.refresh_search_text();
        resource
    }

    /// Entry of the MP3 index; `number` is the 1-based position in its method
    pub fn to_mp3_entry(&self, number: usize) -> Mp3Entry {
        Mp3Entry {
            id: format!("mp3_{:03}", number),
            filename: self.filename.clone(),
            path: self.path.clone(),
            url: self.url.clone(),
            size_bytes: self.size_bytes,
            patterns: self.hints.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> SiteUrls {
        SiteUrls::new("https://example.org/site/")
    }

    #[test]
    fn test_audio_from_path() {
        let audio = AudioResource::from_path(
            "Base de connaissances/MP3/Funk Bass_v1.0 MP3/Track 04.mp3",
            "Base de connaissances/MP3",
            2048,
            &urls(),
        )
        .unwrap();

        assert_eq!(audio.filename, "Track 04.mp3");
        assert_eq!(audio.method_folder.as_deref(), Some("Funk Bass_v1.0 MP3"));
        assert_eq!(audio.hints.track, Some(4));
        assert_eq!(
            audio.url,
            "https://example.org/site/Base%20de%20connaissances/MP3/Funk%20Bass_v1.0%20MP3/Track%2004.mp3"
        );
        assert_eq!(audio.to_mp3_entry(7).id, "mp3_007");
    }

    #[test]
    fn test_audio_directly_in_root_has_no_method() {
        let audio = AudioResource::from_path("MP3/Intro.mp3", "MP3", 1, &urls()).unwrap();
        assert!(audio.method_folder.is_none());
        assert_eq!(audio.title(), "Intro");
    }

    #[test]
    fn test_audio_resource_entry() {
        let audio = AudioResource::from_path("MP3/Jazz/1-03 Walking Blues.mp3", "MP3", 1, &urls()).unwrap();
        let resource = audio.to_resource();
        assert_eq!(resource.kind, ResourceKind::Mp3);
        assert_eq!(resource.track, Some(3));
        assert_eq!(resource.book.as_deref(), Some("Jazz"));
        assert!(resource.techniques.contains("blues"));
        assert!(resource.search_text.contains("walking blues"));
    }

    #[test]
    fn test_image_resource_entry() {
        let image = ImageResource {
            path: "Methodes/Funk/page_012.png".to_string(),
            hash: "abc".to_string(),
            ocr: None,
            ocr_excerpt: Some("Funk Groove".to_string()),
            record: FieldRecord {
                title: Some("Funk Groove".to_string()),
                page: Some(12),
                confidence: 50,
                ..Default::default()
            },
            scanned_at: "2024-01-01T00:00:00+00:00".to_string(),
        };

        assert_eq!(image.folder(), Some("Funk"));
        let resource = image.to_resource(&urls()).unwrap();
        assert_eq!(resource.kind, ResourceKind::Image);
        assert_eq!(
            resource.url.as_deref(),
            Some("https://example.org/site/Methodes/Funk/page_012.png")
        );
        assert_eq!(resource.ocr_confidence, Some(50));
        assert_eq!(resource.sources, vec![OCR_SOURCE.to_string()]);
    }
}
