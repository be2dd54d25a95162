//! Indexer configuration
//!
//! Everything that used to be a per-machine constant (site base URL, folder
//! names, OCR settings, scoring weights) is read from one TOML file and
//! handed to each component when it is constructed. Every section has
//! defaults, so an empty file (or no file) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BassoConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Published site
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Base URL every relative path is joined to
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://11drumboy11.github.io/Prof-de-basse-V2/".to_string()
}

/// Directory scan configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Folder holding one sub-folder of MP3s per method, relative to the root
    #[serde(default = "default_audio_root")]
    pub audio_root: String,
    /// Folder holding one sub-folder per method book, relative to the root
    #[serde(default = "default_methods_root")]
    pub methods_root: String,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,
    /// Path components that are never descended into
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    /// Index document file name globs (`search_index*.json`)
    #[serde(default = "default_document_names")]
    pub document_names: Vec<String>,
    /// Any `.json` file in a folder whose name ends with one of these is a document
    #[serde(default = "default_document_dir_suffixes")]
    pub document_dir_suffixes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            audio_root: default_audio_root(),
            methods_root: default_methods_root(),
            image_extensions: default_image_extensions(),
            audio_extensions: default_audio_extensions(),
            ignore_patterns: default_ignore_patterns(),
            document_names: default_document_names(),
            document_dir_suffixes: default_document_dir_suffixes(),
        }
    }
}

fn default_audio_root() -> String {
    "Base de connaissances/MP3".to_string()
}
fn default_methods_root() -> String {
    "Base de connaissances/Methodes".to_string()
}
fn default_image_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}
fn default_audio_extensions() -> Vec<String> {
    vec!["mp3".to_string()]
}
fn default_ignore_patterns() -> Vec<String> {
    [".git", ".github", "node_modules", "__pycache__", "search_system", ".DS_Store"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_document_names() -> Vec<String> {
    [
        "search_index*.json",
        "resources_index.json",
        "complete-resource-map.json",
        "songs_index.json",
        "master_index.json",
        "assets_ocr_index.json",
        "Pratique.json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_document_dir_suffixes() -> Vec<String> {
    vec!["_v4.0".to_string()]
}

/// OCR backend type
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// `tesseract` command line tool
    Tesseract,
    /// Pre-computed `<image>.txt` files next to each image
    Sidecar,
}

impl Default for OcrBackend {
    fn default() -> Self {
        OcrBackend::Tesseract
    }
}

/// OCR configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrConfig {
    #[serde(default)]
    pub backend: OcrBackend,
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: String,
    #[serde(default = "default_languages")]
    pub languages: String,
    /// Tesseract page segmentation mode
    #[serde(default = "default_psm")]
    pub psm: u8,
    /// Share of the page height treated as the title region
    #[serde(default = "default_top_fraction")]
    pub top_fraction: f32,
    /// Share of the page height treated as the footer (page number) region
    #[serde(default = "default_bottom_fraction")]
    pub bottom_fraction: f32,
    /// Characters of OCR text kept in the index
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackend::default(),
            tesseract_path: default_tesseract_path(),
            languages: default_languages(),
            psm: default_psm(),
            top_fraction: default_top_fraction(),
            bottom_fraction: default_bottom_fraction(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

fn default_tesseract_path() -> String {
    "tesseract".to_string()
}
fn default_languages() -> String {
    "eng+fra".to_string()
}
fn default_psm() -> u8 {
    6
}
fn default_top_fraction() -> f32 {
    0.20
}
fn default_bottom_fraction() -> f32 {
    0.10
}
fn default_excerpt_chars() -> usize {
    500
}

/// Field extraction configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub weights: ScoringWeights,
}

/// Points each extracted field contributes to the confidence score
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScoringWeights {
    #[serde(default = "default_title_weight")]
    pub title: u8,
    #[serde(default = "default_composer_weight")]
    pub composer: u8,
    #[serde(default = "default_key_weight")]
    pub key: u8,
    #[serde(default = "default_techniques_weight")]
    pub techniques: u8,
    #[serde(default)]
    pub tempo: u8,
    #[serde(default = "default_page_weight")]
    pub page: u8,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title: default_title_weight(),
            composer: default_composer_weight(),
            key: default_key_weight(),
            techniques: default_techniques_weight(),
            tempo: 0,
            page: default_page_weight(),
        }
    }
}

fn default_title_weight() -> u8 {
    40
}
fn default_composer_weight() -> u8 {
    20
}
fn default_key_weight() -> u8 {
    15
}
fn default_techniques_weight() -> u8 {
    15
}
fn default_page_weight() -> u8 {
    10
}

/// MP3 matching configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Minimum score for a pairing to be accepted
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: u32,
    /// Remove a candidate once it is assigned to an audio file
    #[serde(default)]
    pub exclusive: bool,
    /// Minimum score for pairing an MP3 folder with a method folder
    #[serde(default = "default_folder_threshold")]
    pub folder_threshold: u32,
    #[serde(default)]
    pub weights: MatchWeights,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            exclusive: false,
            folder_threshold: default_folder_threshold(),
            weights: MatchWeights::default(),
        }
    }
}

fn default_acceptance_threshold() -> u32 {
    40
}
fn default_folder_threshold() -> u32 {
    40
}

/// Points of the audio/page matching rubric
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MatchWeights {
    /// Track number appears as a number in the candidate title or id
    #[serde(default = "default_track_in_title")]
    pub track_in_title: u32,
    /// Candidate title reads `Pattern N` with N equal to the track number
    #[serde(default = "default_pattern_number")]
    pub pattern_number: u32,
    #[serde(default = "default_page_exact")]
    pub page_exact: u32,
    #[serde(default = "default_page_adjacent")]
    pub page_adjacent: u32,
    #[serde(default = "default_exercise_in_title")]
    pub exercise_in_title: u32,
    #[serde(default = "default_style")]
    pub style: u32,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            track_in_title: default_track_in_title(),
            pattern_number: default_pattern_number(),
            page_exact: default_page_exact(),
            page_adjacent: default_page_adjacent(),
            exercise_in_title: default_exercise_in_title(),
            style: default_style(),
        }
    }
}

fn default_track_in_title() -> u32 {
    30
}
fn default_pattern_number() -> u32 {
    50
}
fn default_page_exact() -> u32 {
    60
}
fn default_page_adjacent() -> u32 {
    40
}
fn default_exercise_in_title() -> u32 {
    50
}
fn default_style() -> u32 {
    20
}

impl BassoConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: BassoConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        let base = &self.site.base_url;
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            anyhow::bail!("site.base_url must be an http(s) URL, got {:?}", base);
        }
        if self.scan.image_extensions.is_empty() && self.scan.audio_extensions.is_empty() {
            anyhow::bail!("scan needs at least one image or audio extension");
        }
        let ocr = &self.ocr;
        if !(0.0..1.0).contains(&ocr.top_fraction) || !(0.0..1.0).contains(&ocr.bottom_fraction) {
            anyhow::bail!("ocr.top_fraction and ocr.bottom_fraction must be in [0, 1)");
        }
        if ocr.top_fraction + ocr.bottom_fraction > 1.0 {
            anyhow::bail!("ocr.top_fraction + ocr.bottom_fraction must not exceed 1");
        }
        if self.matching.acceptance_threshold == 0 {
            anyhow::bail!("matching.acceptance_threshold must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BassoConfig::default();
        config.validate().unwrap();
        assert_eq!(config.matching.acceptance_threshold, 40);
        assert!(!config.matching.exclusive);
        assert_eq!(config.ocr.backend, OcrBackend::Tesseract);
    }

    #[test]
    fn test_default_weights_sum_to_100() {
        let w = ScoringWeights::default();
        let sum = w.title as u32 + w.composer as u32 + w.key as u32 + w.techniques as u32
            + w.tempo as u32
            + w.page as u32;
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [site]
            base_url = "https://example.org/site/"

            [ocr]
            backend = "sidecar"

            [matching]
            exclusive = true

            [matching.weights]
            style = 25
        "#;

        let config: BassoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.site.base_url, "https://example.org/site/");
        assert_eq!(config.ocr.backend, OcrBackend::Sidecar);
        assert_eq!(config.ocr.languages, "eng+fra");
        assert!(config.matching.exclusive);
        assert_eq!(config.matching.weights.style, 25);
        assert_eq!(config.matching.weights.page_exact, 60);
        assert_eq!(config.scan.audio_root, "Base de connaissances/MP3");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: BassoConfig = toml::from_str("").unwrap();
        assert_eq!(config.extraction.weights, ScoringWeights::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let mut config = BassoConfig::default();
        config.site.base_url = "Prof-de-basse-V2/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_overlapping_regions() {
        let mut config = BassoConfig::default();
        config.ocr.top_fraction = 0.6;
        config.ocr.bottom_fraction = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basso.toml");
        std::fs::write(&path, "[matching]\nacceptance_threshold = 50\n").unwrap();

        let config = BassoConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.matching.acceptance_threshold, 50);

        assert!(BassoConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
