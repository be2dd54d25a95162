//! MP3 index and MP3-to-exercise mapping files

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Numbers and style keyword recovered from an audio file name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_track: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl AudioHints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One audio file in the MP3 index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mp3Entry {
    pub id: String,
    pub filename: String,
    pub path: String,
    pub url: String,
    pub size_bytes: u64,
    pub patterns: AudioHints,
}

/// All audio files of one method folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mp3Method {
    pub method_name: String,
    pub total_mp3: usize,
    pub mp3_files: Vec<Mp3Entry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mp3IndexMetadata {
    pub version: String,
    pub generated_at: String,
    pub total_mp3: usize,
}

/// `mp3_index.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mp3IndexFile {
    pub metadata: Mp3IndexMetadata,
    pub methods: BTreeMap<String, Mp3Method>,
}

impl Mp3IndexFile {
    pub fn new(methods: BTreeMap<String, Mp3Method>) -> Self {
        let total_mp3 = methods.values().map(|m| m.total_mp3).sum();
        Self {
            metadata: Mp3IndexMetadata {
                version: "1.0.0".to_string(),
                generated_at: chrono::Utc::now().to_rfc3339(),
                total_mp3,
            },
            methods,
        }
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json_str = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json_str)?;
        Ok(())
    }
}

/// One accepted MP3/exercise pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub exercise_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_page: Option<u32>,
    pub mp3_filename: String,
    pub mp3_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub score: u32,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingMetadata {
    pub version: String,
    pub generated_at: String,
    pub total_mp3: usize,
    pub total_exercises: usize,
    pub matched: usize,
    pub match_rate: String,
}

/// `mp3_mapping.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingFile {
    pub metadata: MappingMetadata,
    pub mappings: Vec<MappingEntry>,
    /// Paths of audio files without an accepted match
    pub unmatched: Vec<String>,
}

impl MappingFile {
    pub fn new(
        mappings: Vec<MappingEntry>,
        unmatched: Vec<String>,
        total_mp3: usize,
        total_exercises: usize,
    ) -> Self {
        let matched = mappings.len();
        let rate = matched as f64 / total_mp3.max(1) as f64 * 100.0;
        Self {
            metadata: MappingMetadata {
                version: "2.0.0".to_string(),
                generated_at: chrono::Utc::now().to_rfc3339(),
                total_mp3,
                total_exercises,
                matched,
                match_rate: format!("{:.1}%", rate),
            },
            mappings,
            unmatched,
        }
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json_str = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_rate() {
        let entry = MappingEntry {
            exercise_id: "Funk_001".to_string(),
            exercise_title: Some("Pattern 1".to_string()),
            exercise_page: Some(12),
            mp3_filename: "Track 01.mp3".to_string(),
            mp3_url: "https://example.org/Track%2001.mp3".to_string(),
            method: Some("Funk".to_string()),
            score: 80,
            confidence: 0.8,
        };
        let file = MappingFile::new(vec![entry], vec!["MP3/Funk/Track 02.mp3".to_string()], 4, 10);
        assert_eq!(file.metadata.matched, 1);
        assert_eq!(file.metadata.match_rate, "25.0%");
    }

    #[test]
    fn test_no_audio_rate() {
        let file = MappingFile::new(Vec::new(), Vec::new(), 0, 0);
        assert_eq!(file.metadata.match_rate, "0.0%");
    }

    #[test]
    fn test_index_totals() {
        let mut methods = BTreeMap::new();
        methods.insert(
            "Funk".to_string(),
            Mp3Method {
                method_name: "Funk".to_string(),
                total_mp3: 3,
                mp3_files: Vec::new(),
            },
        );
        let index = Mp3IndexFile::new(methods);
        assert_eq!(index.metadata.total_mp3, 3);
    }

    #[test]
    fn test_empty_hints_serialize_to_empty_object() {
        let hints = AudioHints::default();
        assert!(hints.is_empty());
        assert_eq!(serde_json::to_string(&hints).unwrap(), "{}");
    }
}
