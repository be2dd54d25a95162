//! Extracted page metadata

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Titles and values that older index generators wrote when nothing was
/// found. They carry no information and are read back as absent.
const PLACEHOLDERS: &[&str] = &["sans titre", "unknown", "untitled", "undefined", "null", "none"];

/// True when `value` is empty or one of the known placeholder strings
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// Structured metadata extracted from the OCR text of one scanned page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Tempo in BPM, always within 40..=240
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<u32>,
    /// Page or track number, filename-derived when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub techniques: BTreeSet<String>,
    /// Confidence score (0-100)
    #[serde(default)]
    pub confidence: u8,
}

impl FieldRecord {
    /// True when no field at all was extracted
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.composer.is_none()
            && self.key.is_none()
            && self.tempo.is_none()
            && self.page.is_none()
            && self.techniques.is_empty()
    }
}
