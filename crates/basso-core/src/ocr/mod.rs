//! OCR backends
//!
//! The OCR engine is a black box turning an image into text. Backends also
//! report the title (top) and footer (bottom) regions of the page when they
//! can, since titles and page numbers are read from those.

mod sidecar;
mod tesseract;

pub use sidecar::SidecarOcr;
pub use tesseract::{parse_tsv, TesseractCli};

use crate::config::{OcrBackend, OcrConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// OCR errors
#[derive(Debug, Error)]
pub enum OcrError {
    /// The backend cannot run at all (missing binary, bad install)
    #[error("OCR backend unavailable: {0}")]
    Unavailable(String),

    /// Recognition failed for one image
    #[error("OCR failed for {path}: {message}")]
    Failed { path: PathBuf, message: String },
}

/// Text recognised on one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrText {
    pub full: String,
    pub top: Option<String>,
    pub bottom: Option<String>,
}

impl OcrText {
    /// Text with no region information
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            full: text.into(),
            top: None,
            bottom: None,
        }
    }

    /// Title region, or the whole page when unknown
    pub fn top_or_full(&self) -> &str {
        self.top.as_deref().unwrap_or(&self.full)
    }

    /// Footer region, or the whole page when unknown
    pub fn bottom_or_full(&self) -> &str {
        self.bottom.as_deref().unwrap_or(&self.full)
    }

    pub fn is_blank(&self) -> bool {
        self.full.trim().is_empty()
    }

    /// First `max_chars` characters of the full text
    pub fn excerpt(&self, max_chars: usize) -> String {
        self.full.trim().chars().take(max_chars).collect()
    }
}

/// An image-to-text engine
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fails when the backend cannot be used at all
    fn check_available(&self) -> Result<(), OcrError>;

    /// Recognise the text of one image
    fn recognize(&self, image: &Path) -> Result<OcrText, OcrError>;
}

/// Build the backend selected in the configuration
pub fn engine_from_config(config: &OcrConfig) -> Box<dyn OcrEngine> {
    match config.backend {
        OcrBackend::Tesseract => Box::new(TesseractCli::new(config)),
        OcrBackend::Sidecar => Box::new(SidecarOcr::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_fallbacks() {
        let plain = OcrText::plain("So What\nKey: D");
        assert_eq!(plain.top_or_full(), "So What\nKey: D");
        assert_eq!(plain.bottom_or_full(), "So What\nKey: D");

        let regions = OcrText {
            full: "So What\nKey: D\n12".to_string(),
            top: Some("So What".to_string()),
            bottom: Some("12".to_string()),
        };
        assert_eq!(regions.top_or_full(), "So What");
        assert_eq!(regions.bottom_or_full(), "12");
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let text = OcrText::plain("  Étude n°1 pour basse  ");
        assert_eq!(text.excerpt(7), "Étude n");
        assert!(OcrText::plain(" \n ").is_blank());
    }

    #[test]
    fn test_engine_selection() {
        let mut config = OcrConfig::default();
        assert_eq!(engine_from_config(&config).name(), "tesseract");
        config.backend = OcrBackend::Sidecar;
        assert_eq!(engine_from_config(&config).name(), "sidecar");
    }
}
