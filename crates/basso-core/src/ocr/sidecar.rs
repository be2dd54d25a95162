//! Pre-computed OCR text
//!
//! Reads `<image>.txt` next to each image (`page_001.png.txt`), falling back
//! to `<stem>.txt`. Optional `<image>.top.txt` and `<image>.bottom.txt` give
//! the title and footer regions. Useful when OCR ran elsewhere, and in tests.

use super::{OcrEngine, OcrError, OcrText};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct SidecarOcr;

impl SidecarOcr {
    pub fn new() -> Self {
        Self
    }

    fn with_suffix(image: &Path, suffix: &str) -> PathBuf {
        let mut name = image.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn read_optional(path: &Path) -> Result<Option<String>, OcrError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OcrError::Failed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
}

impl OcrEngine for SidecarOcr {
    fn name(&self) -> &'static str {
        "sidecar"
    }

    fn check_available(&self) -> Result<(), OcrError> {
        Ok(())
    }

    fn recognize(&self, image: &Path) -> Result<OcrText, OcrError> {
        let full = match Self::read_optional(&Self::with_suffix(image, ".txt"))? {
            Some(text) => text,
            None => Self::read_optional(&image.with_extension("txt"))?.ok_or_else(|| {
                OcrError::Failed {
                    path: image.to_path_buf(),
                    message: "no sidecar text file".to_string(),
                }
            })?,
        };

        Ok(OcrText {
            full,
            top: Self::read_optional(&Self::with_suffix(image, ".top.txt"))?,
            bottom: Self::read_optional(&Self::with_suffix(image, ".bottom.txt"))?,
        })
    }
}
