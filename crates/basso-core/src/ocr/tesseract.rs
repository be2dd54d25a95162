//! Tesseract command line backend
//!
//! Runs `tesseract <image> stdout ... tsv` once per image. The TSV output
//! carries a bounding box per word, which is enough to cut the page into
//! title and footer regions without a second OCR pass.

use super::{OcrEngine, OcrError, OcrText};
use crate::config::OcrConfig;
use std::path::Path;
use std::process::Command;

/// Tesseract invoked as an external process
pub struct TesseractCli {
    program: String,
    languages: String,
    psm: u8,
    top_fraction: f32,
    bottom_fraction: f32,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            program: config.tesseract_path.clone(),
            languages: config.languages.clone(),
            psm: config.psm,
            top_fraction: config.top_fraction,
            bottom_fraction: config.bottom_fraction,
        }
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn check_available(&self) -> Result<(), OcrError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| OcrError::Unavailable(format!("{}: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(OcrError::Unavailable(format!(
                "{} --version exited with {}",
                self.program, output.status
            )));
        }
        log::debug!(
            "Using {}",
            String::from_utf8_lossy(&output.stdout).lines().next().unwrap_or("tesseract")
        );
        Ok(())
    }

    fn recognize(&self, image: &Path) -> Result<OcrText, OcrError> {
        let failed = |message: String| OcrError::Failed {
            path: image.to_path_buf(),
            message,
        };

        let output = Command::new(&self.program)
            .arg(image)
            .arg("stdout")
            .args(["-l", self.languages.as_str()])
            .args(["--psm", self.psm.to_string().as_str()])
            .arg("tsv")
            .output()
            .map_err(|e| failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("exit {}: {}", output.status, stderr.trim())));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        Ok(parse_tsv(&tsv, self.top_fraction, self.bottom_fraction))
    }
}

/// One recognised line with its vertical extent in pixels
#[derive(Debug)]
struct Line {
    key: (u32, u32, u32, u32),
    top: u32,
    words: Vec<String>,
}

/// Rebuild page text and regions from tesseract TSV output.
///
/// Lines starting in the top `top_fraction` of the page form the title
/// region, lines starting in the bottom `bottom_fraction` the footer region.
/// Without a page-level row the regions are left unknown.
pub fn parse_tsv(tsv: &str, top_fraction: f32, bottom_fraction: f32) -> OcrText {
    let mut page_height: Option<u32> = None;
    let mut lines: Vec<Line> = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let num = |i: usize| cols[i].trim().parse::<u32>().ok();

        match cols[0] {
            "1" => {
                if page_height.is_none() {
                    page_height = num(9).filter(|h| *h > 0);
                }
            }
            "5" => {
                let text = cols[11].trim();
                let conf: f32 = cols[10].trim().parse().unwrap_or(-1.0);
                if text.is_empty() || conf < 0.0 {
                    continue;
                }
                let (Some(page), Some(block), Some(par), Some(line), Some(top)) =
                    (num(1), num(2), num(3), num(4), num(7))
                else {
                    continue;
                };
                let key = (page, block, par, line);
                match lines.last_mut() {
                    Some(current) if current.key == key => {
                        current.top = current.top.min(top);
                        current.words.push(text.to_string());
                    }
                    _ => lines.push(Line {
                        key,
                        top,
                        words: vec![text.to_string()],
                    }),
                }
            }
            _ => {}
        }
    }

    let join = |selected: &mut dyn Iterator<Item = &Line>| -> String {
        selected
            .map(|line| line.words.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let full = join(&mut lines.iter());
    let (top, bottom) = match page_height {
        Some(height) => {
            let top_limit = height as f32 * top_fraction;
            let bottom_limit = height as f32 * (1.0 - bottom_fraction);
            let top = join(&mut lines.iter().filter(|l| (l.top as f32) < top_limit));
            let bottom = join(&mut lines.iter().filter(|l| (l.top as f32) >= bottom_limit));
            (
                Some(top).filter(|t| !t.is_empty()),
                Some(bottom).filter(|b| !b.is_empty()),
            )
        }
        None => (None, None),
    };

    OcrText { full, top, bottom }
}
