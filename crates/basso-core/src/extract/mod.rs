//! Field extraction from OCR text
//!
//! Turns the text of one scanned page into a `FieldRecord`. Every field is
//! found with an ordered list of patterns where the first hit wins, so the
//! order of the tables in `patterns` is part of the behaviour.

mod patterns;


use crate::config::ScoringWeights;
use crate::ocr::OcrText;
use crate::scoring::ConfidenceScorer;
use basso_fmt::FieldRecord;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::path::Path;

pub use patterns::{KNOWN_COMPOSERS, TECHNIQUES};

/// Plausible tempo range; anything else is OCR noise
pub const TEMPO_RANGE: RangeInclusive<u32> = 40..=240;
/// Plausible page or track number range
pub const PAGE_RANGE: RangeInclusive<u32> = 1..=9999;

/// Number of leading lines considered for the title
const TITLE_LINES: usize = 3;

/// Extracts structured fields from OCR text and scores the result
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    scorer: ConfidenceScorer,
}

impl FieldExtractor {
    pub fn new(weights: &ScoringWeights) -> Self {
        Self {
            scorer: ConfidenceScorer::new(weights),
        }
    }

    /// Extract every field from `text`.
    ///
    /// The title comes from the top region, the page number from
    /// `filename_hint` first and from the bottom region otherwise; the other
    /// fields are searched in the full text.
    pub fn extract(&self, text: &OcrText, filename_hint: &str) -> FieldRecord {
        let mut record = FieldRecord {
            title: extract_title(text.top_or_full()),
            composer: extract_composer(&text.full),
            key: extract_key(&text.full),
            tempo: extract_tempo(&text.full),
            page: page_from_filename(filename_hint).or_else(|| page_from_text(text.bottom_or_full())),
            techniques: extract_techniques(&text.full),
            confidence: 0,
        };
        record.confidence = self.scorer.score(&record);
        record
    }

    /// `extract` with one string standing in for every region
    pub fn extract_str(&self, text: &str, filename_hint: &str) -> FieldRecord {
        self.extract(&OcrText::plain(text), filename_hint)
    }
}

/// First title-like line among the first few non-empty lines
pub fn extract_title(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TITLE_LINES)
        .collect();

    for line in &lines {
        if patterns::TITLE.iter().any(|re| re.is_match(line)) {
            return Some(line.to_string());
        }
    }

    // Fallback: first line with something readable on it
    lines
        .iter()
        .find(|line| line.chars().any(char::is_alphanumeric))
        .map(|line| line.to_string())
}

/// Known composer appearing first in the text, else a "by <Name>" capture
pub fn extract_composer(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let known = KNOWN_COMPOSERS
        .iter()
        .filter_map(|name| lower.find(name).map(|pos| (pos, *name)))
        .min_by_key(|(pos, _)| *pos);
    if let Some((_, name)) = known {
        return Some(title_case(name));
    }

    patterns::COMPOSER
        .iter()
        .find_map(|re| re.captures(text))
        .map(|caps| caps[1].to_string())
}

/// Every technique tag with at least one alias present in the text
pub fn extract_techniques(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    TECHNIQUES
        .iter()
        .filter(|(_, aliases)| aliases.iter().any(|alias| lower.contains(alias)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

pub fn extract_key(text: &str) -> Option<String> {
    patterns::KEY.iter().find_map(|re| {
        re.captures_iter(text)
            .map(|caps| caps[1].to_string())
            .find(|key| patterns::VALID_KEY.is_match(key))
    })
}

/// First tempo pattern whose first match falls in `TEMPO_RANGE`
pub fn extract_tempo(text: &str) -> Option<u32> {
    first_in_range(&patterns::TEMPO, text, &TEMPO_RANGE)
}

/// Page or track number from a file name such as `track_042.png` or `p.7`
pub fn page_from_filename(filename: &str) -> Option<u32> {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    patterns::FILENAME_PAGE
        .captures_iter(&name)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .find(|n| PAGE_RANGE.contains(n))
}

/// Page number printed in the text (`page 12`, `p. 12`, `track 12`)
pub fn page_from_text(text: &str) -> Option<u32> {
    first_in_range(&patterns::TEXT_PAGE, text, &PAGE_RANGE)
}

fn first_in_range(
    patterns: &[regex::Regex],
    text: &str,
    range: &RangeInclusive<u32>,
) -> Option<u32> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|n| range.contains(n))
    })
}

/// "miles davis" -> "Miles Davis"
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
