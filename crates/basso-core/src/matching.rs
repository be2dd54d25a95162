//! Audio to exercise matching
//!
//! Pairs each audio track with the exercise page it most likely belongs to.
//! Scores come from a fixed rubric over filename hints and page records;
//! the best candidate wins if it clears the acceptance threshold.

use crate::config::{MatchWeights, MatchingConfig};
use crate::resources::{AudioResource, ImageResource};
use basso_fmt::{AudioHints, MappingEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;


static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static PATTERN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)pattern\s*(\d+)").unwrap());

/// A page that audio can be matched to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default)]
    pub techniques: BTreeSet<String>,
    /// Absolute URL of the page, used to attach the matched audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Method folder the exercise belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl ExerciseRecord {
    /// Candidate built from a scanned page
    pub fn from_image(image: &ImageResource, url: Option<String>, method: Option<String>) -> Self {
        Self {
            id: image.path.clone(),
            title: image.record.title.clone(),
            page: image.record.page,
            techniques: image.record.techniques.clone(),
            url,
            method,
        }
    }
}

/// An accepted pairing
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub audio: &'a AudioResource,
    pub candidate: &'a ExerciseRecord,
    pub score: u32,
    /// `score / 100`, capped at 1
    pub confidence: f64,
}

impl Match<'_> {
    /// Method folder context: the candidate's, else the audio file's
    pub fn method(&self) -> Option<&str> {
        self.candidate
            .method
            .as_deref()
            .or(self.audio.method_folder.as_deref())
    }

    pub fn to_mapping_entry(&self) -> MappingEntry {
        MappingEntry {
            exercise_id: self.candidate.id.clone(),
            exercise_title: self.candidate.title.clone(),
            exercise_page: self.candidate.page,
            mp3_filename: self.audio.filename.clone(),
            mp3_url: self.audio.url.clone(),
            method: self.method().map(str::to_string),
            score: self.score,
            confidence: self.confidence,
        }
    }
}

/// Result of one matching run
#[derive(Debug, Clone, Default)]
pub struct MatchReport<'a> {
    /// At most one match per audio resource, in audio input order
    pub matches: Vec<Match<'a>>,
    /// Audio resources whose best score stayed below the threshold
    pub unmatched: Vec<&'a AudioResource>,
}

impl<'a> MatchReport<'a> {
    pub fn extend(&mut self, other: MatchReport<'a>) {
        self.matches.extend(other.matches);
        self.unmatched.extend(other.unmatched);
    }

    pub fn match_rate(&self) -> f64 {
        let total = self.matches.len() + self.unmatched.len();
        if total == 0 {
            0.0
        } else {
            self.matches.len() as f64 / total as f64
        }
    }
}

/// Scores and assigns audio/page pairs
#[derive(Debug, Clone, Default)]
pub struct ResourceMatcher {
    config: MatchingConfig,
}

impl ResourceMatcher {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Rubric score of one audio/candidate pair
    pub fn score(&self, hints: &AudioHints, candidate: &ExerciseRecord) -> u32 {
        let w: &MatchWeights = &self.config.weights;
        let title = candidate.title.as_deref().unwrap_or("");
        let mut score = 0;

        if let Some(track) = hints.track {
            if contains_number(title, track) || contains_number(&candidate.id, track) {
                score += w.track_in_title;
            }
            let pattern = PATTERN_NUMBER
                .captures(title)
                .and_then(|caps| caps[1].parse::<u32>().ok());
            if pattern == Some(track) {
                score += w.pattern_number;
            }
        }

        if let (Some(page), Some(candidate_page)) = (hints.page, candidate.page) {
            if page == candidate_page {
                score += w.page_exact;
            } else if page.abs_diff(candidate_page) == 1 {
                score += w.page_adjacent;
            }
        }

        if let Some(exercise) = hints.exercise {
            if contains_number(title, exercise) {
                score += w.exercise_in_title;
            }
        }

        if let Some(style) = hints.style.as_deref() {
            let in_techniques = candidate.techniques.iter().any(|t| t.eq_ignore_ascii_case(style));
            if in_techniques || title.to_lowercase().contains(style) {
                score += w.style;
            }
        }

        score
    }

    /// Best candidate for one audio file and its score; first wins on ties
    fn best<'c>(
        &self,
        audio: &AudioResource,
        candidates: &[&'c ExerciseRecord],
    ) -> Option<(&'c ExerciseRecord, u32)> {
        let mut best: Option<(&'c ExerciseRecord, u32)> = None;
        for &candidate in candidates {
            let score = self.score(&audio.hints, candidate);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }
        best
    }

    /// Match every audio resource against the candidate set.
    ///
    /// Without `exclusive` each audio file picks its best candidate on its
    /// own, so two files may share a page. With `exclusive` pairs are
    /// assigned by descending score and an assigned page leaves the pool.
    pub fn match_resources<'a>(
        &self,
        audio: &'a [AudioResource],
        candidates: &'a [ExerciseRecord],
    ) -> MatchReport<'a> {
        let audio: Vec<&AudioResource> = audio.iter().collect();
        let candidates: Vec<&ExerciseRecord> = candidates.iter().collect();
        self.match_refs(&audio, &candidates)
    }

    /// `match_resources` over borrowed subsets, e.g. one method folder
    pub fn match_refs<'a>(
        &self,
        audio: &[&'a AudioResource],
        candidates: &[&'a ExerciseRecord],
    ) -> MatchReport<'a> {
        let threshold = self.config.acceptance_threshold;
        let mut assigned: Vec<Option<Match<'a>>> = vec![None; audio.len()];

        if self.config.exclusive {
            let mut pairs: Vec<(u32, usize, usize)> = Vec::new();
            for (a, resource) in audio.iter().enumerate() {
                for (c, candidate) in candidates.iter().enumerate() {
                    let score = self.score(&resource.hints, candidate);
                    if score >= threshold {
                        pairs.push((score, a, c));
                    }
                }
            }
            // Stable: equal scores keep audio order, then candidate order
            pairs.sort_by(|x, y| y.0.cmp(&x.0));

            let mut taken = vec![false; candidates.len()];
            for (score, a, c) in pairs {
                if assigned[a].is_some() || taken[c] {
                    continue;
                }
                taken[c] = true;
                assigned[a] = Some(Match {
                    audio: audio[a],
                    candidate: candidates[c],
                    score,
                    confidence: confidence(score),
                });
            }
        } else {
            for (a, &resource) in audio.iter().enumerate() {
                if let Some((candidate, score)) = self.best(resource, candidates) {
                    if score >= threshold {
                        assigned[a] = Some(Match {
                            audio: resource,
                            candidate,
                            score,
                            confidence: confidence(score),
                        });
                    }
                }
            }
        }

        let mut report = MatchReport::default();
        for (&resource, slot) in audio.iter().zip(assigned) {
            match slot {
                Some(m) => report.matches.push(m),
                None => {
                    log::debug!("No match for {}", resource.path);
                    report.unmatched.push(resource);
                }
            }
        }
        report
    }
}

fn confidence(score: u32) -> f64 {
    (score as f64 / 100.0).min(1.0)
}

/// True when `n` appears in `text` as a whole number (`"Pattern 07"` holds 7,
/// `"Exercise 17"` does not hold 7)
fn contains_number(text: &str, n: u32) -> bool {
    NUMBER
        .find_iter(text)
        .any(|m| m.as_str().parse::<u32>().ok() == Some(n))
}
