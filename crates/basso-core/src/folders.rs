//! MP3 folder to method folder mapping
//!
//! Audio CDs and method books were uploaded under different folder names
//! (`Funk_Bass_v2.0 MP3` vs `Funk Bass`). Names are normalised and compared
//! word by word; shared numbers (`70s`, volume numbers) count extra.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"_v\d+\.\d+").unwrap());
static MP3_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+mp3").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_-]").unwrap());

const WORD_POINTS: u32 = 20;
const NUMBER_POINTS: u32 = 30;

/// Accepted folder pairing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPair {
    pub audio_folder: String,
    pub method_folder: String,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct FolderMapper {
    threshold: u32,
}

impl FolderMapper {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// `Funk_Bass_v2.0 MP3` -> `funk bass`
    pub fn normalize(name: &str) -> String {
        let name = VERSION.replace_all(name, "");
        let name = MP3_SUFFIX.replace_all(&name, "");
        let name = SEPARATORS.replace_all(&name, " ");
        name.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Similarity of two folder names
    pub fn score(&self, audio_folder: &str, method_folder: &str) -> u32 {
        let a = Self::normalize(audio_folder);
        let b = Self::normalize(method_folder);
        let a: BTreeSet<&str> = a.split(' ').filter(|w| !w.is_empty()).collect();
        let b: BTreeSet<&str> = b.split(' ').filter(|w| !w.is_empty()).collect();

        a.intersection(&b)
            .map(|word| {
                if word.chars().any(|c| c.is_ascii_digit()) {
                    WORD_POINTS + NUMBER_POINTS
                } else {
                    WORD_POINTS
                }
            })
            .sum()
    }

    /// Best method folder for each audio folder; first wins on ties
    pub fn map(&self, audio_folders: &[String], method_folders: &[String]) -> Vec<FolderPair> {
        let mut pairs = Vec::new();
        for audio in audio_folders {
            let mut best: Option<(&String, u32)> = None;
            for method in method_folders {
                let score = self.score(audio, method);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((method, score));
                }
            }

            match best {
                Some((method, score)) if score >= self.threshold => {
                    log::debug!("{} -> {} (score {})", audio, method, score);
                    pairs.push(FolderPair {
                        audio_folder: audio.clone(),
                        method_folder: method.clone(),
                        score,
                    });
                }
                _ => log::warn!("No method folder for MP3 folder {}", audio),
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(FolderMapper::normalize("Funk_Bass_v2.0 MP3"), "funk bass");
        assert_eq!(FolderMapper::normalize("70s-Disco  Grooves"), "70s disco grooves");
    }

    #[test]
    fn test_scores() {
        let mapper = FolderMapper::new(40);
        assert_eq!(mapper.score("Funk_Bass MP3", "Funk Bass"), 40);
        assert_eq!(mapper.score("70s Funk MP3", "Disco 70s"), 50);
        assert_eq!(mapper.score("Jazz MP3", "Funk Bass"), 0);
    }

    #[test]
    fn test_threshold() {
        let mapper = FolderMapper::new(40);
        let methods = vec!["Funk Bass".to_string(), "Jazz Standards".to_string()];

        let pairs = mapper.map(
            &["Funk_Bass_v1.0 MP3".to_string(), "Jazz Trio MP3".to_string()],
            &methods,
        );
        // One shared word (20) is not enough
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].audio_folder, "Funk_Bass_v1.0 MP3");
        assert_eq!(pairs[0].method_folder, "Funk Bass");
        assert_eq!(pairs[0].score, 40);
    }

    #[test]
    fn test_first_method_wins_ties() {
        let mapper = FolderMapper::new(40);
        let pairs = mapper.map(
            &["Funk Bass MP3".to_string()],
            &["Funk Bass Vol".to_string(), "Funk Bass".to_string()],
        );
        assert_eq!(pairs[0].method_folder, "Funk Bass Vol");
    }
}
