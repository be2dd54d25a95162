//! Hints read from audio file names
//!
//! Method CDs name their tracks inconsistently (`Track 02.mp3`,
//! `123 Pg.67.mp3`, `1-05 Funk Groove.mp3`); whatever numbers and style
//! words can be recognised become `AudioHints` for the matcher.

use basso_fmt::AudioHints;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static TRACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)track\s*(\d+)").unwrap());
static PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(?:pg\.?|page)\s*(\d+)").unwrap());
static EXERCISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{2,3})\s+(?:Pg|Page)").unwrap());
static DISC_TRACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)-(\d+)").unwrap());

/// Style words, in priority order
pub const STYLES: &[&str] = &["funk", "blues", "jazz", "latin", "rock", "slap", "walking"];

/// Recognise hints in an audio file name (extension ignored)
pub fn audio_hints(filename: &str) -> AudioHints {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    let number = |re: &Regex, group: usize| -> Option<u32> {
        re.captures(&stem).and_then(|caps| caps[group].parse().ok())
    };

    let (disc, disc_track) = match DISC_TRACK.captures(&stem) {
        Some(caps) => (caps[1].parse().ok(), caps[2].parse().ok()),
        None => (None, None),
    };

    let lower = stem.to_lowercase();
    let style = STYLES
        .iter()
        .find(|style| lower.contains(*style))
        .map(|style| style.to_string());

    AudioHints {
        track: number(&TRACK, 1),
        page: number(&PAGE, 1),
        exercise: number(&EXERCISE, 1),
        disc,
        disc_track,
        style,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_hint() {
        let hints = audio_hints("Track 02.mp3");
        assert_eq!(hints.track, Some(2));
        assert!(hints.page.is_none());

        assert_eq!(audio_hints("track125.mp3").track, Some(125));
    }

    #[test]
    fn test_exercise_and_page() {
        let hints = audio_hints("123 Pg.67.mp3");
        assert_eq!(hints.exercise, Some(123));
        assert_eq!(hints.page, Some(67));

        let hints = audio_hints("Exercise 45 Page 12.mp3");
        assert_eq!(hints.exercise, Some(45));
        assert_eq!(hints.page, Some(12));
    }

    #[test]
    fn test_exercise_needs_two_or_three_digits() {
        assert!(audio_hints("1234 Pg.5.mp3").exercise.is_none());
        assert!(audio_hints("7 Pg.5.mp3").exercise.is_none());
    }

    #[test]
    fn test_disc_track_and_style() {
        let hints = audio_hints("1-05 Slap Funk Groove.mp3");
        assert_eq!(hints.disc, Some(1));
        assert_eq!(hints.disc_track, Some(5));
        // funk outranks slap
        assert_eq!(hints.style.as_deref(), Some("funk"));
    }

    #[test]
    fn test_no_hints() {
        assert!(audio_hints("Intro.mp3").is_empty());
    }
}
