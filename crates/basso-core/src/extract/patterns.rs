//! Pattern tables for field extraction

use once_cell::sync::Lazy;
use regex::Regex;

fn compile<S: AsRef<str>>(patterns: &[S]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p.as_ref()).unwrap())
        .collect()
}

/// Title line patterns, tried in order against each candidate line
pub static TITLE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        // Numbered exercise
        r"(?i)^(?:exercise|exercice|track|pattern|étude|etude|study)\s*(?:n[°o]\.?\s*)?[#\d]+",
        // Leading number
        r"^\d+[.:\-\s]",
        // Style keyword
        r"(?i)walking|slap|funk|jazz|blues|rock|disco|latin",
        // Title Case, one to five words
        r"^[A-Z][a-z']+(?:\s+[A-Z][a-z']+){0,4}$",
    ])
});

/// Composer name patterns, tried after the known-composer table. Names
/// never span lines; the bare `by` is case-sensitive so `Stand By Me` is a
/// title, not a credit.
pub static COMPOSER: Lazy<Vec<Regex>> = Lazy::new(|| {
    const NAME: &str = r"([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){0,2})";
    compile(&[
        format!(r"\b(?i:composed?[ \t]+by)[ \t]+{}", NAME),
        format!(r"\b(?i:music[ \t]+by)[ \t]+{}", NAME),
        format!(r"\b(?i:arr)\.?[ \t]+{}", NAME),
        format!(r"\bby[ \t]+{}", NAME),
    ])
});

/// Well-known composers, lower case
pub const KNOWN_COMPOSERS: &[&str] = &[
    "james brown",
    "stevie wonder",
    "herbie hancock",
    "miles davis",
    "john coltrane",
    "charlie parker",
    "dizzy gillespie",
    "thelonious monk",
    "bill evans",
    "oscar peterson",
    "ray brown",
    "paul chambers",
    "jaco pastorius",
    "marcus miller",
    "victor wooten",
    "james jamerson",
    "bootsy collins",
    "larry graham",
    "bernard edwards",
    "carol kaye",
    "george benson",
    "wes montgomery",
    "joe pass",
    "pat metheny",
];

/// Canonical technique tag and the substrings that reveal it
pub const TECHNIQUES: &[(&str, &[&str])] = &[
    ("slap", &["slap", "thumb", "pop", "percussive"]),
    ("walking", &["walking", "walk", "swing"]),
    ("ghost notes", &["ghost", "dead note", "muted"]),
    ("hammer-on", &["hammer", "pull-off", "legato"]),
    ("tapping", &["tap", "tapping", "two-hand"]),
    ("fingerstyle", &["fingerstyle", "finger", "pizz"]),
    ("pick", &["pick", "plectrum", "médiator"]),
    ("funk", &["funk", "funky", "groove"]),
    ("jazz", &["jazz", "bebop", "swing"]),
    ("rock", &["rock", "heavy", "metal"]),
    ("latin", &["latin", "bossa", "samba", "salsa"]),
    ("blues", &["blues", "shuffle"]),
    ("modal", &["modal", "dorian", "phrygian", "lydian", "mixolydian"]),
];

/// Key patterns; group 1 is the key letter with its accidental
pub static KEY: Lazy<Vec<Regex>> = Lazy::new(|| {
    const NOTE: &str = r"([A-G][b#]?)(?:\s*(?:(?i:maj(?:or)?|min(?:or)?)|m|M))?(?:[^\w#]|$)";
    compile(&[
        format!(r"\b(?i:key)\s*(?:(?i:of)\s*)?:?\s*{}", NOTE),
        format!(r"\b(?i:in)\s+{}", NOTE),
        format!(r"(?:^|[^\w#]){}", NOTE),
    ])
});

/// A key as written on a score
pub static VALID_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-G][b#]?$").unwrap());

/// Tempo patterns; group 1 is the BPM value
pub static TEMPO: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"♩\s*=\s*(\d+)",
        r"(?i)tempo\s*:?\s*(\d+)",
        r"(?i)bpm\s*:?\s*(\d+)",
        r"(?i)(\d+)\s*bpm",
    ])
});

/// Page or track number embedded in a file name
pub static FILENAME_PAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^\p{L}])(?:track|page|pg|p)[-_.\s]*(\d+)").unwrap()
});

/// Page number patterns for the footer text
pub static TEXT_PAGE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\bpage\s*[:\-]?\s*(\d+)",
        r"(?i)\bp\.\s*(\d+)",
        r"(?i)\btrack\s+(\d+)",
    ])
});
