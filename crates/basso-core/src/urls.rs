//! Absolute URL construction
//!
//! Every URL in the index is built here from a path relative to the site
//! root. Paths that went through earlier tooling may already be absolute,
//! partially encoded, prefixed twice with the site folder or carry a
//! duplicated `Base de connaissances/` segment; all of these resolve to the
//! same URL as the clean path.

use basso_fmt::is_placeholder;

/// URL builder for one published site
#[derive(Debug, Clone)]
pub struct SiteUrls {
    /// Base URL without trailing slash
    base: String,
    /// Path segments of the base URL (`["Prof-de-basse-V2"]`)
    prefix: Vec<String>,
}

impl SiteUrls {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim().trim_end_matches('/').to_string();
        let path = base
            .split_once("://")
            .map(|(_, rest)| rest)
            .and_then(|rest| rest.split_once('/'))
            .map(|(_, path)| path)
            .unwrap_or("");
        let prefix = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect();
        Self { base, prefix }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Absolute URL for `path`.
    ///
    /// `doc_dir` is the directory of the document the path was read from;
    /// a bare file name is taken to live there. Returns `None` for
    /// placeholders and for paths with no segment left.
    pub fn resolve(&self, path: &str, doc_dir: Option<&str>) -> Option<String> {
        let path = path.trim();
        if is_placeholder(path) {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }

        let mut segments = split_segments(path);
        if segments.is_empty() {
            return None;
        }

        if segments.len() == 1 {
            if let Some(dir) = doc_dir {
                let mut joined = split_segments(dir);
                joined.append(&mut segments);
                segments = joined;
            }
        }

        if !self.prefix.is_empty() {
            while segments.len() > self.prefix.len() && segments.starts_with(&self.prefix) {
                segments.drain(..self.prefix.len());
            }
        }

        segments.dedup();

        let encoded: Vec<String> = segments.iter().map(|s| encode_segment(s)).collect();
        Some(format!("{}/{}", self.base, encoded.join("/")))
    }
}

/// Split a relative path into decoded segments, dropping `.` and empties
fn split_segments(path: &str) -> Vec<String> {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(decode_segment)
        .collect()
}

/// Undo the two encodings this module applies
fn decode_segment(segment: &str) -> String {
    segment.replace("%20", " ").replace("%26", "&")
}

/// Space and `&` only; `%` is left alone so encoded input stays as is
fn encode_segment(segment: &str) -> String {
    segment.replace(' ', "%20").replace('&', "%26")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://11drumboy11.github.io/Prof-de-basse-V2/";

    fn urls() -> SiteUrls {
        SiteUrls::new(BASE)
    }

    #[test]
    fn test_plain_relative_path() {
        assert_eq!(
            urls().resolve("Base de connaissances/Methodes/Funk & Soul/page 3.png", None),
            Some(
                "https://11drumboy11.github.io/Prof-de-basse-V2/Base%20de%20connaissances/Methodes/Funk%20%26%20Soul/page%203.png"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_absolute_urls_are_final() {
        let url = "https://example.org/a b.png";
        assert_eq!(urls().resolve(url, Some("x")), Some(url.to_string()));
    }

    #[test]
    fn test_placeholders_are_absent() {
        for value in ["", "  ", "undefined", "null"] {
            assert_eq!(urls().resolve(value, None), None, "{:?}", value);
        }
        assert_eq!(urls().resolve("./", None), None);
    }

    #[test]
    fn test_leading_dots_and_slashes() {
        let expected = urls().resolve("Methodes/a.png", None);
        assert_eq!(urls().resolve("./Methodes/a.png", None), expected);
        assert_eq!(urls().resolve("/Methodes/a.png", None), expected);
        assert_eq!(urls().resolve("Methodes\\a.png", None), expected);
    }

    #[test]
    fn test_no_double_prefix() {
        let expected = urls().resolve("Base de connaissances/a.png", None);
        assert_eq!(
            urls().resolve("Prof-de-basse-V2/Base de connaissances/a.png", None),
            expected
        );
        assert_eq!(
            urls().resolve("/Prof-de-basse-V2/Prof-de-basse-V2/Base de connaissances/a.png", None),
            expected
        );
    }

    #[test]
    fn test_duplicate_segments_collapse() {
        assert_eq!(
            urls().resolve("Base de connaissances/Base de connaissances/Methodes/a.png", None),
            urls().resolve("Base de connaissances/Methodes/a.png", None)
        );
    }

    #[test]
    fn test_no_double_encoding() {
        assert_eq!(
            urls().resolve("Base%20de%20connaissances/Funk%20%26%20Soul/a.png", None),
            urls().resolve("Base de connaissances/Funk & Soul/a.png", None)
        );
        // Other escapes pass through untouched
        let url = urls().resolve("Methodes/caf%C3%A9.png", None).unwrap();
        assert!(url.ends_with("/Methodes/caf%C3%A9.png"));
    }

    #[test]
    fn test_bare_filename_joins_document_dir() {
        assert_eq!(
            urls().resolve("page_003.png", Some("Base de connaissances/Methodes/Funk")),
            urls().resolve("Base de connaissances/Methodes/Funk/page_003.png", None)
        );
        // Paths with a directory are taken from the site root
        assert_eq!(
            urls().resolve("Methodes/page_003.png", Some("Other")),
            urls().resolve("Methodes/page_003.png", None)
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let once = urls()
            .resolve("./Prof-de-basse-V2/Base de connaissances/Funk & Soul/x.png", None)
            .unwrap();
        assert_eq!(urls().resolve(&once, None), Some(once.clone()));
        assert_eq!(once.matches("Prof-de-basse-V2").count(), 1);
        assert!(!once.contains("%25"));
        assert!(!once.contains("//Base"));
    }

    #[test]
    fn test_base_without_path() {
        let urls = SiteUrls::new("https://example.org");
        assert_eq!(urls.base(), "https://example.org");
        assert_eq!(
            urls.resolve("a b.mp3", None).as_deref(),
            Some("https://example.org/a%20b.mp3")
        );
    }
}
