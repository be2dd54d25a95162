//! Input document shapes
//!
//! Index files written by earlier generations of the site tooling come in a
//! handful of layouts. A document is classified into exactly one known
//! shape before any record is read from it; anything else is
//! `ShapeError::Unknown`.

use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Document loading and classification errors
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Malformed JSON in {document}: {message}")]
    Malformed { document: String, message: String },

    #[error("Unrecognised document shape in {0}")]
    Unknown(String),
}

/// Collection a record was found in; used as a kind hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Resources,
    Songs,
    Exercises,
    Concepts,
}

/// A parsed input document and where it came from
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Name used in logs and in each resource's `sources` list
    pub name: String,
    /// Directory of the document relative to the site root, `/`-separated
    pub dir: Option<String>,
    pub value: Value,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, dir: Option<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            dir,
            value,
        }
    }

    /// Read and parse a document below `root`
    pub fn load(path: &Path, root: &Path) -> Result<Self, ShapeError> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let name = relative.to_string_lossy().replace('\\', "/");

        let text = std::fs::read_to_string(path).map_err(|e| ShapeError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| ShapeError::Malformed {
            document: name.clone(),
            message: e.to_string(),
        })?;

        let dir = relative
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .filter(|d| !d.is_empty());

        Ok(Self::new(name, dir, value))
    }

    /// Classify this document
    pub fn shape(&self) -> Result<DocumentShape<'_>, ShapeError> {
        DocumentShape::classify(&self.value).ok_or_else(|| ShapeError::Unknown(self.name.clone()))
    }
}

/// The closed set of known document layouts
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape<'a> {
    /// `{ "resources": [ ... ] }`
    Resources(&'a [Value]),
    /// `{ "resources": { "<id>": { ... } } }`
    ResourceMap(&'a Map<String, Value>),
    /// `{ "content": { "songs": [...], "exercises": [...], "concepts": [...] } }`
    Content {
        songs: &'a [Value],
        exercises: &'a [Value],
        concepts: &'a [Value],
    },
    /// `{ "songs": [ ... ] }`
    Songs(&'a [Value]),
    /// `[ ... ]`
    Flat(&'a [Value]),
}

/// One record of a classified document
#[derive(Debug, Clone, Copy)]
pub struct ShapeEntry<'a> {
    pub collection: Collection,
    /// Map key for keyed resource maps
    pub key: Option<&'a str>,
    pub value: &'a Value,
}

impl<'a> DocumentShape<'a> {
    /// Classify a parsed document.
    ///
    /// Precedence when several keys are present: `resources`, `content`,
    /// `songs`. A recognised key holding the wrong JSON type makes the
    /// document unknown rather than falling through to the next shape.
    pub fn classify(value: &'a Value) -> Option<Self> {
        let object = match value {
            Value::Array(items) => return Some(Self::Flat(items)),
            Value::Object(object) => object,
            _ => return None,
        };

        if let Some(resources) = object.get("resources") {
            return match resources {
                Value::Array(items) => Some(Self::Resources(items)),
                Value::Object(map) => Some(Self::ResourceMap(map)),
                _ => None,
            };
        }

        if let Some(content) = object.get("content") {
            let content = content.as_object()?;
            let mut found = false;
            let mut collection = |key: &str| -> Option<&'a [Value]> {
                match content.get(key) {
                    None => Some(&[][..]),
                    Some(Value::Array(items)) => {
                        found = true;
                        Some(items.as_slice())
                    }
                    Some(_) => None,
                }
            };
            let songs = collection("songs")?;
            let exercises = collection("exercises")?;
            let concepts = collection("concepts")?;
            return found.then_some(Self::Content {
                songs,
                exercises,
                concepts,
            });
        }

        if let Some(songs) = object.get("songs") {
            return songs.as_array().map(|items| Self::Songs(items));
        }

        None
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Resources(_) => "resources",
            Self::ResourceMap(_) => "resource-map",
            Self::Content { .. } => "content",
            Self::Songs(_) => "songs",
            Self::Flat(_) => "flat",
        }
    }

    /// All records of the document in document order
    pub fn entries(&self) -> Vec<ShapeEntry<'a>> {
        fn list<'a>(items: &'a [Value], collection: Collection) -> impl Iterator<Item = ShapeEntry<'a>> {
            items.iter().map(move |value| ShapeEntry {
                collection,
                key: None,
                value,
            })
        }

        match *self {
            Self::Resources(items) | Self::Flat(items) => list(items, Collection::Resources).collect(),
            Self::ResourceMap(map) => map
                .iter()
                .map(|(key, value)| ShapeEntry {
                    collection: Collection::Resources,
                    key: Some(key.as_str()),
                    value,
                })
                .collect(),
            Self::Content {
                songs,
                exercises,
                concepts,
            } => list(songs, Collection::Songs)
                .chain(list(exercises, Collection::Exercises))
                .chain(list(concepts, Collection::Concepts))
                .collect(),
            Self::Songs(items) => list(items, Collection::Songs).collect(),
        }
    }
}
