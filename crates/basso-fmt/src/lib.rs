//! On-disk JSON formats for the basso indexer
//!
//! Raw input documents, the merged search index, the incremental scan
//! cache and the MP3 index/mapping files all live here so every binary
//! reads and writes exactly the same shapes.

pub mod cache;
pub mod index;
pub mod mp3;
pub mod record;
pub mod shape;

pub use cache::{CacheEntry, ScanCacheFile, CACHE_VERSION};
pub use index::{IndexFile, IndexMetadata, Resource, ResourceKind, INDEX_VERSION};
pub use mp3::{AudioHints, MappingEntry, MappingFile, Mp3Entry, Mp3IndexFile, Mp3Method};
pub use record::{is_placeholder, FieldRecord};
pub use shape::{Collection, DocumentShape, RawDocument, ShapeEntry, ShapeError};
