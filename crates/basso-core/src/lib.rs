//! Basso Core - Site content indexer
//!
//! Scans a bass-method site for page images, MP3s and existing JSON
//! indexes; extracts musical metadata from page OCR, links audio tracks to
//! the exercises they accompany, and merges everything into one search
//! index with absolute URLs.

pub mod config;
pub mod extract;
pub mod folders;
pub mod hashing;
pub mod hints;
pub mod matching;
pub mod merge;
pub mod ocr;
pub mod pipeline;
pub mod resources;
pub mod scanner;
pub mod scoring;
pub mod site;
pub mod urls;

pub use config::BassoConfig;
pub use extract::FieldExtractor;
pub use matching::{ExerciseRecord, Match, MatchReport, ResourceMatcher};
pub use merge::{IndexMerger, MergeOutcome, MergeStats};
pub use ocr::{engine_from_config, OcrEngine, OcrError, OcrText};
pub use pipeline::{PipelineStats, ScanPipeline};
pub use resources::{AudioResource, ImageResource};
pub use scanner::{ScanError, ScanInventory, ScannedFile, SiteScanner};
pub use scoring::ConfidenceScorer;
pub use site::SiteIndexer;
pub use urls::SiteUrls;
