//! JSON output formatting

use basso_fmt::{IndexFile, MappingFile};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Summary of a written index
#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub status: &'static str,
    pub output_file: String,
    pub total_resources: usize,
    pub by_type: BTreeMap<String, usize>,
    pub with_ocr: usize,
    pub with_mp3: usize,
    pub warnings: usize,
    pub processing_time_seconds: f64,
}

impl IndexSummary {
    pub fn new(index: &IndexFile, output: &Path, warnings: usize, elapsed: Duration) -> Self {
        Self {
            status: "success",
            output_file: output.display().to_string(),
            total_resources: index.metadata.total_resources,
            by_type: index.metadata.by_type.clone(),
            with_ocr: index.metadata.with_ocr,
            with_mp3: index.metadata.with_mp3,
            warnings,
            processing_time_seconds: elapsed.as_secs_f64(),
        }
    }
}

/// Summary of a matching run
#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub status: &'static str,
    pub mp3_index_file: String,
    pub mapping_file: String,
    pub total_mp3: usize,
    pub total_exercises: usize,
    pub matched: usize,
    pub match_rate: String,
}

impl MatchSummary {
    pub fn new(mapping: &MappingFile, mp3_index: &Path, mapping_path: &Path) -> Self {
        Self {
            status: "success",
            mp3_index_file: mp3_index.display().to_string(),
            mapping_file: mapping_path.display().to_string(),
            total_mp3: mapping.metadata.total_mp3,
            total_exercises: mapping.metadata.total_exercises,
            matched: mapping.metadata.matched,
            match_rate: mapping.metadata.match_rate.clone(),
        }
    }
}

/// Print any summary as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing summary: {}", e),
    }
}
