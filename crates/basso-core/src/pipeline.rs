//! Batch OCR over scanned pages
//!
//! Hashes every image, reuses the cached record when the content is
//! unchanged, and runs OCR plus field extraction otherwise. Images are
//! processed on the rayon pool; the cache is the only shared state.

use crate::config::BassoConfig;
use crate::extract::FieldExtractor;
use crate::hashing::file_hash;
use crate::ocr::OcrEngine;
use crate::resources::ImageResource;
use crate::scanner::ScannedFile;
use basso_fmt::{CacheEntry, ScanCacheFile};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Counters of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Images sent to OCR
    pub scanned: usize,
    /// Images restored from the cache
    pub cached: usize,
    /// Images whose OCR (or hashing) failed
    pub failed: usize,
    /// Images with no usable text
    pub empty: usize,
}

#[derive(Default)]
struct Counters {
    scanned: AtomicUsize,
    cached: AtomicUsize,
    failed: AtomicUsize,
    empty: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            scanned: self.scanned.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
        }
    }
}

/// OCR and extraction over a batch of images
pub struct ScanPipeline<'e> {
    engine: &'e dyn OcrEngine,
    extractor: FieldExtractor,
    excerpt_chars: usize,
    force: bool,
}

impl<'e> ScanPipeline<'e> {
    pub fn new(engine: &'e dyn OcrEngine, config: &BassoConfig) -> Self {
        Self {
            engine,
            extractor: FieldExtractor::new(&config.extraction.weights),
            excerpt_chars: config.ocr.excerpt_chars,
            force: false,
        }
    }

    /// Ignore the cache and OCR every image
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Process `images`, returning the pages with a usable record in input
    /// order. Failures are logged and skipped.
    pub fn run(
        &self,
        images: &[ScannedFile],
        cache: &Mutex<ScanCacheFile>,
    ) -> (Vec<ImageResource>, PipelineStats) {
        let counters = Counters::default();

        let resources: Vec<ImageResource> = images
            .par_iter()
            .filter_map(|file| self.process(file, cache, &counters))
            .collect();

        let stats = counters.snapshot();
        log::info!(
            "OCR pipeline: {} scanned, {} cached, {} failed, {} empty",
            stats.scanned,
            stats.cached,
            stats.failed,
            stats.empty
        );
        (resources, stats)
    }

    fn process(
        &self,
        file: &ScannedFile,
        cache: &Mutex<ScanCacheFile>,
        counters: &Counters,
    ) -> Option<ImageResource> {
        let hash = match file_hash(&file.path) {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!("Failed to hash {}: {}", file.path.display(), e);
                Counters::bump(&counters.failed);
                return None;
            }
        };

        if !self.force {
            let cached = lock(cache).fresh_entry(&file.relative, &hash).cloned();
            if let Some(entry) = cached {
                log::debug!("Unchanged, using cache: {}", file.relative);
                Counters::bump(&counters.cached);
                return entry.record.map(|record| ImageResource {
                    path: file.relative.clone(),
                    hash,
                    ocr: None,
                    ocr_excerpt: entry.ocr_excerpt,
                    record,
                    scanned_at: entry.scanned_at,
                });
            }
        }

        Counters::bump(&counters.scanned);
        let text = match self.engine.recognize(&file.path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{}", e);
                Counters::bump(&counters.failed);
                return None;
            }
        };

        let scanned_at = chrono::Utc::now().to_rfc3339();
        let record = if text.is_blank() {
            None
        } else {
            Some(self.extractor.extract(&text, &file.relative)).filter(|r| !r.is_empty())
        };

        let Some(record) = record else {
            log::debug!("No usable text in {}", file.relative);
            Counters::bump(&counters.empty);
            lock(cache).insert(
                file.relative.clone(),
                CacheEntry {
                    hash,
                    scanned_at,
                    record: None,
                    ocr_excerpt: None,
                },
            );
            return None;
        };

        log::debug!(
            "{}: {:?} (confidence {})",
            file.relative,
            record.title,
            record.confidence
        );
        let excerpt = Some(text.excerpt(self.excerpt_chars)).filter(|e| !e.is_empty());
        lock(cache).insert(
            file.relative.clone(),
            CacheEntry {
                hash: hash.clone(),
                scanned_at: scanned_at.clone(),
                record: Some(record.clone()),
                ocr_excerpt: excerpt.clone(),
            },
        );

        Some(ImageResource {
            path: file.relative.clone(),
            hash,
            ocr: Some(text),
            ocr_excerpt: excerpt,
            record,
            scanned_at,
        })
    }
}

/// A poisoned cache still holds consistent entries; keep using it
fn lock(cache: &Mutex<ScanCacheFile>) -> std::sync::MutexGuard<'_, ScanCacheFile> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
