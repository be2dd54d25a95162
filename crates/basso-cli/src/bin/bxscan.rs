//! bxscan - Full site indexing: OCR, audio matching and index merge
//!
//! Usage: bxscan <root> <output>

use anyhow::{Context, Result};
use basso_cli::output::{print_json, IndexSummary};
use basso_core::{engine_from_config, BassoConfig, ScanPipeline, SiteIndexer, SiteScanner};
use basso_fmt::{IndexFile, ScanCacheFile};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Cache file name used when `--cache` is not given
const DEFAULT_CACHE: &str = ".basso-cache.json";

#[derive(Parser, Debug)]
#[command(name = "bxscan")]
#[command(about = "Scan a bass-method site and write the merged search index", long_about = None)]
struct Args {
    /// Site root directory
    root: PathBuf,

    /// Output index file
    output: PathBuf,

    /// OCR every image even when the cache says it is unchanged
    #[arg(short, long)]
    force: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scan cache file (default: <root>/.basso-cache.json)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Default: warnings only, stdout stays clean JSON
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Warn)
            .init();
    }

    run_bxscan(&args)
}

fn run_bxscan(args: &Args) -> Result<()> {
    let root = args.root.as_path();
    if !root.is_dir() {
        anyhow::bail!("Site root not found: {}", root.display());
    }

    let config = BassoConfig::load_or_default(args.config.as_deref())?;

    let engine = engine_from_config(&config.ocr);
    engine
        .check_available()
        .with_context(|| format!("OCR backend '{}' is not usable", engine.name()))?;

    let cache_path = args.cache.clone().unwrap_or_else(|| root.join(DEFAULT_CACHE));
    let cache = ScanCacheFile::load(&cache_path)
        .with_context(|| format!("Failed to read cache: {}", cache_path.display()))?;

    let start = std::time::Instant::now();
    let inventory = SiteScanner::new(&config.scan)?
        .exclude([args.output.clone(), cache_path.clone()])
        .scan(root)?;

    let cache = Mutex::new(cache);
    let (images, stats) = ScanPipeline::new(engine.as_ref(), &config)
        .force(args.force)
        .run(&inventory.images, &cache);

    let mut cache = cache.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    cache.retain_paths(inventory.images.iter().map(|f| f.relative.as_str()));
    save_cache(&cache, &cache_path)?;

    let indexer = SiteIndexer::new(&config);
    let audio = indexer.audio_resources(&inventory.audio);
    let (documents, document_warnings) = indexer.load_documents(root, &inventory.documents);

    let candidates = indexer.exercise_candidates(&images, &documents);
    let report = indexer.match_audio(&audio, &candidates);
    log::info!(
        "Matched {}/{} audio files ({:.1}%)",
        report.matches.len(),
        audio.len(),
        report.match_rate() * 100.0
    );

    let outcome = indexer.build_index(&images, &audio, &documents, &report.matches);
    if outcome.resources.is_empty() {
        anyhow::bail!("No resources found under {}", root.display());
    }

    let warnings = document_warnings.len() + outcome.warnings.len() + stats.failed;
    let index = IndexFile::new(outcome.resources, outcome.sources);
    index
        .save(&args.output)
        .with_context(|| format!("Failed to write index: {}", args.output.display()))?;

    print_json(&IndexSummary::new(&index, &args.output, warnings, start.elapsed()));
    Ok(())
}

fn save_cache(cache: &ScanCacheFile, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
    }
    cache
        .save(path)
        .with_context(|| format!("Failed to write cache: {}", path.display()))
}
