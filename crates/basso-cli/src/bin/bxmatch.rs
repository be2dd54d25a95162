//! bxmatch - MP3 index and MP3/exercise mapping
//!
//! Usage: bxmatch <root> [--output mp3_mapping.json]
//!
//! Exercise pages come from the scan cache written by `bxscan` and from the
//! exercise lists of method documents; no OCR runs here.

use anyhow::{Context, Result};
use basso_cli::output::{print_json, MatchSummary};
use basso_core::site::{mapping_file, mp3_index};
use basso_core::{BassoConfig, SiteIndexer, SiteScanner};
use basso_fmt::ScanCacheFile;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bxmatch")]
#[command(about = "Index MP3 files and match them to method exercises", long_about = None)]
struct Args {
    /// Site root directory
    root: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mapping output file; the MP3 index is written next to it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scan cache to read exercise pages from (default: <root>/.basso-cache.json)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Warn)
            .init();
    }

    run_bxmatch(&args)
}

fn run_bxmatch(args: &Args) -> Result<()> {
    let root = args.root.as_path();
    if !root.is_dir() {
        anyhow::bail!("Site root not found: {}", root.display());
    }

    let config = BassoConfig::load_or_default(args.config.as_deref())?;

    let mapping_path = args
        .output
        .clone()
        .unwrap_or_else(|| root.join("mp3_mapping.json"));
    let index_path = mapping_path.with_file_name("mp3_index.json");
    let cache_path = args.cache.clone().unwrap_or_else(|| root.join(".basso-cache.json"));

    let inventory = SiteScanner::new(&config.scan)?
        .exclude([mapping_path.clone(), index_path.clone()])
        .scan(root)?;

    let indexer = SiteIndexer::new(&config);
    let audio = indexer.audio_resources(&inventory.audio);
    if audio.is_empty() {
        log::warn!("No audio files under {}", root.display());
    }

    let cache = ScanCacheFile::load(&cache_path)
        .with_context(|| format!("Failed to read cache: {}", cache_path.display()))?;
    let images = indexer.images_from_cache(&cache);
    let (documents, _) = indexer.load_documents(root, &inventory.documents);

    let candidates = indexer.exercise_candidates(&images, &documents);
    let report = indexer.match_audio(&audio, &candidates);

    if let Some(parent) = mapping_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    mp3_index(&audio)
        .save(&index_path)
        .with_context(|| format!("Failed to write MP3 index: {}", index_path.display()))?;

    let mapping = mapping_file(&report, candidates.len());
    mapping
        .save(&mapping_path)
        .with_context(|| format!("Failed to write mapping: {}", mapping_path.display()))?;

    print_json(&MatchSummary::new(&mapping, &index_path, &mapping_path));
    Ok(())
}
