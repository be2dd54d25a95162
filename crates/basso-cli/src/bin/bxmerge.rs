//! bxmerge - Merge existing JSON indexes into one search index
//!
//! Usage: bxmerge <output> <documents...>

use anyhow::{Context, Result};
use basso_cli::output::{print_json, IndexSummary};
use basso_core::{BassoConfig, IndexMerger, SiteUrls};
use basso_fmt::{IndexFile, RawDocument};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bxmerge")]
#[command(about = "Merge JSON resource indexes without scanning", long_about = None)]
struct Args {
    /// Output index file
    output: PathBuf,

    /// Documents to merge, in priority order
    #[arg(required = true)]
    documents: Vec<PathBuf>,

    /// Site root the document paths are relative to
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

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

    run_bxmerge(&args)
}

fn run_bxmerge(args: &Args) -> Result<()> {
    let config = BassoConfig::load_or_default(args.config.as_deref())?;

    let start = std::time::Instant::now();
    let mut documents = Vec::new();
    let mut warnings = 0;
    for path in &args.documents {
        match RawDocument::load(path, &args.root) {
            Ok(document) => documents.push(document),
            Err(e) => {
                log::warn!("Skipping document: {}", e);
                warnings += 1;
            }
        }
    }

    let outcome = IndexMerger::new(SiteUrls::new(&config.site.base_url)).merge(&documents);
    if outcome.resources.is_empty() {
        anyhow::bail!("No resources in {} documents", args.documents.len());
    }

    let warnings = warnings + outcome.warnings.len();
    let index = IndexFile::new(outcome.resources, outcome.sources);
    index
        .save(&args.output)
        .with_context(|| format!("Failed to write index: {}", args.output.display()))?;

    print_json(&IndexSummary::new(&index, &args.output, warnings, start.elapsed()));
    Ok(())
}
